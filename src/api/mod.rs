pub mod format;
pub mod pagination;

pub use format::{envelope, Meta};
pub use pagination::Pagination;
