use serde::Serialize;

/// Page metadata for list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: i64,
    pub prev_page: bool,
    pub next_page: bool,
    pub count_from: i64,
    pub count_until: i64,
    pub per_page: i64,
    pub page_count: i64,
    pub total_record: i64,
}

impl Pagination {
    /// `page` and `per_page` below 1 are treated as 1.
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = total.max(0);

        let count_from = (page - 1).saturating_mul(per_page);
        let count_until = count_from.saturating_add(per_page).min(total);
        Self {
            current_page: page,
            prev_page: page > 1,
            next_page: count_until < total,
            count_from,
            count_until,
            per_page,
            page_count: total / per_page + i64::from(total % per_page != 0),
            total_record: total,
        }
    }

    pub fn offset(&self) -> i64 {
        self.count_from
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}
