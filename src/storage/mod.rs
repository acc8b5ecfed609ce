//! Image file storage for monster pictures.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Stores uploaded images under generated names.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Persists `bytes` and returns the generated stored name.
    async fn save(&self, bytes: &[u8], original_name: &str) -> Result<String, StorageError>;

    async fn delete(&self, stored_name: &str) -> Result<(), StorageError>;
}

/// Files in one local directory, created on first write.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, stored_name: &str) -> Result<PathBuf, StorageError> {
        if !is_plain_file_name(stored_name) {
            return Err(StorageError::InvalidName(stored_name.to_string()));
        }
        Ok(self.root.join(stored_name))
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn save(&self, bytes: &[u8], original_name: &str) -> Result<String, StorageError> {
        fs::create_dir_all(&self.root).await?;

        let stored_name = generate_name(original_name);
        let path = self.path_for(&stored_name)?;
        let mut file = fs::File::create(&path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        debug!(stored_name = %stored_name, size = bytes.len(), "Saved image");
        Ok(stored_name)
    }

    async fn delete(&self, stored_name: &str) -> Result<(), StorageError> {
        let path = self.path_for(stored_name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(stored_name = %stored_name, "Deleted image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(stored_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Lower-cased extension of `name` including the dot, or "" when absent.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// `monster_<unix millis>_<random>.<ext>`
pub fn generate_name(original_name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "monster_{}_{}{}",
        Utc::now().timestamp_millis(),
        &suffix[..8],
        extension_of(original_name)
    )
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}
