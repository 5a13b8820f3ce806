//! Image storage port.

use async_trait::async_trait;

/// A file that has been written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Randomized file name inside the store.
    pub file_name: String,
    /// Path under which the file is served, e.g. `/uploads/<file_name>`.
    pub path: String,
    /// Absolute URL built from the configured public base URL.
    pub url: String,
}

/// Storage for uploaded post images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `bytes`, keeping the extension of `original_name` if any.
    async fn store(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredImage, StorageError>;
}

/// Image storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to write file: {0}")]
    Io(String),
}
