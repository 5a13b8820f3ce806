//! Local-disk image storage with randomized file names.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use quill_core::ports::{ImageStore, StorageError, StoredImage};

/// 5 MiB.
pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Where uploads go and how they are addressed.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    /// Prefix of returned URLs, e.g. `http://localhost:5001`.
    pub public_base_url: String,
    pub max_bytes: usize,
}

impl UploadConfig {
    /// Load from `UPLOAD_DIR`, `PUBLIC_BASE_URL` and `UPLOAD_MAX_BYTES`.
    pub fn from_env(default_base_url: &str) -> Self {
        Self {
            dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| default_base_url.to_string()),
            max_bytes: std::env::var("UPLOAD_MAX_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_BYTES),
        }
    }
}

/// Writes images under a single directory, served at `/uploads`.
pub struct DiskImageStore {
    dir: PathBuf,
    public_base_url: String,
}

impl DiskImageStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name_for(original_name: Option<&str>) -> String {
        let extension = original_name
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();

        format!(
            "image-{}-{}{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            extension
        )
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn store(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredImage, StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        let file_name = Self::file_name_for(original_name);
        let target = self.dir.join(&file_name);
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        tracing::info!(file = %file_name, size = bytes.len(), "Stored uploaded image");

        let path = format!("/uploads/{file_name}");
        Ok(StoredImage {
            url: format!("{}{}", self.public_base_url, path),
            path,
            file_name,
        })
    }
}
