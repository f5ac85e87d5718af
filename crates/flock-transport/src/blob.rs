//! Disk-backed blob store for attachment media
//!
//! Stores bytes under the configured upload directory and returns a public
//! URL built from the configured base. Failures degrade the broadcast to
//! text-only upstream; they never abort it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::instrument;

use flock_common::StorageConfig;
use flock_core::{BlobError, BlobStore};

/// Blob store writing media files to local disk
pub struct DiskBlobStore {
    upload_dir: PathBuf,
    public_base_url: String,
    max_bytes: usize,
    counter: AtomicU64,
}

impl DiskBlobStore {
    /// Create a store from storage configuration
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            upload_dir: PathBuf::from(&config.upload_dir),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            max_bytes: config.max_file_size_mb as usize * 1024 * 1024,
            counter: AtomicU64::new(0),
        }
    }

    /// Map a MIME type to a file extension
    fn extension(content_type: &str) -> &'static str {
        match content_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "video/mp4" => "mp4",
            "video/3gpp" => "3gp",
            "audio/mpeg" => "mp3",
            "audio/ogg" => "ogg",
            "audio/amr" => "amr",
            _ => "bin",
        }
    }

    /// Unique filename: millisecond timestamp plus process-local counter
    fn next_filename(&self, content_type: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{millis}-{n}.{}", Self::extension(content_type))
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len(), mime = %content_type))]
    async fn store(&self, bytes: &[u8], content_type: &str) -> Result<String, BlobError> {
        if bytes.is_empty() {
            return Err(BlobError::Storage("empty media body".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(BlobError::Storage(format!(
                "media of {} bytes exceeds limit of {} bytes",
                bytes.len(),
                self.max_bytes
            )));
        }

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| BlobError::Storage(e.to_string()))?;

        let filename = self.next_filename(content_type);
        let path = self.upload_dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| BlobError::Storage(e.to_string()))?;

        Ok(format!("{}/{filename}", self.public_base_url))
    }
}
