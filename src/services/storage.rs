use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

/// Blob storage for photos. Returns the public URL of the stored object.
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    async fn put(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<String>;
}

/// Stores photos under `MEDIA_DIR`; they are served back by GET /media/files/{*path}.
pub struct LocalMediaStorage {
    media_dir: PathBuf,
    public_base_url: String,
}

impl LocalMediaStorage {
    pub fn new(media_dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            media_dir: media_dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PhotoStorage for LocalMediaStorage {
    async fn put(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<String> {
        anyhow::ensure!(
            !name.contains('/') && !name.contains(".."),
            "Invalid object name: {name}"
        );
        tokio::fs::create_dir_all(&self.media_dir).await?;
        tokio::fs::write(self.media_dir.join(name), &bytes).await?;
        debug!("Stored {} ({}, {} bytes)", name, content_type, bytes.len());
        Ok(format!("{}/media/files/{}", self.public_base_url, name))
    }
}

#[cfg(test)]
pub use memory::MemoryPhotoStorage;

#[cfg(test)]
mod memory {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::PhotoStorage;

    /// Keeps uploaded objects in memory; can be told to reject uploads.
    #[derive(Default)]
    pub struct MemoryPhotoStorage {
        pub objects: Mutex<Vec<(String, Vec<u8>, String)>>,
        pub fail: AtomicBool,
    }

    #[async_trait]
    impl PhotoStorage for MemoryPhotoStorage {
        async fn put(
            &self,
            name: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> anyhow::Result<String> {
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("storage offline");
            }
            self.objects
                .lock()
                .await
                .push((name.to_string(), bytes, content_type.to_string()));
            Ok(format!("https://photos.test/{name}"))
        }
    }
}
