use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use parlor_feed::{BlobStorage, MediaResolutionError, MediaResolver, UploadError};
use parlor_types::models::{ImageRef, STORAGE_SCHEME};

/// In-process blob bucket. Uploads come back as `gs://{bucket}/{path}` and
/// resolve to `{public_base}/{path}` while the object exists.
#[derive(Clone)]
pub struct MemoryBlobStore {
    inner: Arc<BlobInner>,
}

struct BlobInner {
    bucket: String,
    public_base: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new(bucket: impl Into<String>, public_base: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(BlobInner {
                bucket: bucket.into(),
                public_base: public_base.into().trim_end_matches('/').to_string(),
                objects: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.inner.bucket
    }

    pub async fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.objects.read().await.get(path).cloned()
    }

    pub async fn delete(&self, path: &str) -> bool {
        self.inner.objects.write().await.remove(path).is_some()
    }

    fn object_path<'a>(&self, reference: &'a ImageRef) -> Option<&'a str> {
        reference
            .as_str()
            .strip_prefix(STORAGE_SCHEME)?
            .strip_prefix(self.inner.bucket.as_str())?
            .strip_prefix('/')
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<ImageRef, UploadError> {
        if path.is_empty() || path.starts_with('/') {
            return Err(UploadError::Failed {
                path: path.to_string(),
                reason: "invalid object path".into(),
            });
        }

        debug!("Stored {} bytes at {}", bytes.len(), path);
        self.inner.objects.write().await.insert(path.to_string(), bytes);
        Ok(ImageRef::new(format!("{}{}/{}", STORAGE_SCHEME, self.inner.bucket, path)))
    }
}

#[async_trait]
impl MediaResolver for MemoryBlobStore {
    async fn resolve(&self, reference: &ImageRef) -> Result<String, MediaResolutionError> {
        let path = self
            .object_path(reference)
            .ok_or_else(|| MediaResolutionError::NotFound(reference.to_string()))?;

        if !self.inner.objects.read().await.contains_key(path) {
            return Err(MediaResolutionError::NotFound(reference.to_string()));
        }
        Ok(format!("{}/{}", self.inner.public_base, path))
    }
}
