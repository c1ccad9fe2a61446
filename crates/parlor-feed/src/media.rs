use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use parlor_types::models::{ImageRef, ImageRefKind, MessageId};

use crate::error::{MediaResolutionError, UploadError};

/// Turns an indirect image reference into a URL that can be fetched.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, reference: &ImageRef) -> Result<String, MediaResolutionError>;
}

/// Stores binary content and hands back an indirect reference to it.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<ImageRef, UploadError>;
}

/// Direct references come back as-is; indirect ones cost one resolver call.
pub async fn resolve_display_url(
    resolver: &dyn MediaResolver,
    reference: &ImageRef,
) -> Result<String, MediaResolutionError> {
    match reference.kind() {
        ImageRefKind::Direct => Ok(reference.as_str().to_string()),
        ImageRefKind::Indirect => {
            debug!("Resolving indirect image reference {}", reference);
            resolver.resolve(reference).await
        }
    }
}

/// Identifies the exact row content a resolution was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTicket {
    pub id: MessageId,
    pub revision: u64,
}

/// A pending resolution for one row. Holds no borrow of the projector, so it
/// can be awaited while mutations keep flowing.
pub struct MediaRequest {
    ticket: RowTicket,
    reference: ImageRef,
    resolver: Arc<dyn MediaResolver>,
}

impl MediaRequest {
    pub(crate) fn new(ticket: RowTicket, reference: ImageRef, resolver: Arc<dyn MediaResolver>) -> Self {
        Self { ticket, reference, resolver }
    }

    pub fn ticket(&self) -> &RowTicket {
        &self.ticket
    }

    pub fn reference(&self) -> &ImageRef {
        &self.reference
    }

    pub async fn resolve(self) -> ResolvedMedia {
        let result = resolve_display_url(self.resolver.as_ref(), &self.reference).await;
        ResolvedMedia { ticket: self.ticket, result }
    }
}

/// Outcome of a `MediaRequest`, still to be checked against the feed.
#[derive(Debug, Clone)]
pub struct ResolvedMedia {
    pub ticket: RowTicket,
    pub result: Result<String, MediaResolutionError>,
}

/// What the presentation layer should do with a finished resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Row is unchanged since the request; show `url` at `index`.
    Display { index: usize, url: String },
    /// Row is unchanged but has no displayable image.
    Failed { index: usize, error: MediaResolutionError },
    /// Row was changed or removed meanwhile; drop the result.
    Stale,
}
