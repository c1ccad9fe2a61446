//! Error types for feed projection and its collaborators

use parlor_types::models::MessageId;
use thiserror::Error;

/// A store mutation the projector refused to apply. The feed is left as it
/// was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Record {0} is already in the feed")]
    DuplicateId(MessageId),
    #[error("No record with id {0} in the feed")]
    UnknownId(MessageId),
    #[error("Record has no store-assigned id")]
    MissingId,
}

/// Image content could not be turned into a displayable URL. The row is
/// rendered without its image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaResolutionError {
    #[error("Record has no image to resolve")]
    NoImage,
    #[error("Media not found: {0}")]
    NotFound(String),
    #[error("Resolving {reference} failed: {reason}")]
    Transport { reference: String, reason: String },
}

/// Failures at the message store boundary. These are surfaced to the caller;
/// retrying is the store's business.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("No record with id {0} in the collection")]
    UnknownId(MessageId),
    #[error("Store backend error: {0}")]
    Backend(String),
    #[error("Store is closed")]
    Closed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Upload of {path} failed: {reason}")]
    Failed { path: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}
