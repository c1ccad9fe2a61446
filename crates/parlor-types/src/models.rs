use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scheme used by blob storage for references that still need resolving.
pub const STORAGE_SCHEME: &str = "gs://";

/// Image reference a record holds while its upload is still in flight.
pub const LOADING_IMAGE_URL: &str = "https://static.parlor.chat/images/spin-32.gif";

/// Display name used when the signed-in user has none.
pub const ANONYMOUS: &str = "anonymous";

/// Message length limit applied until remote configuration says otherwise.
pub const DEFAULT_MESSAGE_LENGTH_LIMIT: usize = 10;

/// Store-assigned message key. Ordering of ids matches append order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRefKind {
    /// Already fetchable as-is.
    Direct,
    /// Points into blob storage and has to be resolved first.
    Indirect,
}

/// Opaque pointer to image content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Sentinel reference shown while an upload is pending.
    pub fn loading() -> Self {
        Self(LOADING_IMAGE_URL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> ImageRefKind {
        if self.0.starts_with(STORAGE_SCHEME) {
            ImageRefKind::Indirect
        } else {
            ImageRefKind::Direct
        }
    }

    pub fn is_indirect(&self) -> bool {
        self.kind() == ImageRefKind::Indirect
    }

    pub fn is_loading(&self) -> bool {
        self.0 == LOADING_IMAGE_URL
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The signed-in user as it appears on outgoing messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderProfile {
    pub uid: String,
    pub name: String,
    pub photo_ref: Option<String>,
}

impl SenderProfile {
    pub fn new(uid: impl Into<String>, name: impl Into<String>, photo_ref: Option<String>) -> Self {
        let name = name.into();
        Self {
            uid: uid.into(),
            name: if name.trim().is_empty() { ANONYMOUS.to_string() } else { name },
            photo_ref,
        }
    }

    /// Fresh profile with a random uid and the anonymous display name.
    pub fn anonymous() -> Self {
        Self::new(Uuid::new_v4().simple().to_string(), ANONYMOUS, None)
    }
}

/// What a record primarily shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Image,
    /// Neither text nor image yet, e.g. an upload that has not completed.
    Placeholder,
}

/// One chat entry. Field names on the wire match the stored documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(rename = "name", default)]
    pub sender_name: String,
    #[serde(rename = "photoUrl", default)]
    pub sender_photo_ref: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_ref: Option<ImageRef>,
}

impl MessageRecord {
    pub fn text(sender: &SenderProfile, text: impl Into<String>) -> Self {
        Self {
            id: None,
            sender_name: sender.name.clone(),
            sender_photo_ref: sender.photo_ref.clone(),
            text: Some(text.into()),
            image_ref: None,
        }
    }

    pub fn image(sender: &SenderProfile, image_ref: ImageRef) -> Self {
        Self {
            id: None,
            sender_name: sender.name.clone(),
            sender_photo_ref: sender.photo_ref.clone(),
            text: None,
            image_ref: Some(image_ref),
        }
    }

    /// Placeholder written before an image upload starts.
    pub fn uploading(sender: &SenderProfile) -> Self {
        Self::image(sender, ImageRef::loading())
    }

    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = Some(id);
        self
    }

    /// Text wins over image when a malformed record carries both.
    pub fn content_kind(&self) -> ContentKind {
        if self.text.is_some() {
            ContentKind::Text
        } else if self.image_ref.is_some() {
            ContentKind::Image
        } else {
            ContentKind::Placeholder
        }
    }
}
