use parlor_types::models::{ImageRef, MessageId, MessageRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    Default,
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowBody {
    Text(String),
    /// Image still to be turned into a display URL.
    Image(ImageRef),
    Placeholder,
}

/// What a single list row shows for a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: Option<MessageId>,
    pub sender_name: String,
    pub avatar: Avatar,
    pub body: RowBody,
}

impl RowView {
    pub fn image(&self) -> Option<&ImageRef> {
        match &self.body {
            RowBody::Image(reference) => Some(reference),
            _ => None,
        }
    }
}

impl From<&MessageRecord> for RowView {
    fn from(record: &MessageRecord) -> Self {
        let body = match (&record.text, &record.image_ref) {
            (Some(text), _) => RowBody::Text(text.clone()),
            (None, Some(reference)) => RowBody::Image(reference.clone()),
            (None, None) => RowBody::Placeholder,
        };

        let avatar = match record.sender_photo_ref.as_deref() {
            Some(url) if !url.trim().is_empty() => Avatar::Url(url.to_string()),
            _ => Avatar::Default,
        };

        Self {
            id: record.id.clone(),
            sender_name: record.sender_name.clone(),
            avatar,
            body,
        }
    }
}
