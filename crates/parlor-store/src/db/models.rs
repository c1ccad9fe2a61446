use parlor_types::models::{ImageRef, MessageId, MessageRecord};

/// Row of the `messages` table. Kept apart from `MessageRecord` so the
/// schema can move independently of the wire format.
pub struct MessageRow {
    pub id: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub text: Option<String>,
    pub image_url: Option<String>,
}

impl MessageRow {
    pub fn into_record(self) -> MessageRecord {
        MessageRecord {
            id: Some(MessageId::new(self.id)),
            sender_name: self.name,
            sender_photo_ref: self.photo_url,
            text: self.text,
            image_ref: self.image_url.map(ImageRef::new),
        }
    }
}
