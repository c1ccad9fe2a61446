use std::sync::Arc;

use tracing::{debug, info, warn};

use parlor_types::models::{DEFAULT_MESSAGE_LENGTH_LIMIT, MessageId, MessageRecord, SenderProfile};

use crate::error::ComposeError;
use crate::media::BlobStorage;
use crate::store::MessageStore;

/// Outgoing side of the chat screen: input checks and the send flows.
pub struct Composer {
    store: Arc<dyn MessageStore>,
    blobs: Arc<dyn BlobStorage>,
    sender: SenderProfile,
    collection: String,
    text_length_limit: usize,
}

impl Composer {
    pub fn new(
        store: Arc<dyn MessageStore>,
        blobs: Arc<dyn BlobStorage>,
        sender: SenderProfile,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            blobs,
            sender,
            collection: collection.into(),
            text_length_limit: DEFAULT_MESSAGE_LENGTH_LIMIT,
        }
    }

    pub fn sender(&self) -> &SenderProfile {
        &self.sender
    }

    pub fn text_length_limit(&self) -> usize {
        self.text_length_limit
    }

    pub fn set_text_length_limit(&mut self, limit: usize) {
        self.text_length_limit = limit;
    }

    /// Whether the send button should be enabled for `text`.
    pub fn can_send(text: &str) -> bool {
        !text.trim().is_empty()
    }

    /// Cut `text` down to the configured number of characters.
    pub fn clamp(&self, text: &str) -> String {
        text.chars().take(self.text_length_limit).collect()
    }

    pub async fn send_text(&self, text: &str) -> Result<MessageId, ComposeError> {
        if !Self::can_send(text) {
            return Err(ComposeError::EmptyMessage);
        }
        let record = MessageRecord::text(&self.sender, self.clamp(text));
        let id = self.store.append(&self.collection, record).await?;
        debug!("Sent text message {}", id);
        Ok(id)
    }

    /// Post a placeholder, upload the image under the placeholder's id, then
    /// point the record at the uploaded content.
    ///
    /// A failed upload leaves the placeholder in the collection.
    pub async fn send_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<MessageId, ComposeError> {
        let placeholder = MessageRecord::uploading(&self.sender);
        let id = self.store.append(&self.collection, placeholder).await?;

        let path = format!("{}/{}/{}", self.sender.uid, id, file_name);
        let reference = match self.blobs.upload(&path, bytes).await {
            Ok(reference) => reference,
            Err(e) => {
                warn!("Image upload for {} was not successful: {}", id, e);
                return Err(e.into());
            }
        };

        let record = MessageRecord::image(&self.sender, reference);
        self.store.set(&self.collection, &id, record).await?;
        info!("Image message {} uploaded to {}", id, path);
        Ok(id)
    }
}
