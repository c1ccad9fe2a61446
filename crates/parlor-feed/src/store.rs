use async_trait::async_trait;
use tokio::sync::mpsc;

use parlor_types::events::StoreMutation;
use parlor_types::models::{MessageId, MessageRecord};

use crate::error::StoreError;

/// Ordered, keyed message collections with a live change feed.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Assign a fresh id to `record`, store it at the tail, and emit `Added`
    /// to every subscriber, including the caller's own subscription.
    async fn append(&self, collection: &str, record: MessageRecord) -> Result<MessageId, StoreError>;

    /// Write `record` under `id`. Emits `Changed` when the id exists, `Added`
    /// at its ordered position otherwise.
    async fn set(&self, collection: &str, id: &MessageId, record: MessageRecord) -> Result<(), StoreError>;

    async fn remove(&self, collection: &str, id: &MessageId) -> Result<(), StoreError>;

    /// Start listening. The current contents are replayed as `Added` events
    /// before any live mutation. Dropping the subscription stops it.
    async fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError>;
}

/// Receiving end of a store subscription.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<StoreMutation>,
}

impl Subscription {
    pub fn new(rx: mpsc::UnboundedReceiver<StoreMutation>) -> Self {
        Self { rx }
    }

    /// Next mutation, or `None` once the store dropped this subscriber.
    pub async fn next(&mut self) -> Option<StoreMutation> {
        self.rx.recv().await
    }

    /// Next mutation if one is already queued.
    pub fn try_next(&mut self) -> Option<StoreMutation> {
        self.rx.try_recv().ok()
    }
}
