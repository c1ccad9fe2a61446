use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use parlor_feed::{MessageStore, StoreError, Subscription};
use parlor_types::events::StoreMutation;
use parlor_types::models::{MessageId, MessageRecord};

use crate::dispatcher::{Dispatcher, replay};
use crate::push_id::PushIdGenerator;

#[derive(Default)]
struct MemoryState {
    /// collection -> records sorted by id
    collections: HashMap<String, Vec<MessageRecord>>,
    dispatcher: Dispatcher,
    ids: PushIdGenerator,
}

/// Process-local message store. Cloning shares the same collections.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

fn locate(records: &[MessageRecord], id: &MessageId) -> Result<usize, usize> {
    records.binary_search_by(|r| r.id.as_ref().cmp(&Some(id)))
}

fn preceding(records: &[MessageRecord], index: usize) -> Option<MessageId> {
    index.checked_sub(1).and_then(|i| records[i].id.clone())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of `collection`, in store order.
    pub async fn records(&self, collection: &str) -> Vec<MessageRecord> {
        self.inner
            .lock()
            .await
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn subscriber_count(&self, collection: &str) -> usize {
        self.inner.lock().await.dispatcher.subscriber_count(collection)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, collection: &str, record: MessageRecord) -> Result<MessageId, StoreError> {
        let mut state = self.inner.lock().await;
        let id = state.ids.next_id();
        let record = record.with_id(id.clone());

        let records = state.collections.entry(collection.to_string()).or_default();
        let index = locate(records, &id).unwrap_or_else(|i| i);
        let preceding_id = preceding(records, index);
        records.insert(index, record.clone());

        debug!("Appended {} to {}", id, collection);
        state
            .dispatcher
            .broadcast(collection, StoreMutation::Added { record, preceding_id });
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &MessageId, record: MessageRecord) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        let record = record.with_id(id.clone());

        let records = state.collections.entry(collection.to_string()).or_default();
        let mutation = match locate(records, id) {
            Ok(index) => {
                records[index] = record.clone();
                StoreMutation::Changed { record }
            }
            Err(index) => {
                let preceding_id = preceding(records, index);
                records.insert(index, record.clone());
                StoreMutation::Added { record, preceding_id }
            }
        };

        state.dispatcher.broadcast(collection, mutation);
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &MessageId) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        let records = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownId(id.clone()))?;
        let index = locate(records, id).map_err(|_| StoreError::UnknownId(id.clone()))?;
        records.remove(index);

        state
            .dispatcher
            .broadcast(collection, StoreMutation::Removed { id: id.clone() });
        Ok(())
    }

    async fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        let mut state = self.inner.lock().await;
        let snapshot = replay(state.collections.get(collection).cloned().unwrap_or_default());
        debug!("New subscriber on {} ({} records replayed)", collection, snapshot.len());
        Ok(state.dispatcher.subscribe(collection, snapshot))
    }
}
