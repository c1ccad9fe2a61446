use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use tracing::{debug, error};

use parlor_feed::{MessageStore, StoreError, Subscription};
use parlor_types::events::StoreMutation;
use parlor_types::models::{MessageId, MessageRecord};

use crate::db::{Database, queries};
use crate::dispatcher::{Dispatcher, replay};
use crate::push_id::PushIdGenerator;

/// Message store persisted in SQLite.
///
/// Every write and every subscription snapshot runs while holding the
/// connection lock, so subscribers observe exactly the committed order.
#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<SqliteInner>,
}

struct SqliteInner {
    db: Database,
    dispatcher: Mutex<Dispatcher>,
    ids: Mutex<PushIdGenerator>,
}

fn backend(e: anyhow::Error) -> StoreError {
    error!("Store backend error: {:#}", e);
    StoreError::Backend(e.to_string())
}

impl SqliteInner {
    fn broadcast(&self, collection: &str, mutation: StoreMutation) -> anyhow::Result<()> {
        self.dispatcher
            .lock()
            .map_err(|e| anyhow!("Dispatcher lock poisoned: {}", e))?
            .broadcast(collection, mutation);
        Ok(())
    }

    fn next_id(&self) -> anyhow::Result<MessageId> {
        Ok(self
            .ids
            .lock()
            .map_err(|e| anyhow!("Id generator lock poisoned: {}", e))?
            .next_id())
    }

    fn write(&self, collection: &str, id: Option<MessageId>, record: MessageRecord) -> anyhow::Result<MessageId> {
        self.db.with_conn(|conn| {
            let id = match id {
                Some(id) => id,
                None => self.next_id()?,
            };
            let record = record.with_id(id.clone());

            let existed = queries::upsert_message(conn, collection, id.as_str(), &record)?;
            let mutation = if existed {
                StoreMutation::Changed { record }
            } else {
                let preceding_id = queries::preceding_id(conn, collection, id.as_str())?.map(MessageId::new);
                StoreMutation::Added { record, preceding_id }
            };

            self.broadcast(collection, mutation)?;
            Ok(id)
        })
    }

    fn delete(&self, collection: &str, id: &MessageId) -> anyhow::Result<bool> {
        self.db.with_conn(|conn| {
            if !queries::delete_message(conn, collection, id.as_str())? {
                return Ok(false);
            }
            self.broadcast(collection, StoreMutation::Removed { id: id.clone() })?;
            Ok(true)
        })
    }

    fn subscribe(&self, collection: &str) -> anyhow::Result<Subscription> {
        self.db.with_conn(|conn| {
            let records = queries::query_messages(conn, collection)?
                .into_iter()
                .map(|row| row.into_record());
            let mut dispatcher = self
                .dispatcher
                .lock()
                .map_err(|e| anyhow!("Dispatcher lock poisoned: {}", e))?;
            Ok(dispatcher.subscribe(collection, replay(records)))
        })
    }
}

impl SqliteStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::with_database(Database::open(path)?))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self::with_database(Database::open_in_memory()?))
    }

    fn with_database(db: Database) -> Self {
        Self {
            inner: Arc::new(SqliteInner {
                db,
                dispatcher: Mutex::new(Dispatcher::new()),
                ids: Mutex::new(PushIdGenerator::new()),
            }),
        }
    }

    pub fn database(&self) -> &Database {
        &self.inner.db
    }

    // Run blocking SQLite work off the async runtime
    async fn blocking<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&SqliteInner) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || f(inner.as_ref()))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                StoreError::Backend(e.to_string())
            })?
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn append(&self, collection: &str, record: MessageRecord) -> Result<MessageId, StoreError> {
        let collection = collection.to_string();
        let id = self
            .blocking(move |inner| inner.write(&collection, None, record).map_err(backend))
            .await?;
        debug!("Appended {}", id);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &MessageId, record: MessageRecord) -> Result<(), StoreError> {
        let collection = collection.to_string();
        let id = id.clone();
        self.blocking(move |inner| inner.write(&collection, Some(id), record).map_err(backend))
            .await?;
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &MessageId) -> Result<(), StoreError> {
        let collection = collection.to_string();
        let id = id.clone();
        self.blocking(move |inner| match inner.delete(&collection, &id) {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::UnknownId(id)),
            Err(e) => Err(backend(e)),
        })
        .await
    }

    async fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        let collection = collection.to_string();
        self.blocking(move |inner| inner.subscribe(&collection).map_err(backend))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(body: &str) -> MessageRecord {
        MessageRecord {
            sender_name: "ada".into(),
            text: Some(body.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_append_set_remove_stream() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut sub = store.subscribe("messages").await.unwrap();

        let a = store.append("messages", text("one")).await.unwrap();
        let b = store.append("messages", text("two")).await.unwrap();
        store.set("messages", &a, text("uno")).await.unwrap();
        store.remove("messages", &b).await.unwrap();

        assert_eq!(
            sub.next().await,
            Some(StoreMutation::Added { record: text("one").with_id(a.clone()), preceding_id: None })
        );
        assert_eq!(
            sub.next().await,
            Some(StoreMutation::Added { record: text("two").with_id(b.clone()), preceding_id: Some(a.clone()) })
        );
        assert_eq!(
            sub.next().await,
            Some(StoreMutation::Changed { record: text("uno").with_id(a.clone()) })
        );
        assert_eq!(sub.next().await, Some(StoreMutation::Removed { id: b.clone() }));

        assert_eq!(
            store.remove("messages", &b).await,
            Err(StoreError::UnknownId(b))
        );
        assert_eq!(store.database().count_messages("messages").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reopen_replays_persisted_records() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let (a, b) = {
            let store = SqliteStore::open(file.path()).unwrap();
            let a = store.append("messages", text("one")).await.unwrap();
            let b = store.append("messages", text("two")).await.unwrap();
            (a, b)
        };

        let store = SqliteStore::open(file.path()).unwrap();
        let mut sub = store.subscribe("messages").await.unwrap();
        assert_eq!(
            sub.try_next(),
            Some(StoreMutation::Added { record: text("one").with_id(a.clone()), preceding_id: None })
        );
        assert_eq!(
            sub.try_next(),
            Some(StoreMutation::Added { record: text("two").with_id(b), preceding_id: Some(a) })
        );
        assert_eq!(sub.try_next(), None);
    }
}
