use std::collections::HashMap;

use tokio::sync::mpsc;

use parlor_feed::Subscription;
use parlor_types::events::StoreMutation;
use parlor_types::models::MessageRecord;

/// Fans store mutations out to every live subscription of a collection.
///
/// Not synchronized on its own: stores keep it under the same lock as their
/// data so a snapshot and its registration can't interleave with a write.
#[derive(Default)]
pub struct Dispatcher {
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<StoreMutation>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber that first receives `snapshot`.
    pub fn subscribe(
        &mut self,
        collection: &str,
        snapshot: impl IntoIterator<Item = StoreMutation>,
    ) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        for mutation in snapshot {
            let _ = tx.send(mutation);
        }
        self.subscribers
            .entry(collection.to_string())
            .or_default()
            .push(tx);
        Subscription::new(rx)
    }

    /// Send to every subscriber of `collection`, forgetting the ones that
    /// were dropped.
    pub fn broadcast(&mut self, collection: &str, mutation: StoreMutation) {
        if let Some(subscribers) = self.subscribers.get_mut(collection) {
            subscribers.retain(|tx| tx.send(mutation.clone()).is_ok());
        }
    }

    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.subscribers
            .get(collection)
            .map_or(0, |subs| subs.iter().filter(|tx| !tx.is_closed()).count())
    }
}

/// `Added` events reproducing `records` (already in store order).
pub fn replay(records: impl IntoIterator<Item = MessageRecord>) -> Vec<StoreMutation> {
    let mut preceding_id = None;
    let mut events = Vec::new();
    for record in records {
        let id = record.id.clone();
        events.push(StoreMutation::Added { record, preceding_id });
        preceding_id = id;
    }
    events
}
