//! In-memory ordered view model with an id→position index.
//!
//! The sequence follows the order the store emitted; nothing is reordered
//! locally. Every structural change rewrites the positions of the rows it
//! shifted so lookups by id stay O(1).

use std::collections::HashMap;

use parlor_types::models::{MessageId, MessageRecord};

use crate::error::FeedError;

/// A record as held by the feed, stamped with the revision it was applied at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    pub record: MessageRecord,
    pub revision: u64,
}

impl FeedRow {
    /// Rows only ever enter the feed with an id, so this never falls back.
    pub fn id(&self) -> Option<&MessageId> {
        self.record.id.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct OrderedFeed {
    rows: Vec<FeedRow>,
    positions: HashMap<MessageId, usize>,
    next_revision: u64,
}

impl OrderedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FeedRow> {
        self.rows.get(index)
    }

    pub fn position(&self, id: &MessageId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn row(&self, id: &MessageId) -> Option<&FeedRow> {
        self.position(id).and_then(|i| self.rows.get(i))
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.positions.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedRow> {
        self.rows.iter()
    }

    /// Ids in feed order.
    pub fn ids(&self) -> Vec<MessageId> {
        self.rows.iter().filter_map(|r| r.id().cloned()).collect()
    }

    /// Records in feed order.
    pub fn records(&self) -> Vec<MessageRecord> {
        self.rows.iter().map(|r| r.record.clone()).collect()
    }

    fn stamp(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    /// Insert `record` right after `preceding`, or at the head. Returns the
    /// index it landed at.
    pub(crate) fn insert_after(
        &mut self,
        record: MessageRecord,
        preceding: Option<&MessageId>,
    ) -> Result<usize, FeedError> {
        let id = record.id.clone().ok_or(FeedError::MissingId)?;
        if self.positions.contains_key(&id) {
            return Err(FeedError::DuplicateId(id));
        }

        let index = match preceding {
            Some(prev) => {
                self.position(prev)
                    .ok_or_else(|| FeedError::UnknownId(prev.clone()))?
                    + 1
            }
            None => 0,
        };

        let revision = self.stamp();
        let row = FeedRow { record, revision };

        if index == self.rows.len() {
            // Common case: store order append at the tail.
            self.rows.push(row);
        } else {
            self.rows.insert(index, row);
            self.reindex_from(index + 1);
        }
        self.positions.insert(id, index);

        Ok(index)
    }

    /// Replace the content of the row with the same id, keeping its position.
    pub(crate) fn replace(&mut self, record: MessageRecord) -> Result<usize, FeedError> {
        let id = record.id.as_ref().ok_or(FeedError::MissingId)?;
        let index = self
            .position(id)
            .ok_or_else(|| FeedError::UnknownId(id.clone()))?;

        let revision = self.stamp();
        self.rows[index] = FeedRow { record, revision };
        Ok(index)
    }

    /// Remove the row with `id`. Returns the index it occupied.
    pub(crate) fn remove(&mut self, id: &MessageId) -> Result<usize, FeedError> {
        let index = self
            .positions
            .remove(id)
            .ok_or_else(|| FeedError::UnknownId(id.clone()))?;

        self.rows.remove(index);
        self.reindex_from(index);
        Ok(index)
    }

    /// Drop the last row. Returns its former index.
    pub(crate) fn pop(&mut self) -> Option<usize> {
        let row = self.rows.pop()?;
        if let Some(id) = row.id() {
            self.positions.remove(id);
        }
        Some(self.rows.len())
    }

    fn reindex_from(&mut self, start: usize) {
        for (offset, row) in self.rows[start..].iter().enumerate() {
            if let Some(id) = row.record.id.as_ref() {
                if let Some(slot) = self.positions.get_mut(id) {
                    *slot = start + offset;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, text: &str) -> MessageRecord {
        MessageRecord {
            id: Some(MessageId::from(id)),
            sender_name: "tester".into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    fn assert_consistent(feed: &OrderedFeed) {
        assert_eq!(feed.positions.len(), feed.rows.len());
        for (i, row) in feed.rows.iter().enumerate() {
            assert_eq!(feed.position(row.id().unwrap()), Some(i));
        }
    }

    #[test]
    fn test_append_chain() {
        let mut feed = OrderedFeed::new();
        assert_eq!(feed.insert_after(rec("a", "1"), None), Ok(0));
        assert_eq!(feed.insert_after(rec("b", "2"), Some(&"a".into())), Ok(1));
        assert_eq!(feed.insert_after(rec("c", "3"), Some(&"b".into())), Ok(2));

        assert_eq!(feed.ids(), vec!["a".into(), "b".into(), "c".into()]);
        assert_consistent(&feed);
    }

    #[test]
    fn test_positional_insert_shifts_index() {
        let mut feed = OrderedFeed::new();
        feed.insert_after(rec("a", "1"), None).unwrap();
        feed.insert_after(rec("c", "3"), Some(&"a".into())).unwrap();
        feed.insert_after(rec("d", "4"), Some(&"c".into())).unwrap();

        assert_eq!(feed.insert_after(rec("b", "2"), Some(&"a".into())), Ok(1));
        assert_eq!(feed.insert_after(rec("z", "0"), None), Ok(0));

        let expected: Vec<MessageId> =
            ["z", "a", "b", "c", "d"].into_iter().map(MessageId::from).collect();
        assert_eq!(feed.ids(), expected);
        assert_consistent(&feed);
    }

    #[test]
    fn test_rejections_leave_feed_untouched() {
        let mut feed = OrderedFeed::new();
        feed.insert_after(rec("a", "1"), None).unwrap();
        let before = feed.rows.clone();

        assert_eq!(
            feed.insert_after(rec("a", "again"), None),
            Err(FeedError::DuplicateId("a".into()))
        );
        assert_eq!(
            feed.insert_after(rec("b", "2"), Some(&"nope".into())),
            Err(FeedError::UnknownId("nope".into()))
        );
        assert_eq!(
            feed.insert_after(MessageRecord::default(), None),
            Err(FeedError::MissingId)
        );
        assert_eq!(feed.replace(rec("x", "?")), Err(FeedError::UnknownId("x".into())));
        assert_eq!(feed.remove(&"x".into()), Err(FeedError::UnknownId("x".into())));

        assert_eq!(feed.rows, before);
        assert_consistent(&feed);
    }

    #[test]
    fn test_replace_keeps_position_and_bumps_revision() {
        let mut feed = OrderedFeed::new();
        feed.insert_after(rec("a", "1"), None).unwrap();
        feed.insert_after(rec("b", "2"), Some(&"a".into())).unwrap();
        let old_rev = feed.row(&"a".into()).unwrap().revision;

        assert_eq!(feed.replace(rec("a", "edited")), Ok(0));
        let row = feed.row(&"a".into()).unwrap();
        assert_eq!(row.record.text.as_deref(), Some("edited"));
        assert!(row.revision > old_rev);
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn test_remove_shifts_down() {
        let mut feed = OrderedFeed::new();
        let mut prev: Option<MessageId> = None;
        for id in ["a", "b", "c", "d"] {
            feed.insert_after(rec(id, id), prev.as_ref()).unwrap();
            prev = Some(id.into());
        }

        assert_eq!(feed.remove(&"b".into()), Ok(1));
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.position(&"c".into()), Some(1));
        assert_eq!(feed.position(&"d".into()), Some(2));
        assert!(!feed.contains(&"b".into()));
        assert_consistent(&feed);
    }

    #[test]
    fn test_pop_until_empty() {
        let mut feed = OrderedFeed::new();
        feed.insert_after(rec("a", "1"), None).unwrap();
        feed.insert_after(rec("b", "2"), Some(&"a".into())).unwrap();

        assert_eq!(feed.pop(), Some(1));
        assert_eq!(feed.pop(), Some(0));
        assert_eq!(feed.pop(), None);
        assert!(feed.is_empty());
        assert_consistent(&feed);
    }
}
