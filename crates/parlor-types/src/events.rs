use serde::{Deserialize, Serialize};

use crate::models::{MessageId, MessageRecord};

/// Change emitted by a store subscription, in store order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StoreMutation {
    /// A record entered the collection right after `preceding_id`,
    /// or at the head when `preceding_id` is `None`.
    Added {
        record: MessageRecord,
        preceding_id: Option<MessageId>,
    },

    /// An existing record's content was replaced.
    Changed { record: MessageRecord },

    /// A record left the collection.
    Removed { id: MessageId },
}

impl StoreMutation {
    /// Id of the record this mutation touches, if it carries one.
    pub fn record_id(&self) -> Option<&MessageId> {
        match self {
            Self::Added { record, .. } | Self::Changed { record } => record.id.as_ref(),
            Self::Removed { id } => Some(id),
        }
    }
}

/// Row-level notification for the presentation layer. Indices refer to the
/// feed after the change was applied (for `Removed`, the index the row had).
///
/// `Inserted` also carries the row count right after that insertion, so a
/// consumer that handles the notification late still sees the list as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ViewUpdate {
    Inserted { index: usize, count: usize },
    Updated(usize),
    Removed(usize),
}

impl ViewUpdate {
    pub fn index(&self) -> usize {
        match self {
            Self::Inserted { index, .. } | Self::Updated(index) | Self::Removed(index) => *index,
        }
    }
}
