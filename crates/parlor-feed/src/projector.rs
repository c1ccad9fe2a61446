use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use parlor_types::events::{StoreMutation, ViewUpdate};
use parlor_types::models::{ContentKind, DEFAULT_MESSAGE_LENGTH_LIMIT, MessageId, MessageRecord};

use crate::error::{FeedError, MediaResolutionError};
use crate::feed::OrderedFeed;
use crate::media::{self, MediaRequest, MediaResolver, Resolution, ResolvedMedia, RowTicket};
use crate::row::RowView;
use crate::scroll;
use crate::store::MessageStore;

/// Projects a store's mutation stream into an ordered feed and tells the
/// presentation layer which rows changed.
///
/// The projector is the only writer of its feed. Each mutation is applied
/// completely (rows, index map, notification) before the call returns.
pub struct FeedProjector {
    store: Arc<dyn MessageStore>,
    resolver: Arc<dyn MediaResolver>,
    feed: OrderedFeed,
    updates: mpsc::UnboundedSender<ViewUpdate>,
    text_length_limit: usize,
}

impl FeedProjector {
    /// Build a projector and the receiver its view notifications go to.
    pub fn new(
        store: Arc<dyn MessageStore>,
        resolver: Arc<dyn MediaResolver>,
    ) -> (Self, mpsc::UnboundedReceiver<ViewUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let projector = Self {
            store,
            resolver,
            feed: OrderedFeed::new(),
            updates,
            text_length_limit: DEFAULT_MESSAGE_LENGTH_LIMIT,
        };
        (projector, rx)
    }

    pub fn feed(&self) -> &OrderedFeed {
        &self.feed
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    pub fn resolver(&self) -> &Arc<dyn MediaResolver> {
        &self.resolver
    }

    /// Maximum message length the composer should enforce. Not checked here.
    pub fn text_length_limit(&self) -> usize {
        self.text_length_limit
    }

    pub fn set_text_length_limit(&mut self, limit: usize) {
        debug!("Message length limit is now {}", limit);
        self.text_length_limit = limit;
    }

    fn emit(&self, update: ViewUpdate) {
        let _ = self.updates.send(update);
    }

    /// Apply one store mutation.
    pub fn apply(&mut self, mutation: StoreMutation) -> Result<usize, FeedError> {
        match mutation {
            StoreMutation::Added { record, preceding_id } => {
                self.on_record_added(record, preceding_id.as_ref())
            }
            StoreMutation::Changed { record } => self.on_record_changed(record),
            StoreMutation::Removed { id } => self.on_record_removed(&id),
        }
    }

    pub fn on_record_added(
        &mut self,
        record: MessageRecord,
        preceding_id: Option<&MessageId>,
    ) -> Result<usize, FeedError> {
        let id = record.id.clone();
        match self.feed.insert_after(record, preceding_id) {
            Ok(index) => {
                debug!("Inserted {:?} at {}", id, index);
                self.emit(ViewUpdate::Inserted {
                    index,
                    count: self.feed.len(),
                });
                Ok(index)
            }
            Err(e) => {
                warn!("Rejected added record: {}", e);
                Err(e)
            }
        }
    }

    pub fn on_record_changed(&mut self, record: MessageRecord) -> Result<usize, FeedError> {
        let id = record.id.clone();
        match self.feed.replace(record) {
            Ok(index) => {
                debug!("Updated {:?} at {}", id, index);
                self.emit(ViewUpdate::Updated(index));
                Ok(index)
            }
            Err(e) => {
                warn!("Rejected changed record: {}", e);
                Err(e)
            }
        }
    }

    pub fn on_record_removed(&mut self, id: &MessageId) -> Result<usize, FeedError> {
        match self.feed.remove(id) {
            Ok(index) => {
                debug!("Removed {} from {}", id, index);
                self.emit(ViewUpdate::Removed(index));
                Ok(index)
            }
            Err(e) => {
                warn!("Rejected removed record: {}", e);
                Err(e)
            }
        }
    }

    /// Empty the feed, tail first, so every notification index is valid at
    /// the time it is sent.
    pub fn reset(&mut self) {
        let mut removed = 0usize;
        while let Some(index) = self.feed.pop() {
            self.emit(ViewUpdate::Removed(index));
            removed += 1;
        }
        debug!("Feed reset, {} rows dropped", removed);
    }

    /// Whether the view should follow an `Inserted` notification to its row.
    /// Uses the row count carried by the notification, never the live feed,
    /// which may already hold later rows by the time the view gets here.
    /// Any other notification never scrolls.
    pub fn should_auto_scroll(update: ViewUpdate, last_visible: Option<usize>) -> bool {
        match update {
            ViewUpdate::Inserted { index, count } => scroll::should_auto_scroll(index, count, last_visible),
            ViewUpdate::Updated(_) | ViewUpdate::Removed(_) => false,
        }
    }

    pub fn row_view(&self, index: usize) -> Option<RowView> {
        self.feed.get(index).map(|row| RowView::from(&row.record))
    }

    /// Displayable URL for `record`'s image, independent of the feed.
    pub async fn resolve_display_url(&self, record: &MessageRecord) -> Result<String, MediaResolutionError> {
        let reference = record.image_ref.as_ref().ok_or(MediaResolutionError::NoImage)?;
        media::resolve_display_url(self.resolver.as_ref(), reference).await
    }

    /// Prepare a resolution for the row with `id`. `None` when the row does
    /// not show an image.
    pub fn media_request(&self, id: &MessageId) -> Result<Option<MediaRequest>, FeedError> {
        let row = self
            .feed
            .row(id)
            .ok_or_else(|| FeedError::UnknownId(id.clone()))?;

        if row.record.content_kind() != ContentKind::Image {
            return Ok(None);
        }
        let Some(reference) = row.record.image_ref.clone() else {
            return Ok(None);
        };

        let ticket = RowTicket {
            id: id.clone(),
            revision: row.revision,
        };
        Ok(Some(MediaRequest::new(ticket, reference, self.resolver.clone())))
    }

    /// Check a finished resolution against the row as it is now.
    pub fn accept_resolution(&self, resolved: ResolvedMedia) -> Resolution {
        let ticket = &resolved.ticket;
        let current = self
            .feed
            .position(&ticket.id)
            .and_then(|index| self.feed.get(index).map(|row| (index, row.revision)));

        match current {
            Some((index, revision)) if revision == ticket.revision => match resolved.result {
                Ok(url) => Resolution::Display { index, url },
                Err(error) => {
                    warn!("Image for {} not available: {}", ticket.id, error);
                    Resolution::Failed { index, error }
                }
            },
            _ => {
                debug!("Discarding stale resolution for {}", ticket.id);
                Resolution::Stale
            }
        }
    }
}
