use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use parlor_types::models::MessageId;

use crate::error::{FeedError, MediaResolutionError, StoreError};
use crate::media::Resolution;
use crate::projector::FeedProjector;

/// Outcome of an image resolution for a row that did not change meanwhile.
/// On `Err` the row renders without its image; retrying is up to the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpdate {
    pub id: MessageId,
    pub index: usize,
    pub result: Result<String, MediaResolutionError>,
}

/// Ties a projector to a live store subscription.
///
/// The subscription runs while the screen is visible: `start` replays the
/// collection into an empty feed, `stop` cancels the listener and clears the
/// feed so the next `start` rebuilds it without duplicates.
pub struct FeedSession {
    projector: Arc<RwLock<FeedProjector>>,
    collection: String,
    listener: Option<(CancellationToken, JoinHandle<()>)>,
    media_tx: mpsc::UnboundedSender<MediaUpdate>,
}

impl FeedSession {
    pub fn new(
        projector: FeedProjector,
        collection: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<MediaUpdate>) {
        let (media_tx, media_rx) = mpsc::unbounded_channel();
        let session = Self {
            projector: Arc::new(RwLock::new(projector)),
            collection: collection.into(),
            listener: None,
            media_tx,
        };
        (session, media_rx)
    }

    /// Shared handle for readers. Holding the read lock guarantees a fully
    /// applied feed.
    pub fn projector(&self) -> Arc<RwLock<FeedProjector>> {
        self.projector.clone()
    }

    /// False once the store closed the subscription, even before `stop`.
    pub fn is_listening(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }

    pub async fn start(&mut self) -> Result<(), StoreError> {
        if self.is_listening() {
            return Ok(());
        }
        // Reap a listener that ended on its own and drop the rows it left.
        self.stop().await;

        let store = self.projector.read().await.store().clone();
        let mut subscription = store.subscribe(&self.collection).await?;

        let token = CancellationToken::new();
        let cancel = token.clone();
        let projector = self.projector.clone();
        let collection = self.collection.clone();

        let handle = tokio::spawn(async move {
            loop {
                let mutation = tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = subscription.next() => match next {
                        Some(mutation) => mutation,
                        None => {
                            warn!("Subscription to {} closed by the store", collection);
                            break;
                        }
                    },
                };

                // Rejections are logged by the projector and never stop the feed.
                let _ = projector.write().await.apply(mutation);
            }
            debug!("Listener for {} exited", collection);
        });

        self.listener = Some((token, handle));
        info!("Listening to {}", self.collection);
        Ok(())
    }

    pub async fn stop(&mut self) {
        let Some((token, handle)) = self.listener.take() else {
            return;
        };

        token.cancel();
        if let Err(e) = handle.await {
            warn!("Listener task for {} failed: {}", self.collection, e);
        }

        self.projector.write().await.reset();
        info!("Stopped listening to {}", self.collection);
    }

    /// Resolve the image of row `id` in the background. Fresh results, failed
    /// or not, arrive on the media channel; stale ones are dropped. Returns
    /// `false` when the row has nothing to resolve.
    pub async fn request_media(&self, id: &MessageId) -> Result<bool, FeedError> {
        let request = self.projector.read().await.media_request(id)?;
        let Some(request) = request else {
            return Ok(false);
        };

        let projector = self.projector.clone();
        let media_tx = self.media_tx.clone();

        tokio::spawn(async move {
            let resolved = request.resolve().await;
            let id = resolved.ticket.id.clone();
            let outcome = projector.read().await.accept_resolution(resolved);

            let update = match outcome {
                Resolution::Display { index, url } => MediaUpdate { id, index, result: Ok(url) },
                Resolution::Failed { index, error } => MediaUpdate { id, index, result: Err(error) },
                Resolution::Stale => return,
            };
            let _ = media_tx.send(update);
        });

        Ok(true)
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        if let Some((token, _)) = self.listener.take() {
            token.cancel();
        }
    }
}
