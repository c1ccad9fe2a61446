/// Parlor feed: client-side projection of a live chat collection.
///
/// - `OrderedFeed`: ordered rows with an id→position index
/// - `FeedProjector`: applies store mutations, emits row notifications,
///   decides auto-scroll, and checks media resolutions for staleness
/// - `FeedSession`: subscription lifecycle and background media resolution
/// - `Composer`: outgoing text and image flows
///
/// Store, media resolution and blob storage are reached through the
/// `MessageStore`, `MediaResolver` and `BlobStorage` traits.

pub mod compose;
pub mod error;
pub mod feed;
pub mod media;
pub mod projector;
pub mod row;
pub mod scroll;
pub mod session;
pub mod store;

pub use compose::Composer;
pub use error::{ComposeError, FeedError, MediaResolutionError, StoreError, UploadError};
pub use feed::{FeedRow, OrderedFeed};
pub use media::{
    BlobStorage, MediaRequest, MediaResolver, Resolution, ResolvedMedia, RowTicket,
    resolve_display_url,
};
pub use projector::FeedProjector;
pub use row::{Avatar, RowBody, RowView};
pub use scroll::should_auto_scroll;
pub use session::{FeedSession, MediaUpdate};
pub use store::{MessageStore, Subscription};
