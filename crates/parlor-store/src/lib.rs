/// Message store backends for the chat feed.
///
/// Both backends assign time-ordered push ids, keep each collection sorted
/// by id, and fan mutations out to subscribers through a `Dispatcher`.

pub mod db;
pub mod dispatcher;
pub mod memory;
pub mod push_id;
pub mod sqlite;

pub use memory::MemoryStore;
pub use push_id::PushIdGenerator;
pub use sqlite::SqliteStore;
