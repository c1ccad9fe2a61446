pub mod events;
pub mod models;

/// Collection the chat screen subscribes to unless configured otherwise.
pub const MESSAGES_COLLECTION: &str = "messages";
