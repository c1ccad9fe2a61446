pub mod remote;
pub mod source;

pub use remote::{ConfigSettings, FetchStatus, RemoteConfig};
pub use source::{ConfigError, ConfigSource, ConfigValues, HttpConfigSource, StaticConfigSource};

/// Key holding the maximum number of characters a message may have.
pub const MESSAGE_LENGTH_KEY: &str = "message_length_limit";
