/// Media backends: resolving indirect image references and storing uploads.

pub mod http;
pub mod memory;

pub use http::HttpMediaResolver;
pub use memory::MemoryBlobStore;
