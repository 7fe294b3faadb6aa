//! Backing store clients.
//!
//! A reader needs exactly one thing from a store: fetch bytes `[start, end]`
//! of an object, or the whole object. [`ObjectStore`] is that capability;
//! each backend shapes the request its own way and reports the response in
//! the common [`FetchResponse`] form.

mod blob;
mod http;
mod memory;
mod s3;

pub use blob::{BlobRange, BlobStore};
pub use http::HttpConfig;
pub use memory::{Fault, MemoryStore};
pub use s3::S3Store;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::error::Result;
use crate::range::ByteRange;

/// Response body as a stream of chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// A store's answer to a single fetch.
pub struct FetchResponse {
    /// Object bytes; must be drained (or dropped) before the next fetch.
    pub body: ByteStream,
    /// Number of bytes in `body`.
    pub content_length: u64,
    /// Raw `Content-Range` value, present only for ranged responses.
    pub content_range: Option<String>,
    /// Last modification time of the object.
    pub last_modified: DateTime<Utc>,
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("content_length", &self.content_length)
            .field("content_range", &self.content_range)
            .field("last_modified", &self.last_modified)
            .finish_non_exhaustive()
    }
}

/// Trait for stores that can serve whole objects and byte ranges of them.
///
/// Implementations must report a missing key as
/// [`Error::NotFound`](crate::Error::NotFound) and a rejected range as
/// [`Error::RangeNotSatisfiable`](crate::Error::RangeNotSatisfiable), so
/// callers can tell them apart from transport failures.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch `range` of the object at `key`, or the whole object if `None`.
    async fn fetch(&self, key: &str, range: Option<ByteRange>) -> Result<FetchResponse>;
}
