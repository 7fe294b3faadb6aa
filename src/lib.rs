//! # rangefs
//!
//! Seekable file access to objects in S3-compatible and blob-container
//! stores, built on HTTP Range requests.
//!
//! Object stores only serve whole objects or byte ranges of them; they keep
//! no cursor for the client. [`ObjectReader`] emulates one: it downloads an
//! object lazily in chunks, keeps everything it has downloaded so backward
//! seeks are free, and refuses to stitch together bytes from two different
//! versions of the same object.
//!
//! ## Features
//!
//! - `open` / `read` / `seek` / `stat` over any [`ObjectStore`]
//! - Configurable chunk size, or whole-object downloads
//! - Zero-length objects open normally even though stores reject every range on them
//! - Last-modified check across all fetches of one reader
//! - Cancellation and deadlines through [`Context`]
//! - Adapters for S3-style REST ([`S3Store`]) and blob containers ([`BlobStore`]),
//!   plus an in-memory [`MemoryStore`]
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rangefs::{HttpConfig, RemoteFs, S3Store};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = S3Store::new("https://s3.us-west-2.amazonaws.com", "my-bucket", HttpConfig::default())?;
//!     let fs = RemoteFs::new(Arc::new(store)).with_chunk_size(64 * 1024);
//!
//!     let mut file = fs.open("logs/today.txt").await?;
//!     let mut content = Vec::new();
//!     file.read_to_end(&mut content).await?;
//!     println!("{}: {} bytes", file.stat().name, content.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod context;
pub mod error;
pub mod fs;
pub mod range;
pub mod reader;
pub mod store;

pub use cli::Cli;
pub use context::Context;
pub use error::{Error, Result};
pub use fs::RemoteFs;
pub use range::{ByteRange, ContentRange};
pub use reader::{FetchPlan, ObjectInfo, ObjectReader};
pub use store::{BlobStore, FetchResponse, HttpConfig, MemoryStore, ObjectStore, S3Store};
