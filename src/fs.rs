//! File-system style access to a store.

use std::sync::Arc;

use crate::context::Context;
use crate::error::Result;
use crate::reader::ObjectReader;
use crate::store::ObjectStore;

/// Opens objects of one store as seekable files.
///
/// ## Example
///
/// ```no_run
/// use std::io::SeekFrom;
/// use std::sync::Arc;
/// use rangefs::{HttpConfig, RemoteFs, S3Store};
///
/// # async fn demo() -> rangefs::Result<()> {
/// let store = S3Store::new("http://127.0.0.1:9000", "media", HttpConfig::default())?;
/// let fs = RemoteFs::new(Arc::new(store)).with_chunk_size(1 << 20);
///
/// let mut file = fs.open("videos/intro.mp4").await?;
/// println!("{} bytes", file.stat().size);
///
/// file.seek(SeekFrom::End(-128))?;
/// let mut tail = Vec::new();
/// file.read_to_end(&mut tail).await?;
/// # Ok(())
/// # }
/// ```
pub struct RemoteFs<S: ObjectStore + ?Sized> {
    store: Arc<S>,
    chunk_size: u64,
}

impl<S: ObjectStore + ?Sized> Clone for RemoteFs<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            chunk_size: self.chunk_size,
        }
    }
}

impl<S: ObjectStore + ?Sized> RemoteFs<S> {
    /// Create a file system over `store`. Opened files are downloaded whole
    /// until a chunk size is set.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            chunk_size: 0,
        }
    }

    /// Fetch opened files in chunks of `chunk_size` bytes; 0 disables chunking.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Open `name`, fetching its first chunk.
    pub async fn open(&self, name: &str) -> Result<ObjectReader<S>> {
        self.open_with_context(Context::new(), name).await
    }

    /// Like [`open`](Self::open); every fetch of the returned reader honours `ctx`.
    pub async fn open_with_context(&self, ctx: Context, name: &str) -> Result<ObjectReader<S>> {
        ObjectReader::open(Arc::clone(&self.store), name, self.chunk_size, ctx).await
    }

    /// Read the whole object in a single fetch, regardless of chunk size.
    pub async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        self.read_file_with_context(Context::new(), name).await
    }

    pub async fn read_file_with_context(&self, ctx: Context, name: &str) -> Result<Vec<u8>> {
        ObjectReader::read_all(Arc::clone(&self.store), name, ctx).await
    }
}
