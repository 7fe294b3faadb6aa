//! Lazy, seekable reader over a remote object.
//!
//! An [`ObjectReader`] keeps every byte it has downloaded in one contiguous
//! buffer starting at offset 0 of the object. Reads are served from that
//! buffer; when it runs short the reader fetches the next chunk with a range
//! request. A forward seek past the downloaded prefix is resolved on the
//! next read by fetching the whole remainder, which keeps the buffer free of
//! gaps. Backward seeks never touch the network.
//!
//! ## Consistency
//!
//! The first response fixes the object's last-modified time. Every later
//! response must report the same time, otherwise the object was rewritten
//! between fetches and the read fails with
//! [`Error::ObjectChanged`].
//!
//! ## Failure atomicity
//!
//! A response body is drained into a staging buffer and only committed once
//! it has been read completely and validated. A failed or cancelled fetch
//! leaves the reader exactly as it was, so the same `read` can be retried.

use std::io::SeekFrom;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use log::{debug, trace, warn};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::range::{ByteRange, ContentRange};
use crate::store::{FetchResponse, ObjectStore};

const READ_BUF_SIZE: usize = 64 * 1024;

/// Metadata of an opened object, as reported by [`ObjectReader::stat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl ObjectInfo {
    /// Objects are never directories.
    pub fn is_dir(&self) -> bool {
        false
    }
}

/// The next fetch a reader needs to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    /// Download the whole object without a range.
    Whole,
    /// Extend the buffer by one chunk.
    Chunk(ByteRange),
    /// Download everything from the end of the buffer to the end of the
    /// object, closing the gap left by a forward seek.
    Remainder(ByteRange),
}

/// Seekable reader that downloads a remote object lazily, chunk by chunk.
///
/// Created with [`ObjectReader::open`], which performs the first fetch so
/// that [`stat`](Self::stat) is immediately available.
#[derive(Debug)]
pub struct ObjectReader<S: ObjectStore + ?Sized> {
    store: Arc<S>,
    ctx: Context,
    name: String,
    /// Fetch granularity; 0 downloads the whole object at once.
    chunk_size: u64,

    /// Bytes `[0, buf.len())` of the object.
    buf: Vec<u8>,
    /// Caller-visible cursor; may run ahead of `buf.len()` after a seek.
    read_offset: u64,
    size: u64,
    modified: Option<DateTime<Utc>>,
    complete: bool,

    fetches: u64,
    transferred: u64,
}

impl<S: ObjectStore + ?Sized> ObjectReader<S> {
    /// Open `name` and download its first chunk.
    ///
    /// # Arguments
    ///
    /// * `store` - Backing store client
    /// * `name` - Object key
    /// * `chunk_size` - Bytes per range request, 0 for a single whole-object download
    /// * `ctx` - Cancellation and deadline applied to every fetch of this reader
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the key does not exist, or any transport error.
    /// A zero-length object is not an error.
    pub async fn open(
        store: Arc<S>,
        name: impl Into<String>,
        chunk_size: u64,
        ctx: Context,
    ) -> Result<Self> {
        let mut reader = Self {
            store,
            ctx,
            name: name.into(),
            chunk_size,
            buf: Vec::new(),
            read_offset: 0,
            size: 0,
            modified: None,
            complete: false,
            fetches: 0,
            transferred: 0,
        };

        let plan = reader.first_plan();
        reader.fill(plan).await?;
        Ok(reader)
    }

    /// Download `name` in one whole-object fetch and return its bytes.
    pub async fn read_all(store: Arc<S>, name: &str, ctx: Context) -> Result<Vec<u8>> {
        let reader = Self::open(store, name, 0, ctx).await?;
        Ok(reader.buf)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stat(&self) -> ObjectInfo {
        ObjectInfo {
            name: self.name.clone(),
            size: self.size,
            modified: self.modified.unwrap_or_default(),
        }
    }

    /// Current read position.
    pub fn position(&self) -> u64 {
        self.read_offset
    }

    /// Number of bytes downloaded so far.
    pub fn downloaded(&self) -> u64 {
        self.buf.len() as u64
    }

    /// True once the whole object is buffered; no further fetches will happen.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Number of successful fetches performed by this reader.
    pub fn fetch_count(&self) -> u64 {
        self.fetches
    }

    /// Total body bytes received by this reader.
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred
    }

    /// Read into `out`, fetching at most once, and return the number of bytes
    /// copied. Returns 0 at end of object.
    pub async fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        if self.read_offset >= self.size || out.is_empty() {
            return Ok(0);
        }

        if let Some(plan) = self.plan_fetch(out.len()) {
            self.fill(plan).await?;
        }

        let start = self.read_offset as usize;
        let available = self.buf.len().saturating_sub(start);
        let n = available.min(out.len());
        out[..n].copy_from_slice(&self.buf[start..start + n]);
        self.read_offset += n as u64;
        trace!("read {} bytes of {} at {}", n, self.name, start);
        Ok(n)
    }

    /// Read everything from the current position to the end into `out`.
    pub async fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let len = match self.chunk_size {
            0 => READ_BUF_SIZE,
            n => n.min(READ_BUF_SIZE as u64) as usize,
        };
        let mut chunk = vec![0u8; len];
        let mut total = 0;
        loop {
            let n = self.read(&mut chunk).await?;
            if n == 0 {
                return Ok(total);
            }
            out.extend_from_slice(&chunk[..n]);
            total += n;
        }
    }

    /// Move the read position. Never fetches; a position past the end of the
    /// object is allowed and reads as end of object.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSeek`] if the position would be negative and
    /// [`Error::SeekOverflow`] if it would exceed `u64::MAX`; in both cases
    /// the position is left unchanged.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(delta) => self.read_offset as i128 + delta as i128,
            SeekFrom::End(delta) => self.size as i128 + delta as i128,
        };
        if target < 0 {
            return Err(Error::InvalidSeek { offset: target });
        }

        self.read_offset =
            u64::try_from(target).map_err(|_| Error::SeekOverflow { offset: target })?;
        Ok(self.read_offset)
    }

    /// Decide what, if anything, must be fetched before `want` bytes can be
    /// served from the current position.
    pub fn plan_fetch(&self, want: usize) -> Option<FetchPlan> {
        if self.complete || self.read_offset >= self.size {
            return None;
        }

        let downloaded = self.buf.len() as u64;
        let last = self.size - 1;

        if self.read_offset > downloaded {
            return Some(FetchPlan::Remainder(ByteRange::new(downloaded, last)));
        }

        let buffered = downloaded - self.read_offset;
        if buffered >= want as u64 {
            return None;
        }

        if self.chunk_size == 0 {
            return Some(FetchPlan::Remainder(ByteRange::new(downloaded, last)));
        }
        let end = downloaded.saturating_add(self.chunk_size - 1).min(last);
        Some(FetchPlan::Chunk(ByteRange::new(downloaded, end)))
    }

    fn first_plan(&self) -> FetchPlan {
        match self.chunk_size {
            0 => FetchPlan::Whole,
            n => FetchPlan::Chunk(ByteRange::new(0, n - 1)),
        }
    }

    /// Perform `plan` and commit the result into the buffer.
    async fn fill(&mut self, plan: FetchPlan) -> Result<()> {
        let range = match plan {
            FetchPlan::Whole => None,
            FetchPlan::Chunk(range) | FetchPlan::Remainder(range) => Some(range),
        };
        debug!("fetch {} {:?}", self.name, plan);

        match self.fetch(range).await {
            Err(err) if err.is_range_not_satisfiable() && self.buf.is_empty() => {
                // Zero-length objects have no valid byte range at all.
                warn!(
                    "{}: range {:?} not satisfiable, downloading whole object",
                    self.name, range
                );
                self.fetch(None).await
            }
            result => result,
        }
    }

    /// One fetch: request, guard, drain, validate, commit.
    async fn fetch(&mut self, range: Option<ByteRange>) -> Result<()> {
        let ctx = self.ctx.clone();
        let store = Arc::clone(&self.store);
        let name = self.name.clone();

        let (resp, body) = ctx
            .run(async {
                let mut resp = store.fetch(&name, range).await?;
                self.check_modified(&resp)?;
                let body = drain(&mut resp).await?;
                Ok::<_, Error>((resp, body))
            })
            .await?;

        self.commit(range, &resp, body)
    }

    fn check_modified(&self, resp: &FetchResponse) -> Result<()> {
        match self.modified {
            Some(before) if before != resp.last_modified => {
                warn!(
                    "{}: last-modified changed from {} to {}",
                    self.name, before, resp.last_modified
                );
                Err(Error::ObjectChanged {
                    key: self.name.clone(),
                    before,
                    now: resp.last_modified,
                })
            }
            _ => Ok(()),
        }
    }

    /// Validate a drained response against the request and apply it.
    fn commit(
        &mut self,
        range: Option<ByteRange>,
        resp: &FetchResponse,
        body: Vec<u8>,
    ) -> Result<()> {
        let received = body.len() as u64;
        if received != resp.content_length {
            return Err(Error::ShortBody {
                key: self.name.clone(),
                expected: resp.content_length,
                actual: received,
            });
        }

        let (size, complete) = match range {
            None => (received, true),
            Some(_) => {
                let cr = ContentRange::parse(resp.content_range.as_deref())?;
                let downloaded = self.buf.len() as u64;
                if cr.start != downloaded {
                    return Err(Error::UnexpectedRange {
                        key: self.name.clone(),
                        expected: downloaded,
                        got: cr.start,
                    });
                }
                if cr.len() != received {
                    return Err(Error::ShortBody {
                        key: self.name.clone(),
                        expected: cr.len(),
                        actual: received,
                    });
                }
                if self.modified.is_some() && cr.total != self.size {
                    return Err(Error::SizeChanged {
                        key: self.name.clone(),
                        before: self.size,
                        now: cr.total,
                    });
                }
                (cr.total, cr.reaches_end())
            }
        };

        if range.is_none() {
            self.buf = body;
        } else {
            self.buf.extend_from_slice(&body);
        }
        self.size = size;
        self.complete = complete;
        self.modified.get_or_insert(resp.last_modified);
        self.fetches += 1;
        self.transferred += received;
        Ok(())
    }
}

/// Read a response body to the end.
async fn drain(resp: &mut FetchResponse) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(resp.content_length.min(64 * 1024 * 1024) as usize);
    while let Some(chunk) = resp.body.try_next().await? {
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
