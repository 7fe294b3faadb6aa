use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;

use super::{FetchResponse, ObjectStore};
use crate::error::{Error, Result};
use crate::range::ByteRange;

/// Seconds since the epoch of the first version written to a memory store.
const EPOCH_SECS: i64 = 1_700_000_000;

/// A one-shot failure for [`MemoryStore`] to produce on the next fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The request fails before any response is produced.
    Transport,
    /// The response starts normally, but the body breaks after `after` bytes.
    BrokenBody { after: usize },
}

#[derive(Debug)]
struct Entry {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<String, Entry>,
    version: i64,
    requests: Vec<(String, Option<ByteRange>)>,
    faults: VecDeque<Fault>,
}

/// In-memory object store with the range semantics of a real one.
///
/// Any range of a zero-length object and any range starting past the last
/// byte is rejected with [`Error::RangeNotSatisfiable`]; range ends past the
/// last byte are clamped. Every `put` gets a fresh last-modified timestamp.
/// All fetches are recorded so tests can assert on network traffic.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
    body_chunk: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            body_chunk: 4,
        }
    }

    /// Split response bodies into chunks of at most `size` bytes.
    pub fn with_body_chunk(mut self, size: usize) -> Self {
        self.body_chunk = size.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or replace the object at `key`.
    pub fn put(&self, key: impl Into<String>, data: impl Into<Bytes>) {
        let mut state = self.state();
        state.version += 1;
        let last_modified = DateTime::from_timestamp(EPOCH_SECS + state.version, 0)
            .unwrap_or_default();
        state.objects.insert(
            key.into(),
            Entry {
                data: data.into(),
                last_modified,
            },
        );
    }

    pub fn delete(&self, key: &str) -> bool {
        self.state().objects.remove(key).is_some()
    }

    /// Queue a failure for an upcoming fetch. Faults are consumed in order.
    pub fn inject(&self, fault: Fault) {
        self.state().faults.push_back(fault);
    }

    /// Number of fetches issued so far, successful or not.
    pub fn fetch_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Every fetch issued so far, in order.
    pub fn requests(&self) -> Vec<(String, Option<ByteRange>)> {
        self.state().requests.clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn fetch(&self, key: &str, range: Option<ByteRange>) -> Result<FetchResponse> {
        let mut state = self.state();
        state.requests.push((key.to_string(), range));

        let fault = state.faults.pop_front();
        if fault == Some(Fault::Transport) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "injected transport failure",
            )));
        }

        let entry = state.objects.get(key).ok_or_else(|| Error::NotFound {
            key: key.to_string(),
        })?;
        let size = entry.data.len() as u64;

        let (data, content_range) = match range {
            None => (entry.data.clone(), None),
            Some(range) if range.start >= size => {
                return Err(Error::RangeNotSatisfiable {
                    key: key.to_string(),
                    range,
                });
            }
            Some(range) => {
                let end = range.end.min(size - 1);
                let data = entry.data.slice(range.start as usize..=end as usize);
                (data, Some(format!("bytes {}-{}/{}", range.start, end, size)))
            }
        };

        let content_length = data.len() as u64;
        let mut chunks: Vec<Result<Bytes>> = Vec::new();
        let mut rest = data;
        if let Some(Fault::BrokenBody { after }) = fault {
            rest.truncate(after.min(rest.len()));
        }
        while !rest.is_empty() {
            let n = self.body_chunk.min(rest.len());
            chunks.push(Ok(rest.split_to(n)));
        }
        if let Some(Fault::BrokenBody { .. }) = fault {
            chunks.push(Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "injected body failure",
            ))));
        }

        Ok(FetchResponse {
            body: futures::stream::iter(chunks).boxed(),
            content_length,
            content_range,
            last_modified: entry.last_modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;

    async fn drain(resp: FetchResponse) -> Result<Vec<u8>> {
        let chunks: Vec<Bytes> = resp.body.try_collect().await?;
        Ok(chunks.concat())
    }

    #[tokio::test]
    async fn test_range_semantics() {
        let store = MemoryStore::new();
        store.put("hello.txt", "hello, world");
        store.put("empty", Bytes::new());

        let resp = store
            .fetch("hello.txt", Some(ByteRange::new(7, 100)))
            .await
            .unwrap();
        assert_eq!(resp.content_range.as_deref(), Some("bytes 7-11/12"));
        assert_eq!(resp.content_length, 5);
        assert_eq!(drain(resp).await.unwrap(), b"world");

        let err = store
            .fetch("hello.txt", Some(ByteRange::new(12, 20)))
            .await
            .unwrap_err();
        assert!(err.is_range_not_satisfiable());

        let err = store
            .fetch("empty", Some(ByteRange::new(0, 0)))
            .await
            .unwrap_err();
        assert!(err.is_range_not_satisfiable());

        let resp = store.fetch("empty", None).await.unwrap();
        assert_eq!(resp.content_length, 0);
        assert!(resp.content_range.is_none());

        assert!(store.fetch("nope", None).await.unwrap_err().is_not_found());
        assert_eq!(store.fetch_count(), 5);
    }

    #[tokio::test]
    async fn test_put_bumps_last_modified() {
        let store = MemoryStore::new();
        store.put("k", "a");
        let first = store.fetch("k", None).await.unwrap().last_modified;
        store.put("k", "b");
        let second = store.fetch("k", None).await.unwrap().last_modified;
        assert!(second > first);

        assert!(store.delete("k"));
        assert!(!store.delete("k"));
        assert!(store.fetch("k", None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_faults_are_one_shot() {
        let store = MemoryStore::new();
        store.put("k", "0123456789");
        store.inject(Fault::Transport);
        store.inject(Fault::BrokenBody { after: 3 });

        assert!(matches!(store.fetch("k", None).await, Err(Error::Io(_))));

        let resp = store.fetch("k", None).await.unwrap();
        assert_eq!(resp.content_length, 10);
        assert!(matches!(drain(resp).await, Err(Error::Io(_))));

        let resp = store.fetch("k", None).await.unwrap();
        assert_eq!(drain(resp).await.unwrap(), b"0123456789");
    }
}
