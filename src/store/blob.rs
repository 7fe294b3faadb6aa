use async_trait::async_trait;
use reqwest::{Client, Url};

use super::http::{self, HttpConfig, parse_endpoint};
use super::{FetchResponse, ObjectStore};
use crate::error::{Error, Result};
use crate::range::ByteRange;

/// Blob service REST API version sent with every request.
const API_VERSION: &str = "2021-08-06";

/// A blob download range: `count` bytes starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobRange {
    pub offset: u64,
    pub count: u64,
}

impl BlobRange {
    /// Value for the `x-ms-range` request header.
    pub fn to_header(&self) -> String {
        format!("bytes={}-{}", self.offset, self.offset + self.count - 1)
    }
}

impl From<ByteRange> for BlobRange {
    fn from(range: ByteRange) -> Self {
        Self {
            offset: range.start,
            count: range.len(),
        }
    }
}

/// Blob-container store.
///
/// Blobs are downloaded with `GET {account}/{container}/{blob}`. The account
/// URL may carry a SAS token as its query string; it is kept on every
/// request.
pub struct BlobStore {
    client: Client,
    account: Url,
    container: String,
}

impl BlobStore {
    /// Create a store for one container.
    ///
    /// `account` is e.g. `https://<account>.blob.core.windows.net?<sas-token>`,
    /// without the container name.
    pub fn new(account: &str, container: impl Into<String>, config: HttpConfig) -> Result<Self> {
        let container = container.into();
        if container.is_empty() || container.contains('/') {
            return Err(Error::InvalidConfig(format!(
                "invalid container name {container:?}"
            )));
        }

        Ok(Self {
            client: config.build_client()?,
            account: parse_endpoint(account)?,
            container,
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn blob_url(&self, name: &str) -> Url {
        let mut url = self.account.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.container)
                .extend(name.trim_start_matches('/').split('/'));
        }
        url
    }
}

#[async_trait]
impl ObjectStore for BlobStore {
    async fn fetch(&self, key: &str, range: Option<ByteRange>) -> Result<FetchResponse> {
        let mut request = self
            .client
            .get(self.blob_url(key))
            .header("x-ms-version", API_VERSION);
        if let Some(range) = range.map(BlobRange::from) {
            request = request.header("x-ms-range", range.to_header());
        }
        http::fetch(request, key, range).await
    }
}
