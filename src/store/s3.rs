use async_trait::async_trait;
use reqwest::header::RANGE;
use reqwest::{Client, Url};

use super::http::{self, HttpConfig, parse_endpoint};
use super::{FetchResponse, ObjectStore};
use crate::error::{Error, Result};
use crate::range::ByteRange;

/// S3-compatible REST store using path-style URLs.
///
/// Objects are fetched with `GET {endpoint}/{bucket}/{key}`; ranged fetches
/// carry a `Range: bytes=start-end` header. Requests are unsigned, so this
/// works against public buckets, presigned endpoints and local emulators.
pub struct S3Store {
    client: Client,
    endpoint: Url,
    bucket: String,
}

impl S3Store {
    /// Create a store for one bucket.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Service URL without the bucket, e.g. `https://s3.us-west-2.amazonaws.com`
    /// * `bucket` - Bucket name
    /// * `config` - HTTP client configuration
    pub fn new(endpoint: &str, bucket: impl Into<String>, config: HttpConfig) -> Result<Self> {
        let bucket = bucket.into();
        if bucket.is_empty() || bucket.contains('/') {
            return Err(Error::InvalidConfig(format!("invalid bucket name {bucket:?}")));
        }

        let endpoint = parse_endpoint(endpoint)?;
        Ok(Self {
            client: config.build_client()?,
            endpoint,
            bucket,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// URL of `key`, with each path segment percent-encoded.
    pub fn object_url(&self, key: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.bucket)
                .extend(key.trim_start_matches('/').split('/'));
        }
        url
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn fetch(&self, key: &str, range: Option<ByteRange>) -> Result<FetchResponse> {
        let mut request = self.client.get(self.object_url(key));
        if let Some(range) = range {
            request = request.header(RANGE, range.to_header());
        }
        http::fetch(request, key, range).await
    }
}
