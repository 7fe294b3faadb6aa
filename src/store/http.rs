//! HTTP plumbing shared by the REST store adapters.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode, Url};

use super::FetchResponse;
use crate::error::{Error, Result};
use crate::range::ByteRange;

/// Configuration shared by the HTTP-backed stores.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 30).
    pub timeout_secs: u64,
    /// Custom User-Agent header.
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl HttpConfig {
    pub(crate) fn build_client(&self) -> Result<Client> {
        let user_agent = self
            .user_agent
            .clone()
            .unwrap_or_else(|| concat!("rangefs/", env!("CARGO_PKG_VERSION")).to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(client)
    }
}

/// Parse a service endpoint, rejecting URLs that cannot carry a path.
pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| Error::InvalidConfig(format!("invalid endpoint {endpoint:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(Error::InvalidConfig(format!(
            "endpoint must be an http(s) URL: {endpoint:?}"
        )));
    }
    Ok(url)
}

/// Send a GET and turn the response into a [`FetchResponse`].
///
/// Status codes the reader needs to tell apart are mapped to their own
/// error variants; everything else non-2xx becomes [`Error::Http`].
pub(crate) async fn fetch(
    request: RequestBuilder,
    key: &str,
    range: Option<ByteRange>,
) -> Result<FetchResponse> {
    let response = request.send().await?;
    let status = response.status();
    debug!("GET {} range={:?} -> {}", key, range, status);

    match (status, range) {
        (StatusCode::NOT_FOUND, _) => {
            return Err(Error::NotFound {
                key: key.to_string(),
            });
        }
        (StatusCode::RANGE_NOT_SATISFIABLE, Some(range)) => {
            return Err(Error::RangeNotSatisfiable {
                key: key.to_string(),
                range,
            });
        }
        (status, _) if !status.is_success() => {
            return Err(Error::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown error").into(),
            });
        }
        _ => {}
    }

    let headers = response.headers();
    let content_range = header_str(headers, "content-range")?.map(str::to_string);
    let last_modified = parse_last_modified(headers)?;
    let content_length = response.content_length().ok_or(Error::MissingHeader {
        name: "content-length",
    })?;

    Ok(FetchResponse {
        body: response.bytes_stream().map_err(Error::from).boxed(),
        content_length,
        content_range,
        last_modified,
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<Option<&'a str>> {
    match headers.get(name) {
        Some(value) => value.to_str().map(Some).map_err(|_| Error::InvalidHeader {
            name,
            value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        }),
        None => Ok(None),
    }
}

/// Parse `Last-Modified`, an HTTP-date such as `Wed, 21 Oct 2015 07:28:00 GMT`.
fn parse_last_modified(headers: &HeaderMap) -> Result<DateTime<Utc>> {
    let value = header_str(headers, "last-modified")?.ok_or(Error::MissingHeader {
        name: "last-modified",
    })?;
    DateTime::parse_from_rfc2822(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| Error::InvalidHeader {
            name: "last-modified",
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, LAST_MODIFIED};

    #[test]
    fn test_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn test_parse_last_modified() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LAST_MODIFIED,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        let t = parse_last_modified(&headers).unwrap();
        assert_eq!(t.timestamp(), 1_445_412_480);
    }

    #[test]
    fn test_parse_last_modified_errors() {
        let headers = HeaderMap::new();
        assert!(matches!(
            parse_last_modified(&headers),
            Err(Error::MissingHeader { name: "last-modified" })
        ));

        let mut headers = HeaderMap::new();
        headers.insert(LAST_MODIFIED, HeaderValue::from_static("yesterday"));
        assert!(matches!(
            parse_last_modified(&headers),
            Err(Error::InvalidHeader { name: "last-modified", .. })
        ));
    }
}
