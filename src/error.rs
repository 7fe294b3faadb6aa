//! Error types for remote object access.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::range::ByteRange;

/// Result type for remote object operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching or reading a remote object.
#[derive(Debug, Error)]
pub enum Error {
    /// The key does not exist in the store (HTTP 404).
    #[error("object not found: {key}")]
    NotFound {
        /// Key that was requested
        key: String,
    },

    /// The requested byte range is not valid for the object (HTTP 416).
    ///
    /// Zero-length objects reject every range, including `bytes=0-0`.
    #[error("range {range} not satisfiable for {key}")]
    RangeNotSatisfiable {
        /// Key that was requested
        key: String,
        /// Range that was rejected
        range: ByteRange,
    },

    /// A ranged response carried no usable `Content-Range` value.
    #[error("malformed content-range: {value}")]
    MalformedContentRange {
        /// Raw header value, or `<missing>`
        value: String,
    },

    /// A ranged response did not start at the requested offset.
    #[error("unexpected range for {key}: expected start {expected}, got {got}")]
    UnexpectedRange {
        /// Key that was requested
        key: String,
        /// Offset that was requested
        expected: u64,
        /// Offset the store returned
        got: u64,
    },

    /// The object was modified by another writer between two fetches.
    #[error("object {key} changed during read: last-modified was {before}, now {now}")]
    ObjectChanged {
        /// Key being read
        key: String,
        /// Timestamp observed on the first fetch
        before: DateTime<Utc>,
        /// Timestamp observed on the rejected fetch
        now: DateTime<Utc>,
    },

    /// The object's total size changed between two fetches.
    #[error("object {key} changed during read: size was {before}, now {now}")]
    SizeChanged {
        /// Key being read
        key: String,
        /// Size observed on the first fetch
        before: u64,
        /// Size reported by the rejected fetch
        now: u64,
    },

    /// The response body length disagreed with the advertised length.
    #[error("short body for {key}: expected {expected} bytes, got {actual}")]
    ShortBody {
        /// Key being read
        key: String,
        /// Advertised number of bytes
        expected: u64,
        /// Number of bytes actually drained
        actual: u64,
    },

    /// A seek resolved to a position before the start of the object.
    #[error("invalid seek to negative position {offset}")]
    InvalidSeek {
        /// The resolved (negative) position
        offset: i128,
    },

    /// A seek resolved to a position past the largest representable offset.
    #[error("seek to position {offset} overflows the 64-bit offset range")]
    SeekOverflow {
        /// The resolved position
        offset: i128,
    },

    /// HTTP error response from the store.
    #[error("HTTP error: {status} - {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error message or response body
        message: String,
    },

    /// Network error during an HTTP request.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A required response header was absent.
    #[error("missing {name} header")]
    MissingHeader {
        /// Header name
        name: &'static str,
    },

    /// A response header could not be interpreted.
    #[error("invalid {name} header: {value}")]
    InvalidHeader {
        /// Header name
        name: &'static str,
        /// Raw header value
        value: String,
    },

    /// I/O error while draining a response body.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation was cancelled through its [`Context`](crate::Context).
    #[error("operation cancelled")]
    Cancelled,

    /// The deadline of the operation's [`Context`](crate::Context) passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Store configuration could not be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Returns true if the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Returns true if the store rejected the requested range.
    pub fn is_range_not_satisfiable(&self) -> bool {
        matches!(self, Error::RangeNotSatisfiable { .. })
    }

    /// Returns true if the object was mutated between fetches of one reader.
    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, Error::ObjectChanged { .. } | Error::SizeChanged { .. })
    }
}
