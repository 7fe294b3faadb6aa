//! HTTP byte ranges.
//!
//! [`ByteRange`] is what a reader asks a store for, [`ContentRange`] is what
//! the store says it returned. Both use inclusive end offsets, following the
//! `Range:` and `Content-Range:` headers of RFC 9110.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// An inclusive byte range `[start, end]` of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Create a range covering `start..=end`.
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "byte range {start}-{end} is inverted");
        Self { start, end }
    }

    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A byte range always covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value for a `Range` request header, e.g. `bytes=0-1023`.
    pub fn to_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A parsed `Content-Range` response header: `bytes start-end/total`.
///
/// `end` is the last included byte index and `total` the full object length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ContentRange {
    /// Parse an optional header value.
    ///
    /// An absent header is a parse failure: ranged responses must carry one.
    pub fn parse(value: Option<&str>) -> Result<Self> {
        match value {
            Some(v) => v.parse(),
            None => Err(Error::MalformedContentRange {
                value: "<missing>".to_string(),
            }),
        }
    }

    /// Number of bytes carried by the response.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A content range always carries at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True if the range reaches the last byte of the object.
    pub fn reaches_end(&self) -> bool {
        self.end + 1 == self.total
    }
}

impl FromStr for ContentRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::MalformedContentRange {
            value: s.to_string(),
        };

        let mut tokens = s.split_whitespace();
        let (Some(unit), Some(interval), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(malformed());
        };
        if !unit.eq_ignore_ascii_case("bytes") {
            return Err(malformed());
        }

        let (range, total) = interval.split_once('/').ok_or_else(malformed)?;
        let (start, end) = range.split_once('-').ok_or_else(malformed)?;

        let parse = |field: &str| -> Result<u64> {
            // u64::from_str accepts a leading '+', which is not valid here
            if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            field.parse().map_err(|_| malformed())
        };
        let (start, end, total) = (parse(start)?, parse(end)?, parse(total)?);

        if start > end || end >= total {
            return Err(malformed());
        }

        Ok(Self { start, end, total })
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;
    use rstest::rstest;

    #[rstest]
    #[case("bytes 0-0/12", 0, 0, 12)]
    #[case("bytes 7-11/12", 7, 11, 12)]
    #[case("bytes 0-1023/146515", 0, 1023, 146515)]
    #[case("BYTES 5-5/6", 5, 5, 6)]
    #[case("bytes 0-18446744073709551613/18446744073709551615", 0, u64::MAX - 2, u64::MAX)]
    fn test_parse_content_range(
        #[case] header: &str,
        #[case] start: u64,
        #[case] end: u64,
        #[case] total: u64,
    ) {
        let range: ContentRange = header.parse().unwrap();
        assert_eq!(range, ContentRange { start, end, total });
    }

    #[rstest]
    #[case("")]
    #[case("bytes")]
    #[case("bytes 0-10")]
    #[case("bytes 0-10 /12")]
    #[case("bytes 0/12")]
    #[case("bytes a-10/12")]
    #[case("bytes 0-b/12")]
    #[case("bytes 0-10/*")]
    #[case("bytes */12")]
    #[case("bytes +1-10/12")]
    #[case("bytes -1-10/12")]
    #[case("items 0-10/12")]
    #[case("bytes 0-10/12 extra")]
    #[case("bytes 5-4/12")]
    #[case("bytes 0-12/12")]
    #[case("bytes 0-99999999999999999999/100000000000000000000")]
    fn test_parse_malformed(#[case] header: &str) {
        let err = header.parse::<ContentRange>().unwrap_err();
        assert!(matches!(err, Error::MalformedContentRange { .. }), "{header}: {err}");
    }

    #[test]
    fn test_parse_missing() {
        let err = ContentRange::parse(None).unwrap_err();
        assert!(matches!(err, Error::MalformedContentRange { ref value } if value == "<missing>"));
    }

    #[test]
    fn test_display_parses_back() {
        for (start, end, total) in [(0, 0, 1), (3, 9, 10), (100, 199, 4096)] {
            let range = ContentRange { start, end, total };
            assert_eq!(range.to_string().parse::<ContentRange>().unwrap(), range);
        }
    }

    #[quickcheck]
    fn prop_display_parses_back(a: u64, b: u64, extra: u64) -> TestResult {
        let (start, end) = (a.min(b), a.max(b));
        let Some(total) = end.checked_add(1 + extra % 4096) else {
            return TestResult::discard();
        };

        let range = ContentRange { start, end, total };
        TestResult::from_bool(range.to_string().parse::<ContentRange>().ok() == Some(range))
    }

    #[test]
    fn test_reaches_end() {
        assert!("bytes 7-11/12".parse::<ContentRange>().unwrap().reaches_end());
        assert!(!"bytes 0-0/12".parse::<ContentRange>().unwrap().reaches_end());
    }

    #[test]
    fn test_byte_range_header() {
        let range = ByteRange::new(7, 11);
        assert_eq!(range.to_header(), "bytes=7-11");
        assert_eq!(range.len(), 5);
        assert_eq!(range.to_string(), "7-11");
    }
}
