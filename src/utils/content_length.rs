//! Response header helpers used by the resource probe.
//!
//! Sizes are always read from the `Content-Length` header itself and never
//! from the response body hint: a HEAD response has no body, so the hint
//! would report zero.

use reqwest::header::{HeaderMap, ACCEPT_RANGES, CONTENT_LENGTH};

/// Extract the advertised size from a `Content-Length` header.
///
/// Returns `0` when the header is missing, is not valid ASCII or is not an
/// unsigned integer. Zero is the "unknown size" marker of a resource.
///
/// # Example
///
/// ```rust
/// use rangefetch::utils::parse_content_length;
/// use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(CONTENT_LENGTH, HeaderValue::from_static("2048"));
/// assert_eq!(parse_content_length(&headers), 2048);
/// ```
pub fn parse_content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Whether the server advertises byte-range support.
///
/// Only the exact value `bytes` counts. `none`, any other unit, or a missing
/// header all mean ranged requests cannot be relied on.
pub fn accepts_byte_ranges(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT_RANGES)
        .map(|value| value == "bytes")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_parse_content_length() {
        assert_eq!(parse_content_length(&headers(&[("content-length", "1024")])), 1024);
        assert_eq!(
            parse_content_length(&headers(&[("content-length", "999999999999")])),
            999999999999
        );
        assert_eq!(parse_content_length(&headers(&[("content-length", "abc")])), 0);
        assert_eq!(parse_content_length(&headers(&[("content-length", "-5")])), 0);
        assert_eq!(parse_content_length(&HeaderMap::new()), 0);
    }

    #[test]
    fn test_accepts_byte_ranges() {
        assert!(accepts_byte_ranges(&headers(&[("accept-ranges", "bytes")])));
        assert!(!accepts_byte_ranges(&headers(&[("accept-ranges", "none")])));
        assert!(!accepts_byte_ranges(&headers(&[("accept-ranges", "pages")])));
        assert!(!accepts_byte_ranges(&HeaderMap::new()));
    }
}
