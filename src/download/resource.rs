//! Remote resource metadata.
//!
//! This module contains the [`ResourceDescriptor`] struct and the [`probe`]
//! function that fills it from a metadata-only request.
//!
//! # Examples
//!
//! ```rust
//! use rangefetch::download::ResourceDescriptor;
//! use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_RANGES, CONTENT_LENGTH};
//!
//! let mut headers = HeaderMap::new();
//! headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
//! headers.insert(CONTENT_LENGTH, HeaderValue::from_static("4096"));
//!
//! let resource = ResourceDescriptor::from_headers("https://example.com/file.zip", &headers);
//! assert!(resource.accepts_ranges);
//! assert_eq!(resource.content_size, 4096);
//! assert_eq!(resource.filename, "file.zip");
//! ```

use crate::utils::{
    accepts_byte_ranges, filename_from_disposition, filename_from_url, parse_content_length,
};

use reqwest::header::{HeaderMap, ACCEPT_ENCODING, CONTENT_DISPOSITION};
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, warn};

/// Metadata of a remote resource, resolved once before transferring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// URL of the resource.
    pub url: String,
    /// Whether the server advertised `Accept-Ranges: bytes`.
    pub accepts_ranges: bool,
    /// Advertised size in bytes. `0` means unknown or empty.
    pub content_size: u64,
    /// File name used to save the resource on disk.
    pub filename: String,
}

impl ResourceDescriptor {
    /// Build a descriptor from the headers of a metadata response.
    pub fn from_headers(url: &str, headers: &HeaderMap) -> Self {
        let filename = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| filename_from_url(url));

        Self {
            url: url.to_string(),
            accepts_ranges: accepts_byte_ranges(headers),
            content_size: parse_content_length(headers),
            filename,
        }
    }

    /// Descriptor used when the metadata request failed.
    ///
    /// The size is unknown and ranges are unsupported, which forces a
    /// single-stream transfer.
    pub fn fallback(url: &str) -> Self {
        Self {
            url: url.to_string(),
            accepts_ranges: false,
            content_size: 0,
            filename: filename_from_url(url),
        }
    }
}

/// Resolve the size, range support and filename of `url`.
///
/// Issues a HEAD request asking for the identity encoding, since a compressed
/// representation would make `Content-Length` useless for range arithmetic.
/// This never fails: transport errors and non-success responses yield
/// [`ResourceDescriptor::fallback`].
pub async fn probe(client: &ClientWithMiddleware, url: &str) -> ResourceDescriptor {
    let response = match client
        .head(url)
        .header(ACCEPT_ENCODING, "identity")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!(url, error = %e, "Resource probe failed, falling back to a single stream");
            return ResourceDescriptor::fallback(url);
        }
    };

    if !response.status().is_success() {
        warn!(url, status = %response.status(), "Resource probe rejected, falling back to a single stream");
        return ResourceDescriptor::fallback(url);
    }

    let descriptor = ResourceDescriptor::from_headers(url, response.headers());
    debug!(
        url,
        accepts_ranges = descriptor.accepts_ranges,
        content_size = descriptor.content_size,
        filename = %descriptor.filename,
        "Resource probed"
    );
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, ACCEPT_RANGES, CONTENT_LENGTH};

    #[test]
    fn test_from_headers_prefers_disposition() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_static(r#"attachment; filename="real.iso""#),
        );
        let resource = ResourceDescriptor::from_headers("http://domain.com/get?id=1", &headers);
        assert_eq!(resource.filename, "real.iso");
        assert!(!resource.accepts_ranges);
        assert_eq!(resource.content_size, 0);
    }

    #[test]
    fn test_from_headers_accept_ranges_must_be_bytes() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_RANGES, HeaderValue::from_static("none"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("10"));
        let resource = ResourceDescriptor::from_headers("http://domain.com/file.zip", &headers);
        assert!(!resource.accepts_ranges);
        assert_eq!(resource.content_size, 10);
    }

    #[test]
    fn test_fallback() {
        let resource = ResourceDescriptor::fallback("http://domain.com/");
        assert_eq!(resource.filename, "download");
        assert_eq!(resource.content_size, 0);
        assert!(!resource.accepts_ranges);
    }
}
