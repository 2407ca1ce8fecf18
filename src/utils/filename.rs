//! Display filename resolution.
//!
//! A server-supplied `Content-Disposition` name wins over the URL. Names are
//! reduced to their final path component so a header can never point the
//! output outside of the destination directory.

use percent_encoding::percent_decode_str;
use reqwest::Url;

/// Name used when neither the headers nor the URL provide one.
pub const DEFAULT_FILENAME: &str = "download";

/// Extract the `filename=` parameter of a `Content-Disposition` value.
///
/// Quoted values run up to the closing quote, unquoted ones up to the next
/// `;` (or the end of the value). Returns `None` when the parameter is absent
/// or empty.
///
/// ```rust
/// use rangefetch::utils::filename_from_disposition;
///
/// assert_eq!(
///     filename_from_disposition(r#"attachment; filename="report.pdf""#),
///     Some("report.pdf".to_string())
/// );
/// assert_eq!(
///     filename_from_disposition("attachment; filename=data.csv; size=10"),
///     Some("data.csv".to_string())
/// );
/// ```
pub fn filename_from_disposition(value: &str) -> Option<String> {
    const KEY: &str = "filename=";
    let start = value.find(KEY)? + KEY.len();
    let rest = &value[start..];

    let raw = match rest.strip_prefix('"') {
        Some(quoted) => &quoted[..quoted.find('"')?],
        None => rest.split(';').next().unwrap_or_default().trim(),
    };

    sanitize(raw)
}

/// Derive a filename from the last path segment of a URL.
///
/// Query strings and fragments are ignored and the segment is
/// percent-decoded. Falls back to [`DEFAULT_FILENAME`] when the URL has no
/// usable segment.
///
/// ```rust
/// use rangefetch::utils::filename_from_url;
///
/// assert_eq!(filename_from_url("https://example.com/a/file.zip?x=1#top"), "file.zip");
/// assert_eq!(filename_from_url("https://example.com/"), "download");
/// ```
pub fn filename_from_url(url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        // Not a URL we can parse; strip query and fragment by hand.
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    };

    segment
        .map(|s| percent_decode_str(&s).decode_utf8_lossy().into_owned())
        .and_then(|s| sanitize(&s))
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

fn sanitize(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_quoted() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="Movie 2024.mkv"; size=1"#),
            Some("Movie 2024.mkv".to_string())
        );
    }

    #[test]
    fn test_disposition_unquoted_to_end() {
        assert_eq!(
            filename_from_disposition("attachment; filename=report.pdf"),
            Some("report.pdf".to_string())
        );
    }

    #[test]
    fn test_disposition_missing_or_empty() {
        assert_eq!(filename_from_disposition("inline"), None);
        assert_eq!(filename_from_disposition(r#"attachment; filename="""#), None);
        // An unterminated quote is not a usable value.
        assert_eq!(filename_from_disposition(r#"attachment; filename="oops"#), None);
    }

    #[test]
    fn test_disposition_strips_directories() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="../../etc/passwd""#),
            Some("passwd".to_string())
        );
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="C:\temp\evil.exe""#),
            Some("evil.exe".to_string())
        );
    }

    #[test]
    fn test_url_segment() {
        assert_eq!(filename_from_url("http://domain.com/file.zip"), "file.zip");
        assert_eq!(
            filename_from_url("https://example.com/dir/my%20file.tar.gz?token=abc"),
            "my file.tar.gz"
        );
    }

    #[test]
    fn test_url_without_segment() {
        assert_eq!(filename_from_url("http://example.com"), DEFAULT_FILENAME);
        assert_eq!(filename_from_url("http://example.com/dir/"), DEFAULT_FILENAME);
    }

    #[test]
    fn test_unparsable_url() {
        assert_eq!(filename_from_url("not a url/thing.bin?q=1"), "thing.bin");
        assert_eq!(filename_from_url(""), DEFAULT_FILENAME);
    }
}
