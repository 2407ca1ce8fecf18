//! Byte-range partitioning for parallel transfers.

use std::fmt;

/// An inclusive byte range, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// First byte of the range.
    pub start: u64,
    /// Last byte of the range (inclusive).
    pub end: u64,
}

impl ByteRange {
    /// Create a new [`ByteRange`].
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "empty byte range {}-{}", start, end);
        Self { start, end }
    }

    /// Number of bytes covered by the range.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Range` request header, e.g. `bytes=0-1023`.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Split `total` bytes into at most `parts` contiguous inclusive ranges.
///
/// Returns an empty vector when either argument is zero; callers must then
/// fall back to a single-stream transfer. `parts` is clamped to `total` so no
/// range is empty, and part sizes differ by at most one byte.
///
/// ```rust
/// use rangefetch::download::{partition, ByteRange};
///
/// assert_eq!(
///     partition(10, 3),
///     vec![ByteRange::new(0, 2), ByteRange::new(3, 5), ByteRange::new(6, 9)]
/// );
/// assert!(partition(0, 4).is_empty());
/// ```
pub fn partition(total: u64, parts: u64) -> Vec<ByteRange> {
    if parts == 0 || total == 0 {
        return Vec::new();
    }

    let parts = parts.min(total);
    // u128 keeps i * total from overflowing for very large resources.
    let boundary = |i: u64| (i as u128 * total as u128 / parts as u128) as u64;

    (0..parts)
        .map(|i| ByteRange::new(boundary(i), boundary(i + 1) - 1))
        .collect()
}
