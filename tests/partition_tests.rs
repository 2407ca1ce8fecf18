//! Properties of the range partitioner.

use rangefetch::download::{partition, ByteRange};

fn assert_exact_cover(total: u64, ranges: &[ByteRange]) {
    let mut next = 0;
    for range in ranges {
        assert_eq!(range.start, next, "gap or overlap before {}", range);
        assert!(range.start <= range.end);
        next = range.end + 1;
    }
    assert_eq!(next, total);
    assert_eq!(ranges.iter().map(ByteRange::len).sum::<u64>(), total);
}

#[test]
fn test_partition_covers_exactly() {
    for total in [1, 2, 7, 100, 1000, 1_048_577, 12 * 1024 * 1024] {
        for parts in [1, 2, 3, 8, 16, 64] {
            let ranges = partition(total, parts);
            assert_eq!(ranges.len() as u64, parts.min(total));
            assert_exact_cover(total, &ranges);

            let min = ranges.iter().map(ByteRange::len).min().unwrap();
            let max = ranges.iter().map(ByteRange::len).max().unwrap();
            assert!(max - min <= 1, "skew for {} in {} parts", total, parts);
        }
    }
}

#[test]
fn test_partition_is_deterministic() {
    assert_eq!(partition(999_999, 7), partition(999_999, 7));
}

#[test]
fn test_partition_degenerate_inputs() {
    assert!(partition(0, 8).is_empty());
    assert!(partition(100, 0).is_empty());
    assert_eq!(partition(3, 8).len(), 3);
}

#[test]
fn test_partition_header_values() {
    let headers: Vec<_> = partition(10, 3).iter().map(ByteRange::header_value).collect();
    assert_eq!(headers, vec!["bytes=0-2", "bytes=3-5", "bytes=6-9"]);
}
