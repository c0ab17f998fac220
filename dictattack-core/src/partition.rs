use std::ops::Range;

/// Splits `len` items into at most `workers` contiguous ranges.
///
/// Every range but the last holds `max(1, len / workers)` items; the last one
/// absorbs the remainder. An empty input yields no ranges.
pub fn chunk_ranges(len: usize, workers: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }

    let workers = workers.max(1);
    let chunk_size = (len / workers).max(1);
    let chunk_count = workers.min(len);

    (0..chunk_count)
        .map(|i| {
            let start = i * chunk_size;
            let end = if i + 1 == chunk_count { len } else { start + chunk_size };
            start..end
        })
        .collect()
}
