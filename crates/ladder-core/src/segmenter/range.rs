//! Byte ranges for a split transfer.

/// Half-open byte range `[start, end)` of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: u64,
    pub end: u64,
}

impl Segment {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// `CURLOPT_RANGE` form: inclusive end, no `bytes=` prefix.
    pub fn curl_range(&self) -> String {
        format!("{}-{}", self.start, self.end.saturating_sub(1))
    }
}

/// Split `total` bytes into at most `count` contiguous, non-empty ranges.
///
/// Earlier ranges take the remainder, so lengths differ by at most one byte.
/// Fewer ranges than `count` come back when `total < count`.
pub fn plan_segments(total: u64, count: usize) -> Vec<Segment> {
    let count = (count as u64).min(total);
    if count == 0 {
        return Vec::new();
    }
    let base = total / count;
    let extra = total % count;
    let mut start = 0;
    (0..count)
        .map(|i| {
            let len = if i < extra { base + 1 } else { base };
            let segment = Segment {
                start,
                end: start + len,
            };
            start = segment.end;
            segment
        })
        .collect()
}
