//! Half-open interval algebra over UTC instants.
//!
//! `merge` coalesces overlapping or touching intervals into a sorted, disjoint
//! list. `subtract` removes blocked time from open time. Both are pure and
//! total; callers must only pass intervals with `start <= end`.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The UTC day of `date`: midnight to the next midnight.
    ///
    /// `None` when the next midnight is past the last representable instant.
    pub fn try_for_day(date: NaiveDate) -> Option<Self> {
        let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = start.checked_add_signed(Duration::days(1))?;
        Some(Self::new(start, end))
    }

    /// Like [`Interval::try_for_day`], but the last representable day ends
    /// at `DateTime::<Utc>::MAX_UTC` instead of failing.
    pub fn for_day(date: NaiveDate) -> Self {
        Self::try_for_day(date).unwrap_or_else(|| {
            Self::new(
                date.and_time(chrono::NaiveTime::MIN).and_utc(),
                DateTime::<Utc>::MAX_UTC,
            )
        })
    }

    /// True when the interval covers no time at all (or is inverted).
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Two intervals overlap iff `a.start < b.end && b.start < a.end`.
    /// Touching intervals do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Clip to `window`, returning `None` when nothing of positive length remains.
    pub fn clip(&self, window: &Interval) -> Option<Interval> {
        let clipped = Interval::new(self.start.max(window.start), self.end.min(window.end));
        (!clipped.is_empty()).then_some(clipped)
    }
}

/// Merge overlapping or adjacent intervals.
///
/// Returns a sorted, non-overlapping list; an interval starting exactly where
/// the running one ends is folded into it.
pub fn merge(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted = intervals.to_vec();
    // Sort by start time (then by end time for stability).
    sorted.sort_by_key(|iv| (iv.start, iv.end));

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for iv in sorted {
        if let Some(last) = merged.last_mut() {
            if iv.start <= last.end {
                last.end = last.end.max(iv.end);
                continue;
            }
        }
        merged.push(iv);
    }
    merged
}

/// Remove every blocked instant from `base`.
///
/// Blocks are merged first. Each base interval is clipped against the blocks
/// in turn: a covering block drops it, a block over either edge trims it and a
/// block strictly inside splits it in two. Output follows base order and never
/// contains empty intervals.
pub fn subtract(base: &[Interval], blocks: &[Interval]) -> Vec<Interval> {
    let blocks: Vec<Interval> = blocks.iter().copied().filter(|iv| !iv.is_empty()).collect();
    let blocks = merge(&blocks);
    let mut result = Vec::new();

    for b in base {
        let mut cursor = b.start;
        for block in &blocks {
            if block.end <= cursor {
                continue;
            }
            if block.start >= b.end {
                break;
            }
            if block.start > cursor {
                result.push(Interval::new(cursor, block.start));
            }
            cursor = cursor.max(block.end);
            if cursor >= b.end {
                break;
            }
        }
        if cursor < b.end {
            result.push(Interval::new(cursor, b.end));
        }
    }

    result
}

/// Clip every interval to `window`, dropping the ones that fall outside it.
pub fn clip_all(intervals: &[Interval], window: &Interval) -> Vec<Interval> {
    intervals.iter().filter_map(|iv| iv.clip(window)).collect()
}
