//! Bounds applied while decoding untrusted lengths.

use std::ops::{Bound, Range, RangeBounds, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive};

/// Allowed range of a decoded length.
///
/// Constructed from any standard range over `usize` (`0..8`, `1..=4096`, `..=32`, `..`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeCfg {
    start: Bound<usize>,
    end: Bound<usize>,
}

impl RangeCfg {
    /// Returns whether `value` lies within the range.
    pub fn contains(&self, value: &usize) -> bool {
        (self.start, self.end).contains(value)
    }
}

impl RangeBounds<usize> for RangeCfg {
    fn start_bound(&self) -> Bound<&usize> {
        self.start.as_ref()
    }

    fn end_bound(&self) -> Bound<&usize> {
        self.end.as_ref()
    }
}

macro_rules! impl_from_range {
    ($range:ty) => {
        impl From<$range> for RangeCfg {
            fn from(range: $range) -> Self {
                Self {
                    start: range.start_bound().cloned(),
                    end: range.end_bound().cloned(),
                }
            }
        }
    };
}

impl_from_range!(Range<usize>);
impl_from_range!(RangeInclusive<usize>);
impl_from_range!(RangeFrom<usize>);
impl_from_range!(RangeTo<usize>);
impl_from_range!(RangeToInclusive<usize>);
impl_from_range!(RangeFull);
