//! Date-range arithmetic over open-ended ranges.
//!
//! Every scheduling comparison in the workspace goes through [`overlaps`]; an
//! absent end date means the range extends forward without bound.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// `true` iff `[start_a, end_a]` and `[start_b, end_b]` share at least one day.
///
/// Both ranges are inclusive. `None` as an end means "unbounded forward".
pub fn overlaps(
  start_a: NaiveDate,
  end_a: Option<NaiveDate>,
  start_b: NaiveDate,
  end_b: Option<NaiveDate>,
) -> bool {
  end_b.is_none_or(|end_b| start_a <= end_b) && end_a.is_none_or(|end_a| start_b <= end_a)
}

/// An inclusive calendar range with an optional end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
  pub start: NaiveDate,
  pub end:   Option<NaiveDate>,
}

impl DateRange {
  pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self { Self { start, end } }

  /// A closed range covering exactly one day.
  pub fn day(date: NaiveDate) -> Self { Self { start: date, end: Some(date) } }

  /// `false` when the end precedes the start.
  pub fn is_valid(&self) -> bool { self.end.is_none_or(|end| end >= self.start) }

  pub fn overlaps(&self, other: &DateRange) -> bool {
    overlaps(self.start, self.end, other.start, other.end)
  }

  pub fn contains(&self, date: NaiveDate) -> bool { self.overlaps(&DateRange::day(date)) }

  /// The shared part of two ranges, or `None` when they are disjoint.
  pub fn intersect(&self, other: &DateRange) -> Option<DateRange> {
    if !self.overlaps(other) {
      return None;
    }
    let start = self.start.max(other.start);
    let end = match (self.end, other.end) {
      (Some(a), Some(b)) => Some(a.min(b)),
      (Some(a), None) | (None, Some(a)) => Some(a),
      (None, None) => None,
    };
    Some(DateRange { start, end })
  }

  /// Number of days in a bounded range; `None` for open-ended ranges.
  pub fn len_days(&self) -> Option<u64> {
    self.end.map(|end| ((end - self.start).num_days() + 1).max(0) as u64)
  }

  /// Iterate each day of a bounded range. Open-ended ranges yield nothing;
  /// clip them with [`DateRange::intersect`] first.
  pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
    let start = self.start;
    let count = self.len_days().unwrap_or(0);
    (0..count).filter_map(move |offset| start.checked_add_days(Days::new(offset)))
  }
}

impl std::fmt::Display for DateRange {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self.end {
      Some(end) => write!(f, "{}..{}", self.start, end),
      None => write!(f, "{}..", self.start),
    }
  }
}
