//! Shift catalog entries and the time arithmetic built on them: lateness
//! against the shift start, worked hours across midnight, and the work/rest
//! rotation for long shifts.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::range::DateRange;

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
  pub shift_id:               Uuid,
  pub name:                   String,
  pub start_time:             NaiveTime,
  pub end_time:               NaiveTime,
  pub duration_hours:         f64,
  /// Set for 12h/24h shifts that alternate work and rest days.
  pub requires_rest_rotation: bool,
}

impl Shift {
  /// The rotation this shift follows, if any.
  pub fn rest_pattern(&self) -> Option<RestPattern> {
    if !self.requires_rest_rotation {
      return None;
    }
    RestPattern::for_duration(self.duration_hours)
  }
}

// ─── Lateness ────────────────────────────────────────────────────────────────

/// Outcome of comparing an entry time with the shift start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lateness {
  pub late:    bool,
  pub minutes: u32,
}

impl Lateness {
  pub const ON_TIME: Lateness = Lateness { late: false, minutes: 0 };
}

/// Minutes from `shift_start` to `entry`, wrapped into `(-720, 720]` so an
/// entry just after midnight counts against a late-evening start.
fn signed_minutes_after(shift_start: NaiveTime, entry: NaiveTime) -> i64 {
  let mut diff = (entry - shift_start).num_minutes();
  if diff > MINUTES_PER_DAY / 2 {
    diff -= MINUTES_PER_DAY;
  } else if diff <= -MINUTES_PER_DAY / 2 {
    diff += MINUTES_PER_DAY;
  }
  diff
}

/// Lateness of `entry` against `shift_start`. Differences below
/// `tolerance_minutes` are absorbed and reported as on time.
pub fn lateness(entry: NaiveTime, shift_start: NaiveTime, tolerance_minutes: u32) -> Lateness {
  let minutes = signed_minutes_after(shift_start, entry).max(0) as u32;
  if minutes < tolerance_minutes {
    Lateness::ON_TIME
  } else {
    Lateness { late: true, minutes }
  }
}

/// Hours between entry and exit, wrapping past midnight when exit is earlier
/// than entry. Equal times count as a full day.
pub fn hours_between(entry: NaiveTime, exit: NaiveTime) -> f64 {
  let mut minutes = (exit - entry).num_minutes();
  if minutes <= 0 {
    minutes += MINUTES_PER_DAY;
  }
  (minutes as f64 / 60.0 * 100.0).round() / 100.0
}

// ─── Rest rotation ───────────────────────────────────────────────────────────

/// A repeating cycle of `work_days` followed by `rest_days`, anchored on the
/// assignment start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestPattern {
  pub work_days: u32,
  pub rest_days: u32,
}

impl RestPattern {
  /// 24h shifts work one day and rest one; 12h shifts work two and rest two.
  /// Shorter shifts do not rotate.
  pub fn for_duration(duration_hours: f64) -> Option<Self> {
    if duration_hours >= 24.0 {
      Some(Self { work_days: 1, rest_days: 1 })
    } else if duration_hours >= 12.0 {
      Some(Self { work_days: 2, rest_days: 2 })
    } else {
      None
    }
  }

  pub fn cycle_len(&self) -> u32 { self.work_days + self.rest_days }

  /// Whether `date` falls on a rest day of a rotation that started on
  /// `anchor`. Dates before the anchor are never rest days.
  pub fn is_rest_day(&self, anchor: NaiveDate, date: NaiveDate) -> bool {
    let offset = (date - anchor).num_days();
    if offset < 0 || self.cycle_len() == 0 {
      return false;
    }
    (offset % i64::from(self.cycle_len())) >= i64::from(self.work_days)
  }

  /// Rest days of an assignment running over `assignment` that fall inside
  /// `window`.
  pub fn rest_days_within(&self, assignment: DateRange, window: DateRange) -> Vec<NaiveDate> {
    let Some(span) = assignment.intersect(&window) else {
      return Vec::new();
    };
    span.days().filter(|day| self.is_rest_day(assignment.start, *day)).collect()
  }
}
