//! Day-by-day availability of a worker.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, assignment::Assignment, range::DateRange};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
  pub available:     bool,
  pub assignment_id: Option<Uuid>,
  pub project_id:    Option<Uuid>,
}

pub type Calendar = BTreeMap<NaiveDate, CalendarDay>;

/// A closed range no longer than `max_days`.
pub fn bounded_range(start: NaiveDate, end: NaiveDate, max_days: u32) -> Result<DateRange> {
  let range = DateRange::new(start, Some(end));
  if !range.is_valid() {
    return Err(Error::InvalidRange(range));
  }
  let days = range.len_days().unwrap_or(0);
  if days > u64::from(max_days) {
    return Err(Error::RangeTooLong { days, max: max_days });
  }
  Ok(range)
}

/// Walk each day of `range`, marking days covered by an active assignment.
pub fn build_calendar(range: DateRange, assignments: &[Assignment]) -> Calendar {
  range
    .days()
    .map(|day| {
      let covering = assignments.iter().find(|a| a.is_active() && a.range().contains(day));
      let entry = CalendarDay {
        available:     covering.is_none(),
        assignment_id: covering.map(|a| a.assignment_id),
        project_id:    covering.and_then(|a| a.project_id),
      };
      (day, entry)
    })
    .collect()
}
