//! Daily attendance against an assignment.
//!
//! [`normalize`] is the validation pipeline every write passes through, from
//! single records to bulk batches; availability of a replacement worker is
//! the only check that needs storage and is left to the engine.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uuid::Uuid;

use crate::{
  Error, Result,
  assignment::Assignment,
  shift::{Lateness, hours_between, lateness},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub attendance_id:         Uuid,
  pub assignment_id:         Uuid,
  pub date:                  NaiveDate,
  pub entry_time:            Option<NaiveTime>,
  pub exit_time:             Option<NaiveTime>,
  pub is_rest_day:           bool,
  pub was_replaced:          bool,
  pub replacement_worker_id: Option<Uuid>,
  pub replacement_reason:    Option<String>,
  pub is_late:               bool,
  pub minutes_late:          u32,
  pub notes:                 Option<String>,
  pub recorded_by:           Option<Uuid>,
  pub recorded_at:           DateTime<Utc>,
}

/// How a day is classified for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DayStatus {
  Rest,
  Replaced,
  Absent,
  Late,
  Present,
}

impl AttendanceRecord {
  /// Hours between entry and exit, or zero while either is missing.
  pub fn hours_worked(&self) -> f64 {
    match (self.entry_time, self.exit_time) {
      (Some(entry), Some(exit)) => hours_between(entry, exit),
      _ => 0.0,
    }
  }

  pub fn day_status(&self) -> DayStatus {
    if self.is_rest_day {
      DayStatus::Rest
    } else if self.was_replaced {
      DayStatus::Replaced
    } else if self.entry_time.is_none() {
      DayStatus::Absent
    } else if self.is_late {
      DayStatus::Late
    } else {
      DayStatus::Present
    }
  }

  /// The caller-supplied fields of this record, for partial updates.
  pub fn to_input(&self) -> AttendanceInput {
    AttendanceInput {
      entry_time:            self.entry_time,
      exit_time:             self.exit_time,
      is_rest_day:           self.is_rest_day,
      was_replaced:          self.was_replaced,
      replacement_worker_id: self.replacement_worker_id,
      replacement_reason:    self.replacement_reason.clone(),
      notes:                 self.notes.clone(),
    }
  }
}

/// Caller-supplied attendance fields. Lateness is always derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceInput {
  pub entry_time:            Option<NaiveTime>,
  pub exit_time:             Option<NaiveTime>,
  #[serde(default)]
  pub is_rest_day:           bool,
  #[serde(default)]
  pub was_replaced:          bool,
  pub replacement_worker_id: Option<Uuid>,
  pub replacement_reason:    Option<String>,
  pub notes:                 Option<String>,
}

impl AttendanceInput {
  pub fn rest_day() -> Self { Self { is_rest_day: true, ..Self::default() } }

  pub fn present(entry: NaiveTime, exit: Option<NaiveTime>) -> Self {
    Self { entry_time: Some(entry), exit_time: exit, ..Self::default() }
  }
}

/// Attendance fields after validation, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAttendance {
  pub entry_time:            Option<NaiveTime>,
  pub exit_time:             Option<NaiveTime>,
  pub is_rest_day:           bool,
  pub was_replaced:          bool,
  pub replacement_worker_id: Option<Uuid>,
  pub replacement_reason:    Option<String>,
  pub lateness:              Lateness,
  pub notes:                 Option<String>,
}

/// The date must fall inside the assignment's range.
pub fn check_in_range(assignment: &Assignment, date: NaiveDate) -> Result<()> {
  let range = assignment.range();
  if range.contains(date) { Ok(()) } else { Err(Error::OutOfRange { date, range }) }
}

/// Rest-day nulling, entry/exit ordering, lateness against `shift_start` and
/// replacement completeness, in that order.
pub fn normalize(input: AttendanceInput, shift_start: NaiveTime, tolerance_minutes: u32) -> Result<NormalizedAttendance> {
  let AttendanceInput {
    mut entry_time,
    mut exit_time,
    is_rest_day,
    was_replaced,
    replacement_worker_id,
    replacement_reason,
    notes,
  } = input;

  if is_rest_day {
    entry_time = None;
    exit_time = None;
  }

  if exit_time.is_some() && entry_time.is_none() {
    return Err(Error::MissingEntry);
  }

  let late = match entry_time {
    Some(entry) if !is_rest_day => lateness(entry, shift_start, tolerance_minutes),
    _ => Lateness::ON_TIME,
  };

  let (replacement_worker_id, replacement_reason) = if was_replaced {
    let reason = replacement_reason.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty());
    match (replacement_worker_id, reason) {
      (Some(worker), Some(reason)) => (Some(worker), Some(reason)),
      _ => return Err(Error::ReplacementIncomplete),
    }
  } else {
    (None, None)
  };

  Ok(NormalizedAttendance {
    entry_time,
    exit_time,
    is_rest_day,
    was_replaced,
    replacement_worker_id,
    replacement_reason,
    lateness: late,
    notes,
  })
}

// ─── Batches ─────────────────────────────────────────────────────────────────

/// One element of a bulk submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkEntry {
  pub assignment_id: Uuid,
  pub date:          NaiveDate,
  #[serde(flatten)]
  pub input:         AttendanceInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFailure {
  /// Position of the entry in the submitted batch.
  pub index:  usize,
  pub reason: String,
}

/// Result of a bulk submission: either every entry succeeded, or nothing was
/// written and `failed` lists every rejected entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkOutcome {
  pub succeeded: Vec<AttendanceRecord>,
  pub failed:    Vec<BulkFailure>,
}

impl BulkOutcome {
  pub fn is_committed(&self) -> bool { self.failed.is_empty() }
}

/// A rest day inserted by the rotation generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedRestDay {
  pub assignment_id: Uuid,
  pub date:          NaiveDate,
}

// ─── History ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
  pub total_days:         u32,
  pub days_worked:        u32,
  pub days_rest:          u32,
  pub days_absent:        u32,
  pub days_late:          u32,
  pub minutes_late_total: u32,
  pub hours_total:        f64,
  /// Worked days over non-rest days, as a percentage in `[0, 100]`.
  pub attendance_pct:     f64,
}

impl AttendanceSummary {
  pub fn from_records(records: &[AttendanceRecord]) -> Self {
    let total_days = records.len() as u32;
    let days_rest = records.iter().filter(|r| r.is_rest_day).count() as u32;
    let days_worked = records.iter().filter(|r| !r.is_rest_day && r.entry_time.is_some()).count() as u32;
    let days_late = records.iter().filter(|r| r.is_late).count() as u32;
    let minutes_late_total = records.iter().map(|r| r.minutes_late).sum();
    let hours_total = records.iter().map(AttendanceRecord::hours_worked).sum::<f64>();

    let scheduled = total_days - days_rest;
    let attendance_pct = if scheduled == 0 {
      0.0
    } else {
      (f64::from(days_worked) / f64::from(scheduled) * 10_000.0).round() / 100.0
    };

    Self {
      total_days,
      days_worked,
      days_rest,
      days_absent: total_days - days_worked - days_rest,
      days_late,
      minutes_late_total,
      hours_total: (hours_total * 100.0).round() / 100.0,
      attendance_pct,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHistory {
  pub worker_id: Uuid,
  pub start:     NaiveDate,
  pub end:       NaiveDate,
  pub summary:   AttendanceSummary,
  pub records:   Vec<AttendanceRecord>,
}
