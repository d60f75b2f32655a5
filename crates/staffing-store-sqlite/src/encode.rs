//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` and times as `HH:MM:SS`, so lexical
//! comparison in SQL matches chronological order. Timestamps are RFC 3339.
//! Enums use their snake_case `strum` names. Money is a decimal string.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use rusqlite::Row;
use staffing_core::{
  assignment::Assignment,
  attendance::AttendanceRecord,
  personnel::Worker,
  project::{PositionRequirement, Project},
  shift::Shift,
};
use uuid::Uuid;

use crate::{Error, Result};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── Dates and times ─────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FMT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FMT).map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format(TIME_FMT).to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, TIME_FMT).map_err(|e| Error::Decode(format!("time {s:?}: {e}")))
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── Enums and decimals ──────────────────────────────────────────────────────

pub fn decode_enum<T: FromStr>(s: &str, what: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

pub fn encode_decimal(d: Decimal) -> String { d.to_string() }

fn decode_decimal(s: &str) -> Result<Decimal> {
  Decimal::from_str(s).map_err(|e| Error::Decode(format!("decimal {s:?}: {e}")))
}

pub fn encode_warnings(warnings: &[String]) -> Result<String> { Ok(serde_json::to_string(warnings)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const WORKER_COLUMNS: &str =
  "worker_id, full_name, birth_date, sex, height_cm, status, deleted_at";

/// Raw values read directly from a `workers` row.
pub struct RawWorker {
  pub worker_id:  String,
  pub full_name:  String,
  pub birth_date: String,
  pub sex:        String,
  pub height_cm:  Option<u16>,
  pub status:     String,
  pub deleted_at: Option<String>,
}

impl RawWorker {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      worker_id:  row.get(0)?,
      full_name:  row.get(1)?,
      birth_date: row.get(2)?,
      sex:        row.get(3)?,
      height_cm:  row.get(4)?,
      status:     row.get(5)?,
      deleted_at: row.get(6)?,
    })
  }

  pub fn into_worker(self) -> Result<Worker> {
    Ok(Worker {
      worker_id:  decode_uuid(&self.worker_id)?,
      full_name:  self.full_name,
      birth_date: decode_date(&self.birth_date)?,
      sex:        decode_enum(&self.sex, "sex")?,
      height_cm:  self.height_cm,
      status:     decode_enum(&self.status, "worker status")?,
      deleted_at: self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const PROJECT_COLUMNS: &str = "project_id, name, status";

pub struct RawProject {
  pub project_id: String,
  pub name:       String,
  pub status:     String,
}

impl RawProject {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { project_id: row.get(0)?, name: row.get(1)?, status: row.get(2)? })
  }

  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      project_id: decode_uuid(&self.project_id)?,
      name:       self.name,
      status:     decode_enum(&self.status, "project status")?,
    })
  }
}

pub const POSITION_COLUMNS: &str = "position_id, project_id, name, headcount, min_age, max_age, \
                                    sex, min_height_cm, shift_id, pay_rate, bill_rate, active";

pub struct RawPosition {
  pub position_id:   String,
  pub project_id:    String,
  pub name:          String,
  pub headcount:     u32,
  pub min_age:       u32,
  pub max_age:       u32,
  pub sex:           Option<String>,
  pub min_height_cm: Option<u16>,
  pub shift_id:      String,
  pub pay_rate:      Option<String>,
  pub bill_rate:     Option<String>,
  pub active:        bool,
}

impl RawPosition {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      position_id:   row.get(0)?,
      project_id:    row.get(1)?,
      name:          row.get(2)?,
      headcount:     row.get(3)?,
      min_age:       row.get(4)?,
      max_age:       row.get(5)?,
      sex:           row.get(6)?,
      min_height_cm: row.get(7)?,
      shift_id:      row.get(8)?,
      pay_rate:      row.get(9)?,
      bill_rate:     row.get(10)?,
      active:        row.get(11)?,
    })
  }

  pub fn into_position(self) -> Result<PositionRequirement> {
    Ok(PositionRequirement {
      position_id:   decode_uuid(&self.position_id)?,
      project_id:    decode_uuid(&self.project_id)?,
      name:          self.name,
      headcount:     self.headcount,
      min_age:       self.min_age,
      max_age:       self.max_age,
      sex:           self.sex.as_deref().map(|s| decode_enum(s, "required sex")).transpose()?,
      min_height_cm: self.min_height_cm,
      shift_id:      decode_uuid(&self.shift_id)?,
      pay_rate:      self.pay_rate.as_deref().map(decode_decimal).transpose()?,
      bill_rate:     self.bill_rate.as_deref().map(decode_decimal).transpose()?,
      active:        self.active,
    })
  }
}

pub const SHIFT_COLUMNS: &str =
  "shift_id, name, start_time, end_time, duration_hours, requires_rest_rotation";

pub struct RawShift {
  pub shift_id:               String,
  pub name:                   String,
  pub start_time:             String,
  pub end_time:               String,
  pub duration_hours:         f64,
  pub requires_rest_rotation: bool,
}

impl RawShift {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      shift_id:               row.get(0)?,
      name:                   row.get(1)?,
      start_time:             row.get(2)?,
      end_time:               row.get(3)?,
      duration_hours:         row.get(4)?,
      requires_rest_rotation: row.get(5)?,
    })
  }

  pub fn into_shift(self) -> Result<Shift> {
    Ok(Shift {
      shift_id:               decode_uuid(&self.shift_id)?,
      name:                   self.name,
      start_time:             decode_time(&self.start_time)?,
      end_time:               decode_time(&self.end_time)?,
      duration_hours:         self.duration_hours,
      requires_rest_rotation: self.requires_rest_rotation,
    })
  }
}

pub const ASSIGNMENT_COLUMNS: &str = "assignment_id, worker_id, project_id, position_id, shift_id, \
                                      start_date, end_date, status, suspension_reason, notes, \
                                      warnings, created_at, updated_at";

pub struct RawAssignment {
  pub assignment_id:     String,
  pub worker_id:         String,
  pub project_id:        Option<String>,
  pub position_id:       Option<String>,
  pub shift_id:          String,
  pub start_date:        String,
  pub end_date:          Option<String>,
  pub status:            String,
  pub suspension_reason: Option<String>,
  pub notes:             Option<String>,
  pub warnings:          String,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawAssignment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assignment_id:     row.get(0)?,
      worker_id:         row.get(1)?,
      project_id:        row.get(2)?,
      position_id:       row.get(3)?,
      shift_id:          row.get(4)?,
      start_date:        row.get(5)?,
      end_date:          row.get(6)?,
      status:            row.get(7)?,
      suspension_reason: row.get(8)?,
      notes:             row.get(9)?,
      warnings:          row.get(10)?,
      created_at:        row.get(11)?,
      updated_at:        row.get(12)?,
    })
  }

  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      assignment_id:     decode_uuid(&self.assignment_id)?,
      worker_id:         decode_uuid(&self.worker_id)?,
      project_id:        decode_opt_uuid(self.project_id)?,
      position_id:       decode_opt_uuid(self.position_id)?,
      shift_id:          decode_uuid(&self.shift_id)?,
      start_date:        decode_date(&self.start_date)?,
      end_date:          self.end_date.as_deref().map(decode_date).transpose()?,
      status:            decode_enum(&self.status, "assignment status")?,
      suspension_reason: self.suspension_reason,
      notes:             self.notes,
      warnings:          serde_json::from_str(&self.warnings)?,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

pub const ATTENDANCE_COLUMNS: &str = "attendance_id, assignment_id, attendance_date, entry_time, \
                                      exit_time, is_rest_day, was_replaced, \
                                      replacement_worker_id, replacement_reason, is_late, \
                                      minutes_late, notes, recorded_by, recorded_at";

pub struct RawAttendance {
  pub attendance_id:         String,
  pub assignment_id:         String,
  pub attendance_date:       String,
  pub entry_time:            Option<String>,
  pub exit_time:             Option<String>,
  pub is_rest_day:           bool,
  pub was_replaced:          bool,
  pub replacement_worker_id: Option<String>,
  pub replacement_reason:    Option<String>,
  pub is_late:               bool,
  pub minutes_late:          u32,
  pub notes:                 Option<String>,
  pub recorded_by:           Option<String>,
  pub recorded_at:           String,
}

impl RawAttendance {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attendance_id:         row.get(0)?,
      assignment_id:         row.get(1)?,
      attendance_date:       row.get(2)?,
      entry_time:            row.get(3)?,
      exit_time:             row.get(4)?,
      is_rest_day:           row.get(5)?,
      was_replaced:          row.get(6)?,
      replacement_worker_id: row.get(7)?,
      replacement_reason:    row.get(8)?,
      is_late:               row.get(9)?,
      minutes_late:          row.get(10)?,
      notes:                 row.get(11)?,
      recorded_by:           row.get(12)?,
      recorded_at:           row.get(13)?,
    })
  }

  pub fn into_record(self) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
      attendance_id:         decode_uuid(&self.attendance_id)?,
      assignment_id:         decode_uuid(&self.assignment_id)?,
      date:                  decode_date(&self.attendance_date)?,
      entry_time:            self.entry_time.as_deref().map(decode_time).transpose()?,
      exit_time:             self.exit_time.as_deref().map(decode_time).transpose()?,
      is_rest_day:           self.is_rest_day,
      was_replaced:          self.was_replaced,
      replacement_worker_id: decode_opt_uuid(self.replacement_worker_id)?,
      replacement_reason:    self.replacement_reason,
      is_late:               self.is_late,
      minutes_late:          self.minutes_late,
      notes:                 self.notes,
      recorded_by:           decode_opt_uuid(self.recorded_by)?,
      recorded_at:           decode_dt(&self.recorded_at)?,
    })
  }
}
