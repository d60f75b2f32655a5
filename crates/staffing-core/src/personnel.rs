//! Worker records as read from the personnel module.
//!
//! The core never edits personnel data beyond seeding; it only needs identity,
//! birth date, sex, height and employment status to vet placements.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Sex as recorded on the worker's file.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Sex {
  Male,
  Female,
  Other,
}

/// Employment status; only `Active` workers may receive new assignments.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkerStatus {
  #[default]
  Active,
  Inactive,
  Suspended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
  pub worker_id:  Uuid,
  pub full_name:  String,
  pub birth_date: NaiveDate,
  pub sex:        Sex,
  /// Height in centimetres, when measured.
  pub height_cm:  Option<u16>,
  #[serde(default)]
  pub status:     WorkerStatus,
  /// Soft-delete marker; deleted workers are invisible to the engine.
  #[serde(default)]
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Worker {
  /// Completed years of age on `today`.
  pub fn age_on(&self, today: NaiveDate) -> u32 { age_on(self.birth_date, today) }

  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }

  /// Not deleted and in `Active` status.
  pub fn is_assignable(&self) -> bool {
    !self.is_deleted() && self.status == WorkerStatus::Active
  }
}

/// Whole years between `birth_date` and `today`; zero for future birth dates.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> u32 {
  let mut years = today.year() - birth_date.year();
  if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
    years -= 1;
  }
  years.max(0) as u32
}
