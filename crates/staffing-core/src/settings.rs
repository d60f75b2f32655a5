//! Engine tunables and the source of "today".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tunables read from the `[engine]` table of the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
  /// Entries this many minutes or more after the shift start are late.
  pub late_tolerance_minutes: u32,
  /// Assignments ending within this many days raise an expiry alert.
  pub expiry_window_days:     u32,
  /// Longest range a calendar query may cover.
  pub max_calendar_days:      u32,
}

impl Default for EngineSettings {
  fn default() -> Self {
    Self { late_tolerance_minutes: 5, expiry_window_days: 7, max_calendar_days: 90 }
  }
}

/// Where the engine gets the current date from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
  /// The local calendar date of the host.
  #[default]
  System,
  /// A pinned date, for batch re-runs and tests.
  Fixed(NaiveDate),
}

impl Clock {
  pub fn today(&self) -> NaiveDate {
    match self {
      Self::System => chrono::Local::now().date_naive(),
      Self::Fixed(date) => *date,
    }
  }
}
