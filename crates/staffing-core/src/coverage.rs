//! Staffing coverage of positions and the alerts derived from it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{assignment::Assignment, project::PositionRequirement};

/// Headcount versus assigned workers for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageStat {
  pub position_id:   Uuid,
  pub position_name: String,
  pub required:      u32,
  pub assigned:      u32,
  pub shortfall:     u32,
  pub pct_covered:   f64,
}

impl CoverageStat {
  pub fn new(position: &PositionRequirement, assigned: u32) -> Self {
    Self {
      position_id: position.position_id,
      position_name: position.name.clone(),
      required: position.headcount,
      assigned,
      shortfall: position.headcount.saturating_sub(assigned),
      pct_covered: pct(assigned, position.headcount),
    }
  }
}

/// `part / whole` as a percentage rounded to two places. A zero headcount is
/// fully covered.
fn pct(part: u32, whole: u32) -> f64 {
  if whole == 0 {
    return 100.0;
  }
  (f64::from(part) / f64::from(whole) * 10_000.0).round() / 100.0
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertType {
  NoCoverage,
  PartialCoverage,
  UpcomingExpiry,
  FullCoverage,
}

/// Ordered most to least urgent.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
  Critical,
  High,
  Medium,
  Low,
}

/// Classify a position by how many workers cover it and whether any of those
/// assignments is about to end.
pub fn classify(required: u32, assigned: u32, expiring: u32) -> (AlertType, Severity) {
  // A position nobody is required for is covered, even with nobody on it.
  if assigned >= required {
    let kind = if expiring > 0 { AlertType::UpcomingExpiry } else { AlertType::FullCoverage };
    return (kind, Severity::Low);
  }
  if assigned == 0 {
    return (AlertType::NoCoverage, Severity::Critical);
  }
  let severity = if u64::from(assigned) * 2 < u64::from(required) { Severity::High } else { Severity::Medium };
  (AlertType::PartialCoverage, severity)
}

/// Assignments among `covering` whose end date falls within
/// `[date, date + window_days]`.
pub fn expiring_within(covering: &[&Assignment], date: NaiveDate, window_days: u32) -> u32 {
  let horizon = date + chrono::Days::new(u64::from(window_days));
  covering
    .iter()
    .filter(|a| a.end_date.is_some_and(|end| end >= date && end <= horizon))
    .count() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageAlert {
  pub project_id:    Uuid,
  pub project_name:  String,
  pub position_id:   Uuid,
  pub position_name: String,
  pub required:      u32,
  pub assigned:      u32,
  pub shortfall:     u32,
  pub expiring:      u32,
  #[serde(rename = "type")]
  pub kind:          AlertType,
  pub severity:      Severity,
  pub message:       String,
}

impl CoverageAlert {
  pub fn message_for(kind: AlertType, position: &str, required: u32, assigned: u32, expiring: u32) -> String {
    match kind {
      AlertType::NoCoverage => format!("{position}: no workers assigned ({required} required)"),
      AlertType::PartialCoverage => format!("{position}: {assigned} of {required} workers assigned"),
      AlertType::UpcomingExpiry => format!("{position}: {expiring} assignment(s) ending soon"),
      AlertType::FullCoverage => format!("{position}: fully covered"),
    }
  }
}

/// Filters for [`crate::engine::CoverageAlerts::list_alerts`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertFilter {
  pub project_id: Option<Uuid>,
  /// Reference date; defaults to today.
  pub date:       Option<NaiveDate>,
  pub severity:   Option<Severity>,
  #[serde(rename = "type")]
  pub kind:       Option<AlertType>,
}

impl AlertFilter {
  pub fn accepts(&self, alert: &CoverageAlert) -> bool {
    self.severity.is_none_or(|s| s == alert.severity) && self.kind.is_none_or(|k| k == alert.kind)
  }
}
