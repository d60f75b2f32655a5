//! Client projects and the staffing positions they require.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::personnel::Sex;

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
pub enum ProjectStatus {
  #[default]
  Planning,
  Active,
  Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
  pub project_id: Uuid,
  pub name:       String,
  #[serde(default)]
  pub status:     ProjectStatus,
}

impl Project {
  pub fn is_closed(&self) -> bool { self.status == ProjectStatus::Finished }
}

/// The sex a position asks for. `Either` admits male or female workers.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequiredSex {
  Male,
  Female,
  Either,
}

impl RequiredSex {
  /// Worker sexes that satisfy this requirement.
  pub fn admissible(self) -> &'static [Sex] {
    match self {
      Self::Male => &[Sex::Male],
      Self::Female => &[Sex::Female],
      Self::Either => &[Sex::Male, Sex::Female],
    }
  }

  pub fn admits(self, sex: Sex) -> bool { self.admissible().contains(&sex) }
}

/// A named staffing need on a project: headcount plus eligibility criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRequirement {
  pub position_id:   Uuid,
  pub project_id:    Uuid,
  pub name:          String,
  pub headcount:     u32,
  pub min_age:       u32,
  pub max_age:       u32,
  pub sex:           Option<RequiredSex>,
  pub min_height_cm: Option<u16>,
  pub shift_id:      Uuid,
  /// What the company pays the worker per shift.
  pub pay_rate:      Option<Decimal>,
  /// What the client is billed per shift.
  pub bill_rate:     Option<Decimal>,
  /// Inactive positions accept no new assignments.
  pub active:        bool,
}

impl PositionRequirement {
  /// `bill_rate - pay_rate`, when both are known.
  pub fn margin(&self) -> Option<Decimal> { Some(self.bill_rate? - self.pay_rate?) }

  /// Margin as a percentage of the bill rate, rounded to two places.
  pub fn margin_pct(&self) -> Option<Decimal> {
    let bill = self.bill_rate?;
    if bill.is_zero() {
      return None;
    }
    Some((self.margin()? / bill * Decimal::ONE_HUNDRED).round_dp(2))
  }
}
