//! Fit-for-duty checks of a worker against a position requirement.
//!
//! [`matches`] evaluates every rule and collects all violations.
//! [`CandidateFilter`] expresses the same rules as bounds a storage backend can
//! push into a query; the two must always agree.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
  personnel::{Sex, Worker},
  project::{PositionRequirement, RequiredSex},
};

/// One unmet requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Violation {
  AgeBelowMinimum { age: u32, min: u32 },
  AgeAboveMaximum { age: u32, max: u32 },
  SexMismatch { required: RequiredSex, actual: Sex },
  HeightMissing { min_cm: u16 },
  HeightBelowMinimum { height_cm: u16, min_cm: u16 },
}

impl std::fmt::Display for Violation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::AgeBelowMinimum { age, min } => write!(f, "age {age} is below the minimum of {min}"),
      Self::AgeAboveMaximum { age, max } => write!(f, "age {age} is above the maximum of {max}"),
      Self::SexMismatch { required: RequiredSex::Either, actual } => {
        write!(f, "position requires male or female, worker is {actual}")
      }
      Self::SexMismatch { required, actual } => {
        write!(f, "position requires {required}, worker is {actual}")
      }
      Self::HeightMissing { min_cm } => {
        write!(f, "position requires at least {min_cm} cm but no height is recorded")
      }
      Self::HeightBelowMinimum { height_cm, min_cm } => {
        write!(f, "height {height_cm} cm is below the minimum of {min_cm} cm")
      }
    }
  }
}

/// The worker attributes a [`MatchReport`] was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDetails {
  pub age:       u32,
  pub sex:       Sex,
  pub height_cm: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
  pub ok:         bool,
  pub violations: Vec<Violation>,
  pub details:    MatchDetails,
}

impl MatchReport {
  /// The report for a placement with no position, so nothing to violate.
  pub fn unconstrained(worker: &Worker, today: NaiveDate) -> Self {
    Self {
      ok:         true,
      violations: Vec::new(),
      details:    MatchDetails { age: worker.age_on(today), sex: worker.sex, height_cm: worker.height_cm },
    }
  }
}

/// Evaluate `worker` against `position` as of `today`.
pub fn matches(worker: &Worker, position: &PositionRequirement, today: NaiveDate) -> MatchReport {
  let age = worker.age_on(today);
  let mut violations = Vec::new();

  if age < position.min_age {
    violations.push(Violation::AgeBelowMinimum { age, min: position.min_age });
  }
  if age > position.max_age {
    violations.push(Violation::AgeAboveMaximum { age, max: position.max_age });
  }

  if let Some(required) = position.sex
    && !required.admits(worker.sex)
  {
    violations.push(Violation::SexMismatch { required, actual: worker.sex });
  }

  if let Some(min_cm) = position.min_height_cm {
    match worker.height_cm {
      None => violations.push(Violation::HeightMissing { min_cm }),
      Some(height_cm) if height_cm < min_cm => {
        violations.push(Violation::HeightBelowMinimum { height_cm, min_cm })
      }
      Some(_) => {}
    }
  }

  MatchReport {
    ok: violations.is_empty(),
    violations,
    details: MatchDetails { age, sex: worker.sex, height_cm: worker.height_cm },
  }
}

// ─── Pre-filter ──────────────────────────────────────────────────────────────

/// Position requirements expressed as column bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFilter {
  /// Birth dates must be strictly after this day (too old otherwise).
  pub born_after:        Option<NaiveDate>,
  /// Birth dates must be on or before this day (too young otherwise).
  pub born_on_or_before: Option<NaiveDate>,
  /// Admissible sexes; `None` means any.
  pub sexes:             Option<&'static [Sex]>,
  pub min_height_cm:     Option<u16>,
}

impl CandidateFilter {
  pub fn for_position(position: &PositionRequirement, today: NaiveDate) -> Self {
    Self {
      born_after:        years_before(today, position.max_age.saturating_add(1)),
      born_on_or_before: years_before(today, position.min_age),
      sexes:             position.sex.map(RequiredSex::admissible),
      min_height_cm:     position.min_height_cm,
    }
  }

  /// In-memory evaluation of the filter; agrees with [`matches`].
  pub fn admits(&self, worker: &Worker) -> bool {
    self.born_after.is_none_or(|bound| worker.birth_date > bound)
      && self.born_on_or_before.is_none_or(|bound| worker.birth_date <= bound)
      && self.sexes.is_none_or(|sexes| sexes.contains(&worker.sex))
      && self
        .min_height_cm
        .is_none_or(|min| worker.height_cm.is_some_and(|h| h >= min))
  }
}

/// The date `years` years before `today`, using the same month/day comparison
/// as [`crate::personnel::age_on`]. `None` when the result predates chrono's range.
fn years_before(today: NaiveDate, years: u32) -> Option<NaiveDate> {
  // A Feb 29 birthday reaches a new age on Mar 1 in common years, so a
  // Feb 29 anchor clamps to Feb 28 rather than rolling forward.
  today.checked_sub_months(Months::new(years.checked_mul(12)?))
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;
  use uuid::Uuid;

  use super::*;
  use crate::personnel::WorkerStatus;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

  fn worker(birth: NaiveDate, sex: Sex, height_cm: Option<u16>) -> Worker {
    Worker {
      worker_id: Uuid::new_v4(),
      full_name: "Test Worker".into(),
      birth_date: birth,
      sex,
      height_cm,
      status: WorkerStatus::Active,
      deleted_at: None,
    }
  }

  fn position(min_age: u32, max_age: u32, sex: Option<RequiredSex>, min_height_cm: Option<u16>) -> PositionRequirement {
    PositionRequirement {
      position_id: Uuid::new_v4(),
      project_id: Uuid::new_v4(),
      name: "Guard".into(),
      headcount: 1,
      min_age,
      max_age,
      sex,
      min_height_cm,
      shift_id: Uuid::new_v4(),
      pay_rate: None,
      bill_rate: None,
      active: true,
    }
  }

  const TODAY: (i32, u32, u32) = (2025, 6, 1);

  fn today() -> NaiveDate { d(TODAY.0, TODAY.1, TODAY.2) }

  #[test]
  fn either_accepts_male_and_female() {
    let pos = position(18, 30, Some(RequiredSex::Either), None);
    for sex in [Sex::Male, Sex::Female] {
      let report = matches(&worker(d(2000, 1, 1), sex, None), &pos, today());
      assert!(report.ok, "{sex} should match");
      assert_eq!(report.details.age, 25);
    }
  }

  #[test]
  fn either_rejects_other() {
    let pos = position(18, 30, Some(RequiredSex::Either), None);
    let report = matches(&worker(d(2000, 1, 1), Sex::Other, None), &pos, today());
    assert!(!report.ok);
    assert_eq!(report.violations, vec![Violation::SexMismatch {
      required: RequiredSex::Either,
      actual:   Sex::Other,
    }]);
  }

  #[test]
  fn all_violations_are_collected() {
    let pos = position(18, 30, Some(RequiredSex::Female), Some(170));
    let report = matches(&worker(d(1980, 1, 1), Sex::Male, None), &pos, today());
    assert!(!report.ok);
    assert_eq!(report.violations, vec![
      Violation::AgeAboveMaximum { age: 45, max: 30 },
      Violation::SexMismatch { required: RequiredSex::Female, actual: Sex::Male },
      Violation::HeightMissing { min_cm: 170 },
    ]);
  }

  #[test]
  fn height_at_minimum_passes() {
    let pos = position(18, 60, None, Some(170));
    assert!(matches(&worker(d(1990, 1, 1), Sex::Male, Some(170)), &pos, today()).ok);
    let short = matches(&worker(d(1990, 1, 1), Sex::Male, Some(165)), &pos, today());
    assert_eq!(short.violations, vec![Violation::HeightBelowMinimum {
      height_cm: 165,
      min_cm:    170,
    }]);
  }

  #[test]
  fn too_young_is_reported() {
    let pos = position(18, 60, None, None);
    let report = matches(&worker(d(2010, 1, 1), Sex::Female, None), &pos, today());
    assert_eq!(report.violations, vec![Violation::AgeBelowMinimum { age: 15, min: 18 }]);
  }

  #[test]
  fn violation_messages_are_readable() {
    let v = Violation::SexMismatch { required: RequiredSex::Either, actual: Sex::Other };
    assert_eq!(v.to_string(), "position requires male or female, worker is other");
  }

  fn arb_sex() -> impl Strategy<Value = Sex> {
    prop_oneof![Just(Sex::Male), Just(Sex::Female), Just(Sex::Other)]
  }

  fn arb_required_sex() -> impl Strategy<Value = Option<RequiredSex>> {
    prop_oneof![
      Just(None),
      Just(Some(RequiredSex::Male)),
      Just(Some(RequiredSex::Female)),
      Just(Some(RequiredSex::Either)),
    ]
  }

  proptest! {
    #[test]
    fn prefilter_agrees_with_matcher(
      birth_offset in 0i64..(80 * 366),
      today_offset in 0i64..(4 * 366),
      sex in arb_sex(),
      height in proptest::option::of(140u16..210),
      min_age in 16u32..40,
      span in 0u32..30,
      required_sex in arb_required_sex(),
      min_height in proptest::option::of(150u16..190),
    ) {
      let today = d(2023, 1, 1) + chrono::Duration::days(today_offset);
      let birth = d(1945, 1, 1) + chrono::Duration::days(birth_offset);
      let w = worker(birth, sex, height);
      let pos = position(min_age, min_age + span, required_sex, min_height);

      let filter = CandidateFilter::for_position(&pos, today);
      prop_assert_eq!(filter.admits(&w), matches(&w, &pos, today).ok);
    }
  }

  #[test]
  fn prefilter_agrees_on_leap_day_birthdays() {
    let pos = position(21, 40, None, None);
    for today in [d(2025, 2, 28), d(2025, 3, 1), d(2024, 2, 28), d(2024, 2, 29), d(2024, 3, 1)] {
      for birth in [d(2004, 2, 29), d(2003, 2, 28), d(2003, 3, 1), d(2004, 3, 1)] {
        let w = worker(birth, Sex::Male, None);
        assert_eq!(
          CandidateFilter::for_position(&pos, today).admits(&w),
          matches(&w, &pos, today).ok,
          "today={today} birth={birth}"
        );
      }
    }
  }
}
