//! Assignments: a worker's placement on a project/position for a date range.
//!
//! This module holds the rules every placement passes through: eligibility,
//! project/position linkage, double-booking and capacity. Storage backends
//! gather the rows and call these functions inside their write transaction,
//! so there is exactly one implementation of each rule.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  matcher::Violation,
  personnel::Worker,
  project::{PositionRequirement, Project},
  range::DateRange,
};

// ─── Status ──────────────────────────────────────────────────────────────────

/// `Active ⇄ Suspended`, `Active → Finished`. `Finished` is terminal.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentStatus {
  Active,
  Finished,
  Suspended,
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id:     Uuid,
  pub worker_id:         Uuid,
  /// `None` places the worker in the general pool.
  pub project_id:        Option<Uuid>,
  pub position_id:       Option<Uuid>,
  pub shift_id:          Uuid,
  pub start_date:        NaiveDate,
  /// `None` means open ended.
  pub end_date:          Option<NaiveDate>,
  pub status:            AssignmentStatus,
  pub suspension_reason: Option<String>,
  pub notes:             Option<String>,
  /// Requirement violations accepted through the override path.
  pub warnings:          Vec<String>,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

impl Assignment {
  pub fn range(&self) -> DateRange { DateRange::new(self.start_date, self.end_date) }

  pub fn is_active(&self) -> bool { self.status == AssignmentStatus::Active }

  /// Close the assignment. The end date is kept when present, otherwise it
  /// becomes `today` (never earlier than the start).
  pub fn finish(&mut self, today: NaiveDate, reason: Option<&str>, now: DateTime<Utc>) -> Result<()> {
    self.require(AssignmentStatus::Active, "finish")?;
    let end = self.end_date.unwrap_or_else(|| today.max(self.start_date));
    self.end_date = Some(end);
    self.status = AssignmentStatus::Finished;
    let line = match reason.map(str::trim).filter(|r| !r.is_empty()) {
      Some(reason) => format!("Finished on {today}: {reason}"),
      None => format!("Finished on {today}"),
    };
    self.notes = Some(append_note(self.notes.take(), &line));
    self.updated_at = now;
    Ok(())
  }

  pub fn suspend(&mut self, reason: &str, now: DateTime<Utc>) -> Result<()> {
    self.require(AssignmentStatus::Active, "suspend")?;
    let reason = reason.trim();
    if reason.is_empty() {
      return Err(Error::ReasonRequired);
    }
    self.status = AssignmentStatus::Suspended;
    self.suspension_reason = Some(reason.to_owned());
    self.updated_at = now;
    Ok(())
  }

  /// Return to `Active`. The caller must re-check conflicts over
  /// [`Assignment::remaining_range`] before persisting.
  pub fn reactivate(&mut self, now: DateTime<Utc>) -> Result<()> {
    self.require(AssignmentStatus::Suspended, "reactivate")?;
    self.status = AssignmentStatus::Active;
    self.suspension_reason = None;
    self.updated_at = now;
    Ok(())
  }

  /// The part of the assignment from `today` onwards, or `None` if it has
  /// already ended.
  pub fn remaining_range(&self, today: NaiveDate) -> Option<DateRange> {
    let range = DateRange::new(self.start_date.max(today), self.end_date);
    range.is_valid().then_some(range)
  }

  fn require(&self, expected: AssignmentStatus, action: &'static str) -> Result<()> {
    if self.status == expected {
      Ok(())
    } else {
      Err(Error::InvalidTransition { assignment_id: self.assignment_id, from: self.status, action })
    }
  }
}

/// Input to [`crate::engine::AssignmentEngine::create`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignment {
  pub worker_id:   Uuid,
  pub project_id:  Option<Uuid>,
  pub position_id: Option<Uuid>,
  pub shift_id:    Uuid,
  pub start_date:  NaiveDate,
  pub end_date:    Option<NaiveDate>,
  pub notes:       Option<String>,
}

impl NewAssignment {
  pub fn range(&self) -> DateRange { DateRange::new(self.start_date, self.end_date) }
}

/// A requested lifecycle move carried by an [`AssignmentPatch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "to", rename_all = "snake_case")]
pub enum StatusChange {
  Finished { reason: Option<String> },
  Suspended { reason: String },
  Active,
}

/// Partial update. `end_date: Some(None)` clears the end date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentPatch {
  pub start_date: Option<NaiveDate>,
  #[serde(default, with = "double_option")]
  pub end_date:   Option<Option<NaiveDate>>,
  pub shift_id:   Option<Uuid>,
  pub notes:      Option<String>,
  pub status:     Option<StatusChange>,
}

impl AssignmentPatch {
  pub fn changes_dates(&self) -> bool { self.start_date.is_some() || self.end_date.is_some() }
}

/// Query parameters for [`crate::engine::AssignmentEngine::list`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentFilter {
  pub worker_id:   Option<Uuid>,
  pub project_id:  Option<Uuid>,
  pub position_id: Option<Uuid>,
  pub status:      Option<AssignmentStatus>,
}

// ─── Conflicts ───────────────────────────────────────────────────────────────

/// The assignment standing in the way of a placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
  pub assignment_id: Uuid,
  pub project_id:    Option<Uuid>,
  pub project_name:  Option<String>,
  pub range:         DateRange,
}

impl Conflict {
  pub fn new(assignment: &Assignment, project_name: Option<String>) -> Self {
    Self {
      assignment_id: assignment.assignment_id,
      project_id: assignment.project_id,
      project_name,
      range: assignment.range(),
    }
  }
}

impl std::fmt::Display for Conflict {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match (&self.project_name, self.project_id) {
      (Some(name), _) => write!(f, "assignment {} on project \"{name}\" ({})", self.assignment_id, self.range),
      (None, Some(id)) => write!(f, "assignment {} on project {id} ({})", self.assignment_id, self.range),
      (None, None) => write!(f, "assignment {} in the general pool ({})", self.assignment_id, self.range),
    }
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// The worker must exist undeleted and be in `Active` status.
pub fn check_worker_eligible(worker: &Worker) -> Result<()> {
  if worker.is_deleted() {
    return Err(Error::not_found(crate::error::Entity::Worker, worker.worker_id));
  }
  if !worker.is_assignable() {
    return Err(Error::WorkerNotEligible { worker_id: worker.worker_id, status: worker.status });
  }
  Ok(())
}

/// The project must not be finished, and a position must be active and belong
/// to it.
pub fn check_position_link(project: Option<&Project>, position: Option<&PositionRequirement>) -> Result<()> {
  if let Some(project) = project
    && project.is_closed()
  {
    return Err(Error::ProjectClosed { project_id: project.project_id });
  }
  let Some(position) = position else {
    return Ok(());
  };
  if let Some(project) = project
    && position.project_id != project.project_id
  {
    return Err(Error::InvalidPositionLink {
      position_id: position.position_id,
      reason:      format!("it belongs to project {}, not {}", position.project_id, project.project_id),
    });
  }
  if !position.active {
    return Err(Error::InvalidPositionLink {
      position_id: position.position_id,
      reason:      "the position is inactive".into(),
    });
  }
  Ok(())
}

/// The first active assignment in `existing` (other than `exclude`) whose
/// range overlaps `range`.
pub fn find_conflict<'a>(
  range: &DateRange,
  existing: &'a [Assignment],
  exclude: Option<Uuid>,
) -> Option<&'a Assignment> {
  existing
    .iter()
    .filter(|a| a.is_active() && Some(a.assignment_id) != exclude)
    .find(|a| a.range().overlaps(range))
}

/// Number of active assignments against `position_id` overlapping `range`,
/// not counting `exclude`.
pub fn occupied_slots(
  position_id: Uuid,
  range: &DateRange,
  existing: &[Assignment],
  exclude: Option<Uuid>,
) -> u32 {
  existing
    .iter()
    .filter(|a| a.is_active() && a.position_id == Some(position_id))
    .filter(|a| Some(a.assignment_id) != exclude)
    .filter(|a| a.range().overlaps(range))
    .count() as u32
}

/// Fails when admitting one more assignment over `range` would exceed the
/// position's headcount.
pub fn check_capacity(
  position: &PositionRequirement,
  range: &DateRange,
  existing: &[Assignment],
  exclude: Option<Uuid>,
) -> Result<()> {
  let current = occupied_slots(position.position_id, range, existing, exclude);
  if current >= position.headcount {
    return Err(Error::CapacityExceeded {
      position_id: position.position_id,
      current,
      required: position.headcount,
    });
  }
  Ok(())
}

// ─── Notes ───────────────────────────────────────────────────────────────────

/// Append `line` on its own line to existing notes.
pub fn append_note(notes: Option<String>, line: &str) -> String {
  match notes.filter(|n| !n.trim().is_empty()) {
    Some(existing) => format!("{existing}\n{line}"),
    None => line.to_owned(),
  }
}

/// Prepend the human-readable override block to the caller's notes.
pub fn override_notes(notes: Option<String>, violations: &[Violation], today: NaiveDate) -> Option<String> {
  if violations.is_empty() {
    return notes;
  }
  let mut block = format!("[ASSIGNED WITH UNMET REQUIREMENTS {today}]");
  for violation in violations {
    block.push_str("\n- ");
    block.push_str(&violation.to_string());
  }
  Some(match notes.filter(|n| !n.trim().is_empty()) {
    Some(existing) => format!("{block}\n\n{existing}"),
    None => block,
  })
}

/// Serde helper distinguishing a missing field from an explicit `null`.
mod double_option {
  use serde::{Deserialize, Deserializer, Serialize, Serializer};

  pub fn serialize<T: Serialize, S: Serializer>(
    value: &Option<Option<T>>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match value {
      Some(inner) => inner.serialize(serializer),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, T: Deserialize<'de>, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<Option<T>>, D::Error> {
    Option::<T>::deserialize(deserializer).map(Some)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::{
    personnel::{Sex, WorkerStatus},
    project::ProjectStatus,
  };

  fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap() }

  fn assignment(start: NaiveDate, end: Option<NaiveDate>, position_id: Option<Uuid>) -> Assignment {
    Assignment {
      assignment_id: Uuid::new_v4(),
      worker_id: Uuid::new_v4(),
      project_id: None,
      position_id,
      shift_id: Uuid::new_v4(),
      start_date: start,
      end_date: end,
      status: AssignmentStatus::Active,
      suspension_reason: None,
      notes: None,
      warnings: Vec::new(),
      created_at: now(),
      updated_at: now(),
    }
  }

  fn position(headcount: u32) -> PositionRequirement {
    PositionRequirement {
      position_id: Uuid::new_v4(),
      project_id: Uuid::new_v4(),
      name: "Patrol".into(),
      headcount,
      min_age: 18,
      max_age: 60,
      sex: None,
      min_height_cm: None,
      shift_id: Uuid::new_v4(),
      pay_rate: None,
      bill_rate: None,
      active: true,
    }
  }

  #[test]
  fn finish_defaults_end_to_today() {
    let mut a = assignment(d(2025, 1, 1), None, None);
    a.finish(d(2025, 6, 1), Some("contract ended"), now()).unwrap();
    assert_eq!(a.status, AssignmentStatus::Finished);
    assert_eq!(a.end_date, Some(d(2025, 6, 1)));
    assert_eq!(a.notes.as_deref(), Some("Finished on 2025-06-01: contract ended"));
  }

  #[test]
  fn finish_keeps_existing_end_and_never_precedes_start() {
    let mut a = assignment(d(2025, 1, 1), Some(d(2025, 12, 31)), None);
    a.finish(d(2025, 6, 1), None, now()).unwrap();
    assert_eq!(a.end_date, Some(d(2025, 12, 31)));

    let mut future = assignment(d(2025, 9, 1), None, None);
    future.finish(d(2025, 6, 1), None, now()).unwrap();
    assert_eq!(future.end_date, Some(d(2025, 9, 1)));
  }

  #[test]
  fn finished_is_terminal() {
    let mut a = assignment(d(2025, 1, 1), None, None);
    a.finish(d(2025, 6, 1), None, now()).unwrap();
    assert!(matches!(a.suspend("x", now()), Err(Error::InvalidTransition { action: "suspend", .. })));
    assert!(matches!(a.reactivate(now()), Err(Error::InvalidTransition { action: "reactivate", .. })));
    assert!(matches!(a.finish(d(2025, 6, 2), None, now()), Err(Error::InvalidTransition { .. })));
  }

  #[test]
  fn suspend_requires_reason_and_reactivate_clears_it() {
    let mut a = assignment(d(2025, 1, 1), None, None);
    assert!(matches!(a.suspend("   ", now()), Err(Error::ReasonRequired)));
    a.suspend(" medical leave ", now()).unwrap();
    assert_eq!(a.suspension_reason.as_deref(), Some("medical leave"));
    assert!(matches!(a.suspend("again", now()), Err(Error::InvalidTransition { .. })));
    a.reactivate(now()).unwrap();
    assert_eq!(a.status, AssignmentStatus::Active);
    assert_eq!(a.suspension_reason, None);
  }

  #[test]
  fn remaining_range_starts_today() {
    let a = assignment(d(2025, 1, 1), Some(d(2025, 12, 31)), None);
    assert_eq!(a.remaining_range(d(2025, 6, 1)), Some(DateRange::new(d(2025, 6, 1), Some(d(2025, 12, 31)))));
    let past = assignment(d(2025, 1, 1), Some(d(2025, 2, 1)), None);
    assert_eq!(past.remaining_range(d(2025, 6, 1)), None);
  }

  #[test]
  fn conflict_ignores_inactive_and_self() {
    let mut suspended = assignment(d(2025, 1, 1), Some(d(2025, 3, 31)), None);
    suspended.status = AssignmentStatus::Suspended;
    let own = assignment(d(2025, 1, 1), Some(d(2025, 3, 31)), None);
    let existing = vec![suspended, own.clone()];
    let range = DateRange::new(d(2025, 3, 15), Some(d(2025, 4, 15)));

    assert_eq!(find_conflict(&range, &existing, Some(own.assignment_id)), None);
    assert_eq!(find_conflict(&range, &existing, None).map(|a| a.assignment_id), Some(own.assignment_id));
  }

  #[test]
  fn capacity_counts_overlapping_active_slots() {
    let pos = position(2);
    let existing = vec![
      assignment(d(2025, 1, 1), None, Some(pos.position_id)),
      assignment(d(2025, 2, 1), Some(d(2025, 8, 1)), Some(pos.position_id)),
      assignment(d(2025, 1, 1), None, Some(Uuid::new_v4())),
    ];
    let range = DateRange::new(d(2025, 5, 1), None);
    let err = check_capacity(&pos, &range, &existing, None).unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded { current: 2, required: 2, .. }));

    let later = DateRange::new(d(2025, 9, 1), None);
    check_capacity(&pos, &range, &existing, Some(existing[0].assignment_id)).unwrap();
    assert_eq!(occupied_slots(pos.position_id, &later, &existing, None), 1);
  }

  #[test]
  fn position_must_match_project_and_be_active() {
    let project = Project { project_id: Uuid::new_v4(), name: "Mall".into(), status: ProjectStatus::Active };
    let mut pos = position(1);
    assert!(matches!(
      check_position_link(Some(&project), Some(&pos)),
      Err(Error::InvalidPositionLink { .. })
    ));
    pos.project_id = project.project_id;
    check_position_link(Some(&project), Some(&pos)).unwrap();
    pos.active = false;
    assert!(matches!(
      check_position_link(Some(&project), Some(&pos)),
      Err(Error::InvalidPositionLink { .. })
    ));
  }

  #[test]
  fn finished_project_is_closed() {
    let project = Project { project_id: Uuid::new_v4(), name: "Old".into(), status: ProjectStatus::Finished };
    assert!(matches!(check_position_link(Some(&project), None), Err(Error::ProjectClosed { .. })));
  }

  #[test]
  fn ineligible_workers_are_rejected() {
    let mut worker = Worker {
      worker_id: Uuid::new_v4(),
      full_name: "Ana".into(),
      birth_date: d(1990, 1, 1),
      sex: Sex::Female,
      height_cm: None,
      status: WorkerStatus::Suspended,
      deleted_at: None,
    };
    assert!(matches!(check_worker_eligible(&worker), Err(Error::WorkerNotEligible { .. })));
    worker.status = WorkerStatus::Active;
    check_worker_eligible(&worker).unwrap();
    worker.deleted_at = Some(now());
    assert!(matches!(check_worker_eligible(&worker), Err(Error::NotFound { .. })));
  }

  #[test]
  fn override_block_precedes_notes() {
    let notes = override_notes(
      Some("night cover".into()),
      &[Violation::HeightMissing { min_cm: 170 }],
      d(2025, 6, 1),
    );
    assert_eq!(
      notes.as_deref(),
      Some(
        "[ASSIGNED WITH UNMET REQUIREMENTS 2025-06-01]\n- position requires at least 170 cm but no \
         height is recorded\n\nnight cover"
      )
    );
  }

  #[test]
  fn conflict_names_general_pool() {
    let a = assignment(d(2025, 1, 1), None, None);
    assert!(Conflict::new(&a, None).to_string().contains("general pool"));
    let mut named = Conflict::new(&a, Some("Project A".into()));
    named.project_id = Some(Uuid::new_v4());
    assert!(named.to_string().contains("\"Project A\""));
  }

  #[test]
  fn patch_distinguishes_cleared_end_date() {
    let cleared: AssignmentPatch = serde_json::from_str(r#"{"end_date": null}"#).unwrap();
    assert_eq!(cleared.end_date, Some(None));
    let untouched: AssignmentPatch = serde_json::from_str("{}").unwrap();
    assert_eq!(untouched.end_date, None);
  }
}
