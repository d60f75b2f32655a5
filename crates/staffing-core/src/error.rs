//! Error types for `staffing-core`.
//!
//! Every validation failure the engine can report is a variant here, so
//! callers can map them to user-facing messages without parsing text.

use chrono::NaiveDate;
use strum::Display;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  assignment::{AssignmentStatus, Conflict},
  matcher::Violation,
  personnel::WorkerStatus,
  range::DateRange,
};

/// The kind of record a [`Error::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Entity {
  Worker,
  Project,
  Position,
  Shift,
  Assignment,
  Attendance,
}

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or soft-deleted record.
  #[error("{entity} not found: {id}")]
  NotFound { entity: Entity, id: Uuid },

  #[error("worker {worker_id} is {status} and cannot be assigned")]
  WorkerNotEligible { worker_id: Uuid, status: WorkerStatus },

  #[error("position {position_id} cannot be used here: {reason}")]
  InvalidPositionLink { position_id: Uuid, reason: String },

  /// A position whose own criteria cannot be satisfied by anyone.
  #[error("position {position_id} has malformed requirements: {reason}")]
  InvalidRequirement { position_id: Uuid, reason: String },

  #[error("project {project_id} is finished")]
  ProjectClosed { project_id: Uuid },

  #[error("worker does not meet the position requirements: {}", join(.violations))]
  RequirementsNotMet { violations: Vec<Violation> },

  #[error("scheduling conflict with {conflict}")]
  SchedulingConflict { conflict: Conflict },

  #[error("position {position_id} is at capacity ({current} of {required})")]
  CapacityExceeded { position_id: Uuid, current: u32, required: u32 },

  #[error("assignment {assignment_id} cannot {action} while {from}")]
  InvalidTransition {
    assignment_id: Uuid,
    from:          AssignmentStatus,
    action:        &'static str,
  },

  #[error("a non-empty reason is required")]
  ReasonRequired,

  #[error("range {0} ends before it starts")]
  InvalidRange(DateRange),

  #[error("range of {days} days exceeds the limit of {max}")]
  RangeTooLong { days: u64, max: u32 },

  #[error("{date} is outside assignment range {range}")]
  OutOfRange { date: NaiveDate, range: DateRange },

  #[error("exit time recorded without an entry time")]
  MissingEntry,

  #[error("a replacement needs both a worker and a reason")]
  ReplacementIncomplete,

  #[error("replacement worker {worker_id} is unavailable: {reason}")]
  ReplacementUnavailable { worker_id: Uuid, reason: String },

  #[error("assignment {assignment_id} has {attendance_count} attendance records; finish it instead")]
  HasDependents { assignment_id: Uuid, attendance_count: u64 },

  /// A storage constraint fired that the engine should have caught first.
  #[error("storage invariant violated: {0}")]
  InvariantViolation(String),
}

impl Error {
  pub fn not_found(entity: Entity, id: Uuid) -> Self { Self::NotFound { entity, id } }

  /// `true` for failures caused by caller input or current scheduling state,
  /// as opposed to bugs or infrastructure faults.
  pub fn is_user_error(&self) -> bool { !matches!(self, Self::InvariantViolation(_)) }
}

fn join(violations: &[Violation]) -> String {
  violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
