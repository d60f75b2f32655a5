//! The engine traits and the directory of reference data they consume.
//!
//! Traits are implemented by storage backends (e.g. `staffing-store-sqlite`).
//! Higher layers (`staffing-cli`, an HTTP service) depend on these
//! abstractions, not on any concrete backend.
//!
//! Every write method must run its read-validate-write sequence inside one
//! transaction strong enough that two concurrent callers cannot both pass an
//! overlap or capacity check.

use std::future::Future;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::{
  assignment::{Assignment, AssignmentFilter, AssignmentPatch, NewAssignment},
  attendance::{
    AttendanceInput, AttendanceRecord, BulkEntry, BulkOutcome, GeneratedRestDay, WorkerHistory,
  },
  availability::Calendar,
  coverage::{AlertFilter, CoverageAlert, CoverageStat},
  matcher::MatchReport,
  personnel::Worker,
  project::{PositionRequirement, Project},
  shift::Shift,
};

// ─── Directory ───────────────────────────────────────────────────────────────

/// Read access to personnel, projects, positions and shifts, plus the upserts
/// used to mirror them from their owning modules.
pub trait Directory: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  // ── Workers ───────────────────────────────────────────────────────────

  /// Insert or replace a worker record.
  fn put_worker(&self, worker: Worker) -> impl Future<Output = Result<Worker, Self::Error>> + Send + '_;

  /// Retrieve a worker, including soft-deleted ones. `None` if unknown.
  fn get_worker(&self, id: Uuid) -> impl Future<Output = Result<Option<Worker>, Self::Error>> + Send + '_;

  /// All workers that are not soft-deleted.
  fn list_workers(&self) -> impl Future<Output = Result<Vec<Worker>, Self::Error>> + Send + '_;

  /// Mark a worker as deleted without removing their history.
  fn soft_delete_worker(&self, id: Uuid) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Projects & positions ──────────────────────────────────────────────

  fn put_project(&self, project: Project) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  fn get_project(&self, id: Uuid) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  fn put_position(
    &self,
    position: PositionRequirement,
  ) -> impl Future<Output = Result<PositionRequirement, Self::Error>> + Send + '_;

  fn get_position(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PositionRequirement>, Self::Error>> + Send + '_;

  /// Positions of one project, active or not.
  fn list_positions(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PositionRequirement>, Self::Error>> + Send + '_;

  // ── Shifts ────────────────────────────────────────────────────────────

  fn put_shift(&self, shift: Shift) -> impl Future<Output = Result<Shift, Self::Error>> + Send + '_;

  fn get_shift(&self, id: Uuid) -> impl Future<Output = Result<Option<Shift>, Self::Error>> + Send + '_;
}

// ─── Assignments ─────────────────────────────────────────────────────────────

/// The system of record for assignments.
pub trait AssignmentEngine: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  /// Run every placement check without writing. Hard failures are errors;
  /// requirement violations are returned in the report so the caller can
  /// decide whether to override.
  fn validate(&self, input: NewAssignment) -> impl Future<Output = Result<MatchReport, Self::Error>> + Send + '_;

  /// Create an assignment. Unmet requirements fail with
  /// [`crate::Error::RequirementsNotMet`].
  fn create(&self, input: NewAssignment) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  /// Create an assignment accepting unmet requirements, which are recorded as
  /// warnings. Every other check still applies.
  fn create_with_override(
    &self,
    input: NewAssignment,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  /// Apply a partial update. A status change is routed through
  /// finish/suspend/reactivate.
  fn update(
    &self,
    id: Uuid,
    patch: AssignmentPatch,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  fn finish(
    &self,
    id: Uuid,
    reason: Option<String>,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  fn suspend(&self, id: Uuid, reason: String) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  fn reactivate(&self, id: Uuid) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  /// Remove an assignment that has no attendance history.
  fn delete(&self, id: Uuid) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_assignment(&self, id: Uuid) -> impl Future<Output = Result<Option<Assignment>, Self::Error>> + Send + '_;

  fn list_assignments(
    &self,
    filter: AssignmentFilter,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;
}

// ─── Availability ────────────────────────────────────────────────────────────

pub trait AvailabilityService: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  /// `true` iff no active assignment of the worker (other than `exclude`)
  /// overlaps `[start, end]`.
  fn is_available(
    &self,
    worker_id: Uuid,
    start: NaiveDate,
    end: Option<NaiveDate>,
    exclude: Option<Uuid>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Active workers free over the range, optionally pre-filtered by a
  /// position's requirements.
  fn list_available_workers(
    &self,
    start: NaiveDate,
    end: Option<NaiveDate>,
    position_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Worker>, Self::Error>> + Send + '_;

  fn calendar(
    &self,
    worker_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<Calendar, Self::Error>> + Send + '_;

  /// Coverage of each active position of a project as of today.
  fn project_coverage_stats(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CoverageStat>, Self::Error>> + Send + '_;
}

// ─── Attendance ──────────────────────────────────────────────────────────────

pub trait AttendanceEngine: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  /// Insert or replace the record for `(assignment_id, date)`.
  fn record(
    &self,
    assignment_id: Uuid,
    date: NaiveDate,
    input: AttendanceInput,
    actor: Option<Uuid>,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + '_;

  fn mark_entry(
    &self,
    attendance_id: Uuid,
    time: NaiveTime,
    actor: Option<Uuid>,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + '_;

  fn mark_exit(
    &self,
    attendance_id: Uuid,
    time: NaiveTime,
    actor: Option<Uuid>,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + '_;

  /// All-or-nothing batch. Validation failures are reported in the outcome;
  /// infrastructure failures are errors. Either way nothing partial is kept.
  fn bulk_record(
    &self,
    entries: Vec<BulkEntry>,
    actor: Option<Uuid>,
  ) -> impl Future<Output = Result<BulkOutcome, Self::Error>> + Send + '_;

  /// Insert rest days for rotating shifts over `[from, to]`. Returns only the
  /// days created by this call, so a re-run over the same range returns
  /// nothing.
  fn generate_rest_days(
    &self,
    from: NaiveDate,
    to: NaiveDate,
  ) -> impl Future<Output = Result<Vec<GeneratedRestDay>, Self::Error>> + Send + '_;

  fn history_for_worker(
    &self,
    worker_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<WorkerHistory, Self::Error>> + Send + '_;

  fn get_attendance(
    &self,
    attendance_id: Uuid,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>> + Send + '_;

  /// Records of one assignment, optionally restricted to `[start, end]`.
  fn list_attendance(
    &self,
    assignment_id: Uuid,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + '_;
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

pub trait CoverageAlerts: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  /// Positions that are short-staffed or about to lose coverage, most severe
  /// first.
  fn list_alerts(
    &self,
    filter: AlertFilter,
  ) -> impl Future<Output = Result<Vec<CoverageAlert>, Self::Error>> + Send + '_;
}
