//! [`AssignmentEngine`] impl.
//!
//! Placement checks run in a fixed order: worker, shift and range; project and
//! position link; requirements; worker overlap; position capacity. The first
//! hard failure wins.

use chrono::NaiveDate;
use rusqlite::Connection;
use staffing_core::{
  assignment::{
    Assignment, AssignmentFilter, AssignmentPatch, AssignmentStatus, Conflict, NewAssignment,
    StatusChange, check_capacity, check_position_link, check_worker_eligible, find_conflict,
    override_notes,
  },
  attendance::AttendanceRecord,
  engine::AssignmentEngine,
  matcher::{self, MatchReport},
  project::PositionRequirement,
  range::DateRange,
};
use uuid::Uuid;

use crate::{Error, Result, SqliteStore, error::log_rejected, queries, store::Ctx};

type CoreError = staffing_core::Error;

// ─── Placement checks ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnUnmet {
  Reject,
  Report,
}

struct Placement {
  project_id: Option<Uuid>,
  report:     MatchReport,
}

fn check_placement(
  conn: &Connection,
  input: &NewAssignment,
  today: NaiveDate,
  on_unmet: OnUnmet,
) -> Result<Placement> {
  let worker = queries::require_worker(conn, input.worker_id)?;
  check_worker_eligible(&worker)?;
  queries::require_shift(conn, input.shift_id)?;
  let range = input.range();
  if !range.is_valid() {
    return Err(CoreError::InvalidRange(range).into());
  }

  // A position without a project places the worker on the position's project.
  let position = input.position_id.map(|id| queries::require_position(conn, id)).transpose()?;
  let project_id = input.project_id.or(position.as_ref().map(|p| p.project_id));
  let project = project_id.map(|id| queries::require_project(conn, id)).transpose()?;
  check_position_link(project.as_ref(), position.as_ref())?;

  let report = match &position {
    Some(position) => matcher::matches(&worker, position, today),
    None => MatchReport::unconstrained(&worker, today),
  };
  if !report.ok && on_unmet == OnUnmet::Reject {
    return Err(CoreError::RequirementsNotMet { violations: report.violations }.into());
  }

  check_schedule(conn, input.worker_id, position.as_ref(), &range, None)?;
  Ok(Placement { project_id, report })
}

/// Overlap against the worker's other active assignments, then capacity of
/// the position over the whole range.
fn check_schedule(
  conn: &Connection,
  worker_id: Uuid,
  position: Option<&PositionRequirement>,
  range: &DateRange,
  exclude: Option<Uuid>,
) -> Result<()> {
  let held = queries::active_assignments_of_worker(conn, worker_id)?;
  if let Some(existing) = find_conflict(range, &held, exclude) {
    let name = queries::project_name(conn, existing.project_id)?;
    return Err(CoreError::SchedulingConflict { conflict: Conflict::new(existing, name) }.into());
  }
  if let Some(position) = position {
    let holders = queries::active_assignments_of_position(conn, position.position_id)?;
    check_capacity(position, range, &holders, exclude)?;
  }
  Ok(())
}

fn position_of(conn: &Connection, a: &Assignment) -> Result<Option<PositionRequirement>> {
  a.position_id.map(|id| queries::require_position(conn, id)).transpose()
}

fn build(input: NewAssignment, project_id: Option<Uuid>, notes: Option<String>, warnings: Vec<String>, ctx: &Ctx) -> Assignment {
  Assignment {
    assignment_id: Uuid::new_v4(),
    worker_id: input.worker_id,
    project_id,
    position_id: input.position_id,
    shift_id: input.shift_id,
    start_date: input.start_date,
    end_date: input.end_date,
    status: AssignmentStatus::Active,
    suspension_reason: None,
    notes,
    warnings,
    created_at: ctx.now,
    updated_at: ctx.now,
  }
}

// ─── Status changes ──────────────────────────────────────────────────────────

fn apply_status(conn: &Connection, a: &mut Assignment, change: StatusChange, ctx: &Ctx) -> Result<()> {
  match change {
    StatusChange::Finished { reason } => a.finish(ctx.today, reason.as_deref(), ctx.now)?,
    StatusChange::Suspended { reason } => a.suspend(&reason, ctx.now)?,
    StatusChange::Active => {
      a.reactivate(ctx.now)?;
      // Only the part still ahead of us can collide; a fully elapsed range
      // has nothing left to check.
      if let Some(remaining) = a.remaining_range(ctx.today) {
        let position = position_of(conn, a)?;
        check_schedule(conn, a.worker_id, position.as_ref(), &remaining, Some(a.assignment_id))?;
      }
    }
  }
  Ok(())
}

/// Bring existing attendance in line with the assignment's current range.
/// Bare rest days outside it are dropped; any other record outside it blocks
/// the change with `OutOfRange`.
fn fit_attendance(conn: &Connection, a: &Assignment) -> Result<()> {
  let range = a.range();
  let mut stale = Vec::new();
  for record in queries::attendance_of_assignment(conn, a.assignment_id, None, None)? {
    if range.contains(record.date) {
      continue;
    }
    if !is_bare_rest_day(&record) {
      return Err(CoreError::OutOfRange { date: record.date, range }.into());
    }
    stale.push(record.attendance_id);
  }
  for id in &stale {
    queries::delete_attendance(conn, *id)?;
  }
  if !stale.is_empty() {
    tracing::info!(assignment_id = %a.assignment_id, dropped = stale.len(), "rest days outside the range removed");
  }
  Ok(())
}

// What rest-day generation writes: no times, no replacement.
fn is_bare_rest_day(record: &AttendanceRecord) -> bool {
  record.is_rest_day && record.entry_time.is_none() && !record.was_replaced
}

fn change_label(change: &StatusChange) -> &'static str {
  match change {
    StatusChange::Finished { .. } => "finish",
    StatusChange::Suspended { .. } => "suspend",
    StatusChange::Active => "reactivate",
  }
}

impl SqliteStore {
  async fn transition(&self, id: Uuid, change: StatusChange) -> Result<Assignment> {
    let action = change_label(&change);
    self
      .write(move |tx, ctx| {
        let mut a = queries::require_assignment(tx, id)?;
        apply_status(tx, &mut a, change, ctx)?;
        fit_attendance(tx, &a)?;
        queries::save_assignment(tx, &a)?;
        Ok(a)
      })
      .await
      .inspect(|a| tracing::info!(assignment_id = %a.assignment_id, status = %a.status, action, "assignment status changed"))
      .inspect_err(log_rejected(action))
  }
}

// ─── AssignmentEngine impl ───────────────────────────────────────────────────

impl AssignmentEngine for SqliteStore {
  type Error = Error;

  async fn validate(&self, input: NewAssignment) -> Result<MatchReport> {
    self
      .read(move |conn, ctx| check_placement(conn, &input, ctx.today, OnUnmet::Report).map(|p| p.report))
      .await
      .inspect_err(log_rejected("validate"))
  }

  async fn create(&self, input: NewAssignment) -> Result<Assignment> {
    self
      .write(move |tx, ctx| {
        let placement = check_placement(tx, &input, ctx.today, OnUnmet::Reject)?;
        let notes = input.notes.clone();
        let assignment = build(input, placement.project_id, notes, Vec::new(), ctx);
        queries::insert_assignment(tx, &assignment)?;
        Ok(assignment)
      })
      .await
      .inspect(|a| {
        tracing::info!(
          assignment_id = %a.assignment_id,
          worker_id = %a.worker_id,
          range = %a.range(),
          "assignment created"
        )
      })
      .inspect_err(log_rejected("create"))
  }

  async fn create_with_override(&self, input: NewAssignment) -> Result<Assignment> {
    self
      .write(move |tx, ctx| {
        let placement = check_placement(tx, &input, ctx.today, OnUnmet::Report)?;
        let violations = placement.report.violations;
        let notes = override_notes(input.notes.clone(), &violations, ctx.today);
        let warnings: Vec<String> = violations.iter().map(ToString::to_string).collect();
        let assignment = build(input, placement.project_id, notes, warnings, ctx);
        queries::insert_assignment(tx, &assignment)?;
        Ok(assignment)
      })
      .await
      .inspect(|a| {
        if a.warnings.is_empty() {
          tracing::info!(assignment_id = %a.assignment_id, worker_id = %a.worker_id, "assignment created");
        } else {
          tracing::warn!(
            assignment_id = %a.assignment_id,
            worker_id = %a.worker_id,
            warnings = ?a.warnings,
            "assignment created with unmet requirements"
          );
        }
      })
      .inspect_err(log_rejected("create_with_override"))
  }

  async fn update(&self, id: Uuid, patch: AssignmentPatch) -> Result<Assignment> {
    self
      .write(move |tx, ctx| {
        let mut a = queries::require_assignment(tx, id)?;
        if a.status == AssignmentStatus::Finished {
          return Err(CoreError::InvalidTransition { assignment_id: id, from: a.status, action: "update" }.into());
        }

        let dates_changed = patch.changes_dates();
        let AssignmentPatch { start_date, end_date, shift_id, notes, status } = patch;
        if let Some(start) = start_date {
          a.start_date = start;
        }
        if let Some(end) = end_date {
          a.end_date = end;
        }
        if let Some(shift_id) = shift_id {
          queries::require_shift(tx, shift_id)?;
          a.shift_id = shift_id;
        }
        if let Some(notes) = notes {
          a.notes = Some(notes).filter(|n| !n.trim().is_empty());
        }

        let range = a.range();
        if !range.is_valid() {
          return Err(CoreError::InvalidRange(range).into());
        }
        if dates_changed && a.is_active() {
          let position = position_of(tx, &a)?;
          check_schedule(tx, a.worker_id, position.as_ref(), &range, Some(a.assignment_id))?;
        }
        a.updated_at = ctx.now;

        if let Some(change) = status {
          apply_status(tx, &mut a, change, ctx)?;
        }
        fit_attendance(tx, &a)?;
        queries::save_assignment(tx, &a)?;
        Ok(a)
      })
      .await
      .inspect(|a| tracing::info!(assignment_id = %a.assignment_id, status = %a.status, "assignment updated"))
      .inspect_err(log_rejected("update"))
  }

  async fn finish(&self, id: Uuid, reason: Option<String>) -> Result<Assignment> {
    self.transition(id, StatusChange::Finished { reason }).await
  }

  async fn suspend(&self, id: Uuid, reason: String) -> Result<Assignment> {
    self.transition(id, StatusChange::Suspended { reason }).await
  }

  async fn reactivate(&self, id: Uuid) -> Result<Assignment> { self.transition(id, StatusChange::Active).await }

  async fn delete(&self, id: Uuid) -> Result<()> {
    self
      .write(move |tx, _| {
        queries::require_assignment(tx, id)?;
        let attendance_count = queries::attendance_count(tx, id)?;
        if attendance_count > 0 {
          return Err(CoreError::HasDependents { assignment_id: id, attendance_count }.into());
        }
        queries::delete_assignment(tx, id)
      })
      .await
      .inspect(|_| tracing::info!(assignment_id = %id, "assignment deleted"))
      .inspect_err(log_rejected("delete"))
  }

  async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>> {
    self.read(move |conn, _| queries::assignment(conn, id)).await
  }

  async fn list_assignments(&self, filter: AssignmentFilter) -> Result<Vec<Assignment>> {
    self.read(move |conn, _| queries::filtered_assignments(conn, &filter)).await
  }
}
