//! [`AttendanceEngine`] impl.
//!
//! `record`, the mark helpers and bulk entries all go through [`record_day`],
//! so one set of rules decides what gets stored for a day.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;
use staffing_core::{
  assignment::{Assignment, Conflict, find_conflict},
  attendance::{
    AttendanceInput, AttendanceRecord, AttendanceSummary, BulkEntry, BulkFailure, BulkOutcome,
    GeneratedRestDay, WorkerHistory, check_in_range, normalize,
  },
  engine::AttendanceEngine,
  range::DateRange,
  shift::RestPattern,
};
use uuid::Uuid;

use crate::{Error, Result, SqliteStore, error::log_rejected, queries, store::Ctx};

type CoreError = staffing_core::Error;

// ─── Single day ──────────────────────────────────────────────────────────────

fn record_day(
  conn: &Connection,
  assignment_id: Uuid,
  date: NaiveDate,
  input: AttendanceInput,
  actor: Option<Uuid>,
  ctx: &Ctx,
) -> Result<AttendanceRecord> {
  let assignment = queries::require_assignment(conn, assignment_id)?;
  check_in_range(&assignment, date)?;
  let shift = queries::require_shift(conn, assignment.shift_id)?;
  let day = normalize(input, shift.start_time, ctx.settings.late_tolerance_minutes)?;
  if let Some(replacement) = day.replacement_worker_id {
    check_replacement(conn, replacement, &assignment, date)?;
  }

  let record = AttendanceRecord {
    attendance_id:         Uuid::new_v4(),
    assignment_id,
    date,
    entry_time:            day.entry_time,
    exit_time:             day.exit_time,
    is_rest_day:           day.is_rest_day,
    was_replaced:          day.was_replaced,
    replacement_worker_id: day.replacement_worker_id,
    replacement_reason:    day.replacement_reason,
    is_late:               day.lateness.late,
    minutes_late:          day.lateness.minutes,
    notes:                 day.notes,
    recorded_by:           actor,
    recorded_at:           ctx.now,
  };
  queries::upsert_attendance(conn, &record)
}

/// The replacement must be a live, active worker other than the one being
/// covered, with no active assignment on that day.
fn check_replacement(conn: &Connection, worker_id: Uuid, covered: &Assignment, date: NaiveDate) -> Result<()> {
  let unavailable = |reason: String| -> Error { CoreError::ReplacementUnavailable { worker_id, reason }.into() };

  let Some(worker) = queries::worker(conn, worker_id)?.filter(|w| !w.is_deleted()) else {
    return Err(unavailable("no such worker".into()));
  };
  if !worker.is_assignable() {
    return Err(unavailable(format!("worker is {}", worker.status)));
  }
  if worker_id == covered.worker_id {
    return Err(unavailable("a worker cannot replace themselves".into()));
  }

  let held = queries::active_assignments_of_worker(conn, worker_id)?;
  if let Some(existing) = find_conflict(&DateRange::day(date), &held, None) {
    let name = queries::project_name(conn, existing.project_id)?;
    return Err(unavailable(format!("already covering {}", Conflict::new(existing, name))));
  }
  Ok(())
}

/// Re-run an existing record through [`record_day`] after `edit`.
fn amend(
  conn: &Connection,
  attendance_id: Uuid,
  actor: Option<Uuid>,
  ctx: &Ctx,
  edit: impl FnOnce(&mut AttendanceInput),
) -> Result<AttendanceRecord> {
  let existing = queries::require_attendance(conn, attendance_id)?;
  let mut input = existing.to_input();
  edit(&mut input);
  record_day(conn, existing.assignment_id, existing.date, input, actor, ctx)
}

// ─── AttendanceEngine impl ───────────────────────────────────────────────────

impl AttendanceEngine for SqliteStore {
  type Error = Error;

  async fn record(
    &self,
    assignment_id: Uuid,
    date: NaiveDate,
    input: AttendanceInput,
    actor: Option<Uuid>,
  ) -> Result<AttendanceRecord> {
    self
      .write(move |tx, ctx| record_day(tx, assignment_id, date, input, actor, ctx))
      .await
      .inspect_err(log_rejected("record_attendance"))
  }

  async fn mark_entry(&self, attendance_id: Uuid, time: NaiveTime, actor: Option<Uuid>) -> Result<AttendanceRecord> {
    self
      .write(move |tx, ctx| {
        // Clocking in means the day is being worked after all.
        amend(tx, attendance_id, actor, ctx, |input| {
          input.is_rest_day = false;
          input.entry_time = Some(time);
        })
      })
      .await
      .inspect_err(log_rejected("mark_entry"))
  }

  async fn mark_exit(&self, attendance_id: Uuid, time: NaiveTime, actor: Option<Uuid>) -> Result<AttendanceRecord> {
    self
      .write(move |tx, ctx| amend(tx, attendance_id, actor, ctx, |input| input.exit_time = Some(time)))
      .await
      .inspect_err(log_rejected("mark_exit"))
  }

  async fn bulk_record(&self, entries: Vec<BulkEntry>, actor: Option<Uuid>) -> Result<BulkOutcome> {
    let total = entries.len();
    self
      .write_or_rollback(move |tx, ctx| {
        let mut outcome = BulkOutcome::default();
        for (index, entry) in entries.into_iter().enumerate() {
          match record_day(tx, entry.assignment_id, entry.date, entry.input, actor, ctx) {
            Ok(record) => outcome.succeeded.push(record),
            Err(Error::Domain(e)) if e.is_user_error() => {
              outcome.failed.push(BulkFailure { index, reason: e.to_string() })
            }
            Err(e) => return Err(e),
          }
        }
        // Nothing is kept unless every entry passed.
        if !outcome.is_committed() {
          outcome.succeeded.clear();
        }
        let commit = outcome.is_committed();
        Ok((outcome, commit))
      })
      .await
      .inspect(|outcome| {
        if outcome.is_committed() {
          tracing::info!(records = total, "attendance batch recorded");
        } else {
          tracing::warn!(records = total, failures = outcome.failed.len(), "attendance batch rejected");
        }
      })
  }

  async fn generate_rest_days(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<GeneratedRestDay>> {
    self
      .write(move |tx, ctx| {
        let window = DateRange::new(from, Some(to));
        if !window.is_valid() {
          return Err(CoreError::InvalidRange(window).into());
        }

        let mut patterns: HashMap<Uuid, Option<RestPattern>> = HashMap::new();
        let mut created = Vec::new();
        for assignment in queries::active_assignments(tx)? {
          let pattern = match patterns.get(&assignment.shift_id) {
            Some(pattern) => *pattern,
            None => {
              let pattern = queries::require_shift(tx, assignment.shift_id)?.rest_pattern();
              patterns.insert(assignment.shift_id, pattern);
              pattern
            }
          };
          let Some(pattern) = pattern else { continue };

          for date in pattern.rest_days_within(assignment.range(), window) {
            if queries::insert_rest_day(tx, assignment.assignment_id, date, ctx.now)? {
              created.push(GeneratedRestDay { assignment_id: assignment.assignment_id, date });
            }
          }
        }
        Ok(created)
      })
      .await
      .inspect(|created| tracing::info!(%from, %to, created = created.len(), "rest days generated"))
      .inspect_err(log_rejected("generate_rest_days"))
  }

  async fn history_for_worker(&self, worker_id: Uuid, start: NaiveDate, end: NaiveDate) -> Result<WorkerHistory> {
    self
      .read(move |conn, _| {
        let range = DateRange::new(start, Some(end));
        if !range.is_valid() {
          return Err(CoreError::InvalidRange(range).into());
        }
        queries::require_worker(conn, worker_id)?;
        let records = queries::attendance_of_worker(conn, worker_id, start, end)?;
        Ok(WorkerHistory { worker_id, start, end, summary: AttendanceSummary::from_records(&records), records })
      })
      .await
  }

  async fn get_attendance(&self, attendance_id: Uuid) -> Result<Option<AttendanceRecord>> {
    self.read(move |conn, _| queries::attendance(conn, attendance_id)).await
  }

  async fn list_attendance(
    &self,
    assignment_id: Uuid,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
  ) -> Result<Vec<AttendanceRecord>> {
    self
      .read(move |conn, _| {
        queries::require_assignment(conn, assignment_id)?;
        queries::attendance_of_assignment(conn, assignment_id, start, end)
      })
      .await
  }
}
