//! Synchronous row access shared by the engine implementations.
//!
//! Everything here runs on the connection thread inside a transaction opened
//! by [`crate::store::SqliteStore`]. Functions take `&Connection` so they work
//! with both read snapshots and write transactions.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};
use staffing_core::{
  Entity,
  assignment::{Assignment, AssignmentFilter},
  attendance::AttendanceRecord,
  matcher::CandidateFilter,
  personnel::Worker,
  project::{PositionRequirement, Project},
  shift::Shift,
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ASSIGNMENT_COLUMNS, ATTENDANCE_COLUMNS, POSITION_COLUMNS, PROJECT_COLUMNS, RawAssignment,
    RawAttendance, RawPosition, RawProject, RawShift, RawWorker, SHIFT_COLUMNS, WORKER_COLUMNS,
    encode_date, encode_decimal, encode_dt, encode_time, encode_uuid, encode_warnings,
  },
};

pub fn missing(entity: Entity, id: Uuid) -> Error { staffing_core::Error::not_found(entity, id).into() }

// ─── Workers ─────────────────────────────────────────────────────────────────

pub fn upsert_worker(conn: &Connection, w: &Worker) -> Result<()> {
  conn.execute(
    "INSERT INTO workers (worker_id, full_name, birth_date, sex, height_cm, status, deleted_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(worker_id) DO UPDATE SET
       full_name  = excluded.full_name,
       birth_date = excluded.birth_date,
       sex        = excluded.sex,
       height_cm  = excluded.height_cm,
       status     = excluded.status,
       deleted_at = excluded.deleted_at",
    params![
      encode_uuid(w.worker_id),
      w.full_name,
      encode_date(w.birth_date),
      w.sex.as_ref(),
      w.height_cm,
      w.status.as_ref(),
      w.deleted_at.map(encode_dt),
    ],
  )?;
  Ok(())
}

pub fn worker(conn: &Connection, id: Uuid) -> Result<Option<Worker>> {
  conn
    .query_row(
      &format!("SELECT {WORKER_COLUMNS} FROM workers WHERE worker_id = ?1"),
      params![encode_uuid(id)],
      RawWorker::from_row,
    )
    .optional()?
    .map(RawWorker::into_worker)
    .transpose()
}

pub fn require_worker(conn: &Connection, id: Uuid) -> Result<Worker> {
  worker(conn, id)?.ok_or_else(|| missing(Entity::Worker, id))
}

pub fn live_workers(conn: &Connection) -> Result<Vec<Worker>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {WORKER_COLUMNS} FROM workers WHERE deleted_at IS NULL ORDER BY full_name"
  ))?;
  let rows = stmt.query_map([], RawWorker::from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
  rows.into_iter().map(RawWorker::into_worker).collect()
}

/// Active, non-deleted workers, pre-filtered by a position's requirements
/// when a filter is given.
pub fn candidate_workers(conn: &Connection, filter: Option<&CandidateFilter>) -> Result<Vec<Worker>> {
  let born_after = filter.and_then(|f| f.born_after).map(encode_date);
  let born_by = filter.and_then(|f| f.born_on_or_before).map(encode_date);
  let min_height = filter.and_then(|f| f.min_height_cm);
  let sexes = filter
    .and_then(|f| f.sexes)
    .map(|sexes| serde_json::to_string(&sexes.iter().map(AsRef::<str>::as_ref).collect::<Vec<_>>()))
    .transpose()?;

  let mut stmt = conn.prepare(&format!(
    "SELECT {WORKER_COLUMNS} FROM workers
     WHERE deleted_at IS NULL
       AND status = 'active'
       AND (?1 IS NULL OR birth_date > ?1)
       AND (?2 IS NULL OR birth_date <= ?2)
       AND (?3 IS NULL OR (height_cm IS NOT NULL AND height_cm >= ?3))
       AND (?4 IS NULL OR sex IN (SELECT value FROM json_each(?4)))
     ORDER BY full_name"
  ))?;
  let rows = stmt
    .query_map(params![born_after, born_by, min_height, sexes], RawWorker::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  rows.into_iter().map(RawWorker::into_worker).collect()
}

/// Returns `false` when no live worker has that id.
pub fn soft_delete_worker(conn: &Connection, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
  let changed = conn.execute(
    "UPDATE workers SET deleted_at = ?2 WHERE worker_id = ?1 AND deleted_at IS NULL",
    params![encode_uuid(id), encode_dt(at)],
  )?;
  Ok(changed == 1)
}

// ─── Projects, positions, shifts ─────────────────────────────────────────────

pub fn upsert_project(conn: &Connection, p: &Project) -> Result<()> {
  conn.execute(
    "INSERT INTO projects (project_id, name, status) VALUES (?1, ?2, ?3)
     ON CONFLICT(project_id) DO UPDATE SET name = excluded.name, status = excluded.status",
    params![encode_uuid(p.project_id), p.name, p.status.as_ref()],
  )?;
  Ok(())
}

pub fn project(conn: &Connection, id: Uuid) -> Result<Option<Project>> {
  conn
    .query_row(
      &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ?1"),
      params![encode_uuid(id)],
      RawProject::from_row,
    )
    .optional()?
    .map(RawProject::into_project)
    .transpose()
}

pub fn require_project(conn: &Connection, id: Uuid) -> Result<Project> {
  project(conn, id)?.ok_or_else(|| missing(Entity::Project, id))
}

/// The display name used in conflict messages; `None` for the general pool.
pub fn project_name(conn: &Connection, id: Option<Uuid>) -> Result<Option<String>> {
  let Some(id) = id else { return Ok(None) };
  Ok(
    conn
      .query_row(
        "SELECT name FROM projects WHERE project_id = ?1",
        params![encode_uuid(id)],
        |row| row.get(0),
      )
      .optional()?,
  )
}

pub fn active_projects(conn: &Connection) -> Result<Vec<Project>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {PROJECT_COLUMNS} FROM projects WHERE status = 'active' ORDER BY name"
  ))?;
  let rows = stmt.query_map([], RawProject::from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
  rows.into_iter().map(RawProject::into_project).collect()
}

pub fn upsert_position(conn: &Connection, p: &PositionRequirement) -> Result<()> {
  conn.execute(
    "INSERT INTO positions (
       position_id, project_id, name, headcount, min_age, max_age,
       sex, min_height_cm, shift_id, pay_rate, bill_rate, active
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
     ON CONFLICT(position_id) DO UPDATE SET
       project_id    = excluded.project_id,
       name          = excluded.name,
       headcount     = excluded.headcount,
       min_age       = excluded.min_age,
       max_age       = excluded.max_age,
       sex           = excluded.sex,
       min_height_cm = excluded.min_height_cm,
       shift_id      = excluded.shift_id,
       pay_rate      = excluded.pay_rate,
       bill_rate     = excluded.bill_rate,
       active        = excluded.active",
    params![
      encode_uuid(p.position_id),
      encode_uuid(p.project_id),
      p.name,
      p.headcount,
      p.min_age,
      p.max_age,
      p.sex.map(|s| s.as_ref().to_owned()),
      p.min_height_cm,
      encode_uuid(p.shift_id),
      p.pay_rate.map(encode_decimal),
      p.bill_rate.map(encode_decimal),
      p.active,
    ],
  )?;
  Ok(())
}

pub fn position(conn: &Connection, id: Uuid) -> Result<Option<PositionRequirement>> {
  conn
    .query_row(
      &format!("SELECT {POSITION_COLUMNS} FROM positions WHERE position_id = ?1"),
      params![encode_uuid(id)],
      RawPosition::from_row,
    )
    .optional()?
    .map(RawPosition::into_position)
    .transpose()
}

pub fn require_position(conn: &Connection, id: Uuid) -> Result<PositionRequirement> {
  position(conn, id)?.ok_or_else(|| missing(Entity::Position, id))
}

pub fn positions_of(conn: &Connection, project_id: Uuid, active_only: bool) -> Result<Vec<PositionRequirement>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {POSITION_COLUMNS} FROM positions
     WHERE project_id = ?1 AND (?2 = 0 OR active = 1)
     ORDER BY name"
  ))?;
  let rows = stmt
    .query_map(params![encode_uuid(project_id), active_only], RawPosition::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  rows.into_iter().map(RawPosition::into_position).collect()
}

pub fn upsert_shift(conn: &Connection, s: &Shift) -> Result<()> {
  conn.execute(
    "INSERT INTO shifts (shift_id, name, start_time, end_time, duration_hours, requires_rest_rotation)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT(shift_id) DO UPDATE SET
       name                   = excluded.name,
       start_time             = excluded.start_time,
       end_time               = excluded.end_time,
       duration_hours         = excluded.duration_hours,
       requires_rest_rotation = excluded.requires_rest_rotation",
    params![
      encode_uuid(s.shift_id),
      s.name,
      encode_time(s.start_time),
      encode_time(s.end_time),
      s.duration_hours,
      s.requires_rest_rotation,
    ],
  )?;
  Ok(())
}

pub fn shift(conn: &Connection, id: Uuid) -> Result<Option<Shift>> {
  conn
    .query_row(
      &format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE shift_id = ?1"),
      params![encode_uuid(id)],
      RawShift::from_row,
    )
    .optional()?
    .map(RawShift::into_shift)
    .transpose()
}

pub fn require_shift(conn: &Connection, id: Uuid) -> Result<Shift> {
  shift(conn, id)?.ok_or_else(|| missing(Entity::Shift, id))
}

// ─── Assignments ─────────────────────────────────────────────────────────────

fn assignments_where(conn: &Connection, clause: &str, args: impl rusqlite::Params) -> Result<Vec<Assignment>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE {clause} ORDER BY start_date, created_at"
  ))?;
  let rows = stmt.query_map(args, RawAssignment::from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
  rows.into_iter().map(RawAssignment::into_assignment).collect()
}

pub fn assignment(conn: &Connection, id: Uuid) -> Result<Option<Assignment>> {
  Ok(assignments_where(conn, "assignment_id = ?1", params![encode_uuid(id)])?.pop())
}

pub fn require_assignment(conn: &Connection, id: Uuid) -> Result<Assignment> {
  assignment(conn, id)?.ok_or_else(|| missing(Entity::Assignment, id))
}

pub fn active_assignments_of_worker(conn: &Connection, worker_id: Uuid) -> Result<Vec<Assignment>> {
  assignments_where(conn, "worker_id = ?1 AND status = 'active'", params![encode_uuid(worker_id)])
}

pub fn active_assignments_of_position(conn: &Connection, position_id: Uuid) -> Result<Vec<Assignment>> {
  assignments_where(conn, "position_id = ?1 AND status = 'active'", params![encode_uuid(position_id)])
}

pub fn active_assignments(conn: &Connection) -> Result<Vec<Assignment>> {
  assignments_where(conn, "status = 'active'", [])
}

/// Active assignments grouped by worker.
pub fn active_assignments_by_worker(conn: &Connection) -> Result<HashMap<Uuid, Vec<Assignment>>> {
  let mut grouped: HashMap<Uuid, Vec<Assignment>> = HashMap::new();
  for a in active_assignments(conn)? {
    grouped.entry(a.worker_id).or_default().push(a);
  }
  Ok(grouped)
}

pub fn filtered_assignments(conn: &Connection, filter: &AssignmentFilter) -> Result<Vec<Assignment>> {
  assignments_where(
    conn,
    "(?1 IS NULL OR worker_id = ?1)
     AND (?2 IS NULL OR project_id = ?2)
     AND (?3 IS NULL OR position_id = ?3)
     AND (?4 IS NULL OR status = ?4)",
    params![
      filter.worker_id.map(encode_uuid),
      filter.project_id.map(encode_uuid),
      filter.position_id.map(encode_uuid),
      filter.status.map(|s| s.as_ref().to_owned()),
    ],
  )
}

pub fn insert_assignment(conn: &Connection, a: &Assignment) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO assignments ({ASSIGNMENT_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
    ),
    params![
      encode_uuid(a.assignment_id),
      encode_uuid(a.worker_id),
      a.project_id.map(encode_uuid),
      a.position_id.map(encode_uuid),
      encode_uuid(a.shift_id),
      encode_date(a.start_date),
      a.end_date.map(encode_date),
      a.status.as_ref(),
      a.suspension_reason,
      a.notes,
      encode_warnings(&a.warnings)?,
      encode_dt(a.created_at),
      encode_dt(a.updated_at),
    ],
  )?;
  Ok(())
}

/// Persist every mutable column of an existing assignment.
pub fn save_assignment(conn: &Connection, a: &Assignment) -> Result<()> {
  conn.execute(
    "UPDATE assignments SET
       shift_id          = ?2,
       start_date        = ?3,
       end_date          = ?4,
       status            = ?5,
       suspension_reason = ?6,
       notes             = ?7,
       warnings          = ?8,
       updated_at        = ?9
     WHERE assignment_id = ?1",
    params![
      encode_uuid(a.assignment_id),
      encode_uuid(a.shift_id),
      encode_date(a.start_date),
      a.end_date.map(encode_date),
      a.status.as_ref(),
      a.suspension_reason,
      a.notes,
      encode_warnings(&a.warnings)?,
      encode_dt(a.updated_at),
    ],
  )?;
  Ok(())
}

pub fn delete_assignment(conn: &Connection, id: Uuid) -> Result<()> {
  conn.execute("DELETE FROM assignments WHERE assignment_id = ?1", params![encode_uuid(id)])?;
  Ok(())
}

// ─── Attendance ──────────────────────────────────────────────────────────────

fn attendance_where(conn: &Connection, clause: &str, args: impl rusqlite::Params) -> Result<Vec<AttendanceRecord>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE {clause} ORDER BY attendance_date"
  ))?;
  let rows = stmt.query_map(args, RawAttendance::from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
  rows.into_iter().map(RawAttendance::into_record).collect()
}

pub fn attendance(conn: &Connection, id: Uuid) -> Result<Option<AttendanceRecord>> {
  Ok(attendance_where(conn, "attendance_id = ?1", params![encode_uuid(id)])?.pop())
}

pub fn require_attendance(conn: &Connection, id: Uuid) -> Result<AttendanceRecord> {
  attendance(conn, id)?.ok_or_else(|| missing(Entity::Attendance, id))
}

pub fn attendance_on(conn: &Connection, assignment_id: Uuid, date: NaiveDate) -> Result<Option<AttendanceRecord>> {
  Ok(
    attendance_where(
      conn,
      "assignment_id = ?1 AND attendance_date = ?2",
      params![encode_uuid(assignment_id), encode_date(date)],
    )?
    .pop(),
  )
}

pub fn attendance_of_assignment(
  conn: &Connection,
  assignment_id: Uuid,
  start: Option<NaiveDate>,
  end: Option<NaiveDate>,
) -> Result<Vec<AttendanceRecord>> {
  attendance_where(
    conn,
    "assignment_id = ?1
     AND (?2 IS NULL OR attendance_date >= ?2)
     AND (?3 IS NULL OR attendance_date <= ?3)",
    params![encode_uuid(assignment_id), start.map(encode_date), end.map(encode_date)],
  )
}

/// Records of every assignment the worker held, within `[start, end]`.
pub fn attendance_of_worker(
  conn: &Connection,
  worker_id: Uuid,
  start: NaiveDate,
  end: NaiveDate,
) -> Result<Vec<AttendanceRecord>> {
  attendance_where(
    conn,
    "assignment_id IN (SELECT assignment_id FROM assignments WHERE worker_id = ?1)
     AND attendance_date BETWEEN ?2 AND ?3",
    params![encode_uuid(worker_id), encode_date(start), encode_date(end)],
  )
}

pub fn attendance_count(conn: &Connection, assignment_id: Uuid) -> Result<u64> {
  let count: i64 = conn.query_row(
    "SELECT COUNT(*) FROM attendance WHERE assignment_id = ?1",
    params![encode_uuid(assignment_id)],
    |row| row.get(0),
  )?;
  Ok(count.unsigned_abs())
}

/// Insert or replace the record for `(assignment_id, date)`. An existing row
/// keeps its id; the stored record is returned.
pub fn upsert_attendance(conn: &Connection, r: &AttendanceRecord) -> Result<AttendanceRecord> {
  conn.execute(
    &format!(
      "INSERT INTO attendance ({ATTENDANCE_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
       ON CONFLICT(assignment_id, attendance_date) DO UPDATE SET
         entry_time            = excluded.entry_time,
         exit_time             = excluded.exit_time,
         is_rest_day           = excluded.is_rest_day,
         was_replaced          = excluded.was_replaced,
         replacement_worker_id = excluded.replacement_worker_id,
         replacement_reason    = excluded.replacement_reason,
         is_late               = excluded.is_late,
         minutes_late          = excluded.minutes_late,
         notes                 = excluded.notes,
         recorded_by           = excluded.recorded_by,
         recorded_at           = excluded.recorded_at"
    ),
    params![
      encode_uuid(r.attendance_id),
      encode_uuid(r.assignment_id),
      encode_date(r.date),
      r.entry_time.map(encode_time),
      r.exit_time.map(encode_time),
      r.is_rest_day,
      r.was_replaced,
      r.replacement_worker_id.map(encode_uuid),
      r.replacement_reason,
      r.is_late,
      r.minutes_late,
      r.notes,
      r.recorded_by.map(encode_uuid),
      encode_dt(r.recorded_at),
    ],
  )?;
  attendance_on(conn, r.assignment_id, r.date)?
    .ok_or_else(|| staffing_core::Error::InvariantViolation("attendance upsert left no row".into()).into())
}

pub fn delete_attendance(conn: &Connection, attendance_id: Uuid) -> Result<()> {
  conn.execute("DELETE FROM attendance WHERE attendance_id = ?1", params![encode_uuid(attendance_id)])?;
  Ok(())
}

/// Insert a rest day unless a record for that day already exists. Returns
/// whether a row was created.
pub fn insert_rest_day(conn: &Connection, assignment_id: Uuid, date: NaiveDate, at: DateTime<Utc>) -> Result<bool> {
  let created = conn.execute(
    "INSERT INTO attendance (attendance_id, assignment_id, attendance_date, is_rest_day, recorded_at)
     VALUES (?1, ?2, ?3, 1, ?4)
     ON CONFLICT(assignment_id, attendance_date) DO NOTHING",
    params![encode_uuid(Uuid::new_v4()), encode_uuid(assignment_id), encode_date(date), encode_dt(at)],
  )?;
  Ok(created == 1)
}
