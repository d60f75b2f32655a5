//! [`Directory`] impl: reference data mirrored from the personnel, project
//! and shift catalog modules.

use staffing_core::{
  engine::Directory,
  personnel::Worker,
  project::{PositionRequirement, Project},
  shift::Shift,
};
use uuid::Uuid;

use crate::{Error, Result, SqliteStore, queries};

impl Directory for SqliteStore {
  type Error = Error;

  // ── Workers ───────────────────────────────────────────────────────────────

  async fn put_worker(&self, worker: Worker) -> Result<Worker> {
    self
      .write(move |tx, _| {
        queries::upsert_worker(tx, &worker)?;
        Ok(worker)
      })
      .await
  }

  async fn get_worker(&self, id: Uuid) -> Result<Option<Worker>> {
    self.read(move |conn, _| queries::worker(conn, id)).await
  }

  async fn list_workers(&self) -> Result<Vec<Worker>> { self.read(|conn, _| queries::live_workers(conn)).await }

  async fn soft_delete_worker(&self, id: Uuid) -> Result<()> {
    self
      .write(move |tx, ctx| {
        if queries::soft_delete_worker(tx, id, ctx.now)? {
          tracing::info!(worker_id = %id, "worker soft-deleted");
          return Ok(());
        }
        // Already deleted is a no-op; unknown is not.
        queries::require_worker(tx, id).map(|_| ())
      })
      .await
  }

  // ── Projects & positions ──────────────────────────────────────────────────

  async fn put_project(&self, project: Project) -> Result<Project> {
    self
      .write(move |tx, _| {
        queries::upsert_project(tx, &project)?;
        Ok(project)
      })
      .await
  }

  async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
    self.read(move |conn, _| queries::project(conn, id)).await
  }

  async fn put_position(&self, position: PositionRequirement) -> Result<PositionRequirement> {
    self
      .write(move |tx, _| {
        queries::require_project(tx, position.project_id)?;
        queries::require_shift(tx, position.shift_id)?;
        if position.min_age > position.max_age {
          return Err(
            staffing_core::Error::InvalidRequirement {
              position_id: position.position_id,
              reason:      format!("age range {}..{} is empty", position.min_age, position.max_age),
            }
            .into(),
          );
        }
        queries::upsert_position(tx, &position)?;
        Ok(position)
      })
      .await
  }

  async fn get_position(&self, id: Uuid) -> Result<Option<PositionRequirement>> {
    self.read(move |conn, _| queries::position(conn, id)).await
  }

  async fn list_positions(&self, project_id: Uuid) -> Result<Vec<PositionRequirement>> {
    self
      .read(move |conn, _| {
        queries::require_project(conn, project_id)?;
        queries::positions_of(conn, project_id, false)
      })
      .await
  }

  // ── Shifts ────────────────────────────────────────────────────────────────

  async fn put_shift(&self, shift: Shift) -> Result<Shift> {
    self
      .write(move |tx, _| {
        queries::upsert_shift(tx, &shift)?;
        Ok(shift)
      })
      .await
  }

  async fn get_shift(&self, id: Uuid) -> Result<Option<Shift>> {
    self.read(move |conn, _| queries::shift(conn, id)).await
  }
}
