//! [`AvailabilityService`] impl.

use chrono::NaiveDate;
use staffing_core::{
  assignment::find_conflict,
  availability::{Calendar, bounded_range, build_calendar},
  coverage::CoverageStat,
  engine::AvailabilityService,
  matcher::CandidateFilter,
  personnel::Worker,
  range::DateRange,
};
use uuid::Uuid;

use crate::{Error, Result, SqliteStore, queries};

fn valid_range(start: NaiveDate, end: Option<NaiveDate>) -> Result<DateRange> {
  let range = DateRange::new(start, end);
  if range.is_valid() { Ok(range) } else { Err(staffing_core::Error::InvalidRange(range).into()) }
}

impl AvailabilityService for SqliteStore {
  type Error = Error;

  async fn is_available(
    &self,
    worker_id: Uuid,
    start: NaiveDate,
    end: Option<NaiveDate>,
    exclude: Option<Uuid>,
  ) -> Result<bool> {
    self
      .read(move |conn, _| {
        let range = valid_range(start, end)?;
        queries::require_worker(conn, worker_id)?;
        let held = queries::active_assignments_of_worker(conn, worker_id)?;
        Ok(find_conflict(&range, &held, exclude).is_none())
      })
      .await
  }

  async fn list_available_workers(
    &self,
    start: NaiveDate,
    end: Option<NaiveDate>,
    position_id: Option<Uuid>,
  ) -> Result<Vec<Worker>> {
    self
      .read(move |conn, ctx| {
        let range = valid_range(start, end)?;
        let filter = position_id
          .map(|id| queries::require_position(conn, id))
          .transpose()?
          .map(|position| CandidateFilter::for_position(&position, ctx.today));

        let candidates = queries::candidate_workers(conn, filter.as_ref())?;
        let busy = queries::active_assignments_by_worker(conn)?;
        Ok(
          candidates
            .into_iter()
            .filter(|w| {
              busy.get(&w.worker_id).is_none_or(|held| find_conflict(&range, held, None).is_none())
            })
            .collect(),
        )
      })
      .await
  }

  async fn calendar(&self, worker_id: Uuid, start: NaiveDate, end: NaiveDate) -> Result<Calendar> {
    self
      .read(move |conn, ctx| {
        let range = bounded_range(start, end, ctx.settings.max_calendar_days)?;
        queries::require_worker(conn, worker_id)?;
        let held = queries::active_assignments_of_worker(conn, worker_id)?;
        Ok(build_calendar(range, &held))
      })
      .await
  }

  async fn project_coverage_stats(&self, project_id: Uuid) -> Result<Vec<CoverageStat>> {
    self
      .read(move |conn, ctx| {
        queries::require_project(conn, project_id)?;
        queries::positions_of(conn, project_id, true)?
          .into_iter()
          .map(|position| -> Result<CoverageStat> {
            let holders = queries::active_assignments_of_position(conn, position.position_id)?;
            let assigned = holders.iter().filter(|a| a.range().contains(ctx.today)).count() as u32;
            Ok(CoverageStat::new(&position, assigned))
          })
          .collect()
      })
      .await
  }
}
