//! Integration tests for `SqliteStore` against an in-memory database.
//!
//! Every test pins the clock so "today" is stable.

mod attendance;
mod availability;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use staffing_core::{
  assignment::NewAssignment,
  engine::Directory,
  personnel::{Sex, Worker, WorkerStatus},
  project::{PositionRequirement, Project, ProjectStatus, RequiredSex},
  settings::Clock,
  shift::Shift,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

pub(super) fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

pub(super) fn t(h: u32, m: u32) -> NaiveTime { NaiveTime::from_hms_opt(h, m, 0).unwrap() }

pub(super) fn today() -> NaiveDate { d(2025, 2, 1) }

/// Unwrap the business-rule error, failing on infrastructure errors.
pub(super) fn domain(err: Error) -> staffing_core::Error {
  match err {
    Error::Domain(e) => e,
    other => panic!("expected a domain error, got {other:?}"),
  }
}

// ─── Fixture ─────────────────────────────────────────────────────────────────

pub(super) struct Fixture {
  pub store:     SqliteStore,
  pub day_shift: Shift,
  pub rotating:  Shift,
  pub project_a: Project,
  pub project_b: Project,
  /// Project A, headcount 2, ages 18–60, either sex.
  pub guard:     PositionRequirement,
}

impl Fixture {
  pub async fn new() -> Self {
    let store = SqliteStore::open_in_memory()
      .await
      .expect("in-memory store")
      .with_clock(Clock::Fixed(today()));

    let day_shift = store
      .put_shift(Shift {
        shift_id:               Uuid::new_v4(),
        name:                   "Day".into(),
        start_time:             t(6, 0),
        end_time:               t(14, 0),
        duration_hours:         8.0,
        requires_rest_rotation: false,
      })
      .await
      .unwrap();
    let rotating = store
      .put_shift(Shift {
        shift_id:               Uuid::new_v4(),
        name:                   "24x24".into(),
        start_time:             t(7, 0),
        end_time:               t(7, 0),
        duration_hours:         24.0,
        requires_rest_rotation: true,
      })
      .await
      .unwrap();

    let project_a = store
      .put_project(Project { project_id: Uuid::new_v4(), name: "Project A".into(), status: ProjectStatus::Active })
      .await
      .unwrap();
    let project_b = store
      .put_project(Project { project_id: Uuid::new_v4(), name: "Project B".into(), status: ProjectStatus::Active })
      .await
      .unwrap();

    let guard = store
      .put_position(PositionRequirement {
        position_id:   Uuid::new_v4(),
        project_id:    project_a.project_id,
        name:          "Guard".into(),
        headcount:     2,
        min_age:       18,
        max_age:       60,
        sex:           Some(RequiredSex::Either),
        min_height_cm: None,
        shift_id:      day_shift.shift_id,
        pay_rate:      Some(Decimal::new(1500, 2)),
        bill_rate:     Some(Decimal::new(2250, 2)),
        active:        true,
      })
      .await
      .unwrap();

    Self { store, day_shift, rotating, project_a, project_b, guard }
  }

  pub async fn worker(&self, name: &str) -> Worker { self.worker_with(name, d(1990, 5, 5), Sex::Female, Some(170)).await }

  pub async fn worker_with(&self, name: &str, birth_date: NaiveDate, sex: Sex, height_cm: Option<u16>) -> Worker {
    self
      .store
      .put_worker(Worker {
        worker_id: Uuid::new_v4(),
        full_name: name.into(),
        birth_date,
        sex,
        height_cm,
        status: WorkerStatus::Active,
        deleted_at: None,
      })
      .await
      .unwrap()
  }

  pub async fn position(&self, name: &str, headcount: u32) -> PositionRequirement {
    self
      .store
      .put_position(PositionRequirement {
        position_id: Uuid::new_v4(),
        name: name.into(),
        headcount,
        ..self.guard.clone()
      })
      .await
      .unwrap()
  }

  /// A placement on the guard position of project A using the day shift.
  pub fn guard_duty(&self, worker: &Worker, start: NaiveDate, end: Option<NaiveDate>) -> NewAssignment {
    NewAssignment {
      worker_id:   worker.worker_id,
      project_id:  Some(self.project_a.project_id),
      position_id: Some(self.guard.position_id),
      shift_id:    self.day_shift.shift_id,
      start_date:  start,
      end_date:    end,
      notes:       None,
    }
  }

  /// A placement on a project with no position.
  pub fn on_project(&self, worker: &Worker, project: &Project, start: NaiveDate, end: Option<NaiveDate>) -> NewAssignment {
    NewAssignment {
      worker_id:   worker.worker_id,
      project_id:  Some(project.project_id),
      position_id: None,
      shift_id:    self.day_shift.shift_id,
      start_date:  start,
      end_date:    end,
      notes:       None,
    }
  }
}
