use staffing_core::{
  Error as CoreError,
  engine::{AssignmentEngine, AvailabilityService, Directory},
  personnel::{Sex, WorkerStatus},
  project::{PositionRequirement, RequiredSex},
  settings::EngineSettings,
};
use uuid::Uuid;

use super::{Fixture, d, domain, today};

#[tokio::test]
async fn availability_follows_active_assignments() {
  let fx = Fixture::new().await;
  let ana = fx.worker("Ana").await;
  let a = fx.store.create(fx.guard_duty(&ana, d(2025, 1, 1), Some(d(2025, 3, 31)))).await.unwrap();

  let id = ana.worker_id;
  assert!(!fx.store.is_available(id, d(2025, 3, 15), None, None).await.unwrap());
  assert!(fx.store.is_available(id, d(2025, 4, 1), None, None).await.unwrap());
  assert!(fx.store.is_available(id, d(2025, 3, 15), None, Some(a.assignment_id)).await.unwrap());

  fx.store.suspend(a.assignment_id, "leave".into()).await.unwrap();
  assert!(fx.store.is_available(id, d(2025, 3, 15), None, None).await.unwrap());
}

#[tokio::test]
async fn available_workers_excludes_busy_inactive_and_deleted() {
  let fx = Fixture::new().await;
  let busy = fx.worker("Busy").await;
  fx.store.create(fx.guard_duty(&busy, d(2025, 1, 1), None)).await.unwrap();
  fx.worker("Free").await;
  let mut inactive = fx.worker("Inactive").await;
  inactive.status = WorkerStatus::Inactive;
  fx.store.put_worker(inactive).await.unwrap();
  let gone = fx.worker("Gone").await;
  fx.store.soft_delete_worker(gone.worker_id).await.unwrap();

  let names: Vec<_> = fx
    .store
    .list_available_workers(today(), Some(d(2025, 2, 28)), None)
    .await
    .unwrap()
    .into_iter()
    .map(|w| w.full_name)
    .collect();
  assert_eq!(names, vec!["Free"]);
}

#[tokio::test]
async fn position_prefilter_matches_requirements() {
  let fx = Fixture::new().await;
  let tall_men = fx
    .store
    .put_position(PositionRequirement {
      position_id: Uuid::new_v4(),
      name: "Door".into(),
      min_age: 21,
      max_age: 40,
      sex: Some(RequiredSex::Male),
      min_height_cm: Some(180),
      ..fx.guard.clone()
    })
    .await
    .unwrap();

  fx.worker_with("Fits", d(1995, 2, 1), Sex::Male, Some(185)).await;
  fx.worker_with("Short", d(1995, 2, 1), Sex::Male, Some(170)).await;
  fx.worker_with("No height", d(1995, 2, 1), Sex::Male, None).await;
  fx.worker_with("Woman", d(1995, 2, 1), Sex::Female, Some(185)).await;
  fx.worker_with("Too young", d(2004, 2, 2), Sex::Male, Some(185)).await;
  fx.worker_with("Just 21", d(2004, 2, 1), Sex::Male, Some(185)).await;
  fx.worker_with("Too old", d(1984, 1, 31), Sex::Male, Some(185)).await;

  let mut names: Vec<_> = fx
    .store
    .list_available_workers(today(), None, Some(tall_men.position_id))
    .await
    .unwrap()
    .into_iter()
    .map(|w| w.full_name)
    .collect();
  names.sort();
  assert_eq!(names, vec!["Fits", "Just 21"]);
}

#[tokio::test]
async fn calendar_marks_each_day() {
  let fx = Fixture::new().await;
  let ana = fx.worker("Ana").await;
  let a = fx.store.create(fx.guard_duty(&ana, d(2025, 1, 10), Some(d(2025, 1, 12)))).await.unwrap();

  let cal = fx.store.calendar(ana.worker_id, d(2025, 1, 9), d(2025, 1, 13)).await.unwrap();
  assert_eq!(cal.len(), 5);
  let busy: Vec<_> = cal.iter().filter(|(_, day)| !day.available).map(|(date, _)| *date).collect();
  assert_eq!(busy, vec![d(2025, 1, 10), d(2025, 1, 11), d(2025, 1, 12)]);
  assert_eq!(cal[&d(2025, 1, 11)].assignment_id, Some(a.assignment_id));
  assert_eq!(cal[&d(2025, 1, 11)].project_id, Some(fx.project_a.project_id));
  assert!(cal[&d(2025, 1, 13)].available);
}

#[tokio::test]
async fn calendar_rejects_bad_ranges() {
  let fx = Fixture::new().await;
  let ana = fx.worker("Ana").await;

  let err = domain(fx.store.calendar(ana.worker_id, d(2025, 2, 1), d(2025, 1, 1)).await.unwrap_err());
  assert!(matches!(err, CoreError::InvalidRange(_)));

  let err = domain(fx.store.calendar(ana.worker_id, d(2025, 1, 1), d(2025, 6, 30)).await.unwrap_err());
  assert!(matches!(err, CoreError::RangeTooLong { max: 90, .. }));

  let roomy = fx.store.clone().with_settings(EngineSettings { max_calendar_days: 365, ..EngineSettings::default() });
  assert_eq!(roomy.calendar(ana.worker_id, d(2025, 1, 1), d(2025, 6, 30)).await.unwrap().len(), 181);
}

#[tokio::test]
async fn coverage_counts_assignments_covering_today() {
  let fx = Fixture::new().await;
  let ana = fx.worker("Ana").await;
  let bea = fx.worker("Bea").await;
  fx.store.create(fx.guard_duty(&ana, d(2025, 1, 1), None)).await.unwrap();
  // Starts later, so not covering today.
  fx.store.create(fx.guard_duty(&bea, d(2025, 3, 1), None)).await.unwrap();
  let mut idle = fx.position("Idle", 1).await;
  idle.active = false;
  fx.store.put_position(idle).await.unwrap();

  let stats = fx.store.project_coverage_stats(fx.project_a.project_id).await.unwrap();
  assert_eq!(stats.len(), 1);
  let guard = &stats[0];
  assert_eq!((guard.required, guard.assigned, guard.shortfall), (2, 1, 1));
  assert_eq!(guard.pct_covered, 50.0);
}
