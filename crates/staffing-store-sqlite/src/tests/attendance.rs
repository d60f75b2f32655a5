use staffing_core::{
  Entity, Error as CoreError,
  assignment::{Assignment, NewAssignment},
  attendance::{AttendanceInput, BulkEntry, DayStatus, GeneratedRestDay},
  engine::{AssignmentEngine, AttendanceEngine, Directory},
};
use uuid::Uuid;

use super::{Fixture, d, domain, t};

async fn on_duty(fx: &Fixture, name: &str) -> Assignment {
  let w = fx.worker(name).await;
  fx.store.create(fx.guard_duty(&w, d(2025, 1, 1), Some(d(2025, 3, 31)))).await.unwrap()
}

async fn rotating_from_new_year(fx: &Fixture, name: &str) -> Assignment {
  let w = fx.worker(name).await;
  let input = NewAssignment { shift_id: fx.rotating.shift_id, ..fx.on_project(&w, &fx.project_b, d(2025, 1, 1), None) };
  fx.store.create(input).await.unwrap()
}

// ─── Recording ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn rest_day_discards_supplied_times() {
  let fx = Fixture::new().await;
  let a = on_duty(&fx, "Ana").await;
  let input = AttendanceInput { entry_time: Some(t(9, 30)), is_rest_day: true, ..AttendanceInput::default() };

  let r = fx.store.record(a.assignment_id, d(2025, 1, 5), input, None).await.unwrap();
  assert!(r.is_rest_day);
  assert_eq!((r.entry_time, r.exit_time), (None, None));
  assert!(!r.is_late);
  assert_eq!(r.minutes_late, 0);
  assert_eq!(r.day_status(), DayStatus::Rest);
}

#[tokio::test]
async fn lateness_respects_the_tolerance() {
  let fx = Fixture::new().await;
  let a = on_duty(&fx, "Ana").await;

  let on_time = fx.store.record(a.assignment_id, d(2025, 1, 6), AttendanceInput::present(t(6, 4), None), None).await.unwrap();
  assert!(!on_time.is_late);
  assert_eq!(on_time.minutes_late, 0);

  let late = fx.store.record(a.assignment_id, d(2025, 1, 7), AttendanceInput::present(t(6, 10), None), None).await.unwrap();
  assert!(late.is_late);
  assert_eq!(late.minutes_late, 10);
}

#[tokio::test]
async fn one_record_per_assignment_and_day() {
  let fx = Fixture::new().await;
  let a = on_duty(&fx, "Ana").await;
  let actor = Some(Uuid::new_v4());

  let first = fx.store.record(a.assignment_id, d(2025, 1, 6), AttendanceInput::default(), actor).await.unwrap();
  assert_eq!(first.day_status(), DayStatus::Absent);
  let second = fx
    .store
    .record(a.assignment_id, d(2025, 1, 6), AttendanceInput::present(t(6, 0), Some(t(14, 0))), actor)
    .await
    .unwrap();

  assert_eq!(second.attendance_id, first.attendance_id);
  assert_eq!(second.hours_worked(), 8.0);
  assert_eq!(second.recorded_by, actor);
  assert_eq!(fx.store.list_attendance(a.assignment_id, None, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn dates_outside_the_assignment_are_rejected() {
  let fx = Fixture::new().await;
  let a = on_duty(&fx, "Ana").await;
  for date in [d(2024, 12, 31), d(2025, 4, 1)] {
    let err = domain(fx.store.record(a.assignment_id, date, AttendanceInput::default(), None).await.unwrap_err());
    assert!(matches!(err, CoreError::OutOfRange { .. }));
  }
  // Both ends are inclusive.
  fx.store.record(a.assignment_id, d(2025, 3, 31), AttendanceInput::default(), None).await.unwrap();
}

#[tokio::test]
async fn unknown_assignment_is_not_found() {
  let fx = Fixture::new().await;
  let err = domain(fx.store.record(Uuid::new_v4(), d(2025, 1, 1), AttendanceInput::default(), None).await.unwrap_err());
  assert!(matches!(err, CoreError::NotFound { entity: Entity::Assignment, .. }));
}

#[tokio::test]
async fn mark_entry_then_exit() {
  let fx = Fixture::new().await;
  let a = on_duty(&fx, "Ana").await;
  let blank = fx.store.record(a.assignment_id, d(2025, 1, 6), AttendanceInput::default(), None).await.unwrap();

  let err = domain(fx.store.mark_exit(blank.attendance_id, t(14, 0), None).await.unwrap_err());
  assert!(matches!(err, CoreError::MissingEntry));

  let entered = fx.store.mark_entry(blank.attendance_id, t(6, 20), None).await.unwrap();
  assert_eq!(entered.minutes_late, 20);
  let left = fx.store.mark_exit(blank.attendance_id, t(14, 0), None).await.unwrap();
  assert_eq!(left.entry_time, Some(t(6, 20)));
  assert_eq!(left.exit_time, Some(t(14, 0)));
  assert!(left.is_late);
}

// ─── Replacements ────────────────────────────────────────────────────────────

fn replaced_by(worker_id: Uuid, reason: &str) -> AttendanceInput {
  AttendanceInput {
    was_replaced: true,
    replacement_worker_id: Some(worker_id),
    replacement_reason: Some(reason.into()),
    ..AttendanceInput::default()
  }
}

#[tokio::test]
async fn free_worker_can_replace() {
  let fx = Fixture::new().await;
  let a = on_duty(&fx, "Ana").await;
  let spare = fx.worker("Spare").await;

  let r = fx.store.record(a.assignment_id, d(2025, 1, 6), replaced_by(spare.worker_id, "sick"), None).await.unwrap();
  assert_eq!(r.day_status(), DayStatus::Replaced);
  assert_eq!(r.replacement_reason.as_deref(), Some("sick"));
}

#[tokio::test]
async fn replacement_needs_worker_and_reason() {
  let fx = Fixture::new().await;
  let a = on_duty(&fx, "Ana").await;
  let input = AttendanceInput { was_replaced: true, replacement_reason: Some("sick".into()), ..AttendanceInput::default() };
  let err = domain(fx.store.record(a.assignment_id, d(2025, 1, 6), input, None).await.unwrap_err());
  assert!(matches!(err, CoreError::ReplacementIncomplete));
}

#[tokio::test]
async fn busy_replacement_is_unavailable() {
  let fx = Fixture::new().await;
  let a = on_duty(&fx, "Ana").await;
  let busy = on_duty(&fx, "Bea").await;

  let err = domain(
    fx.store
      .record(a.assignment_id, d(2025, 1, 6), replaced_by(busy.worker_id, "sick"), None)
      .await
      .unwrap_err(),
  );
  let CoreError::ReplacementUnavailable { reason, .. } = err else { panic!("expected unavailable replacement") };
  assert!(reason.contains("Project A"), "{reason}");
}

#[tokio::test]
async fn deleted_or_inactive_replacements_are_unavailable() {
  let fx = Fixture::new().await;
  let a = on_duty(&fx, "Ana").await;
  let gone = fx.worker("Gone").await;
  fx.store.soft_delete_worker(gone.worker_id).await.unwrap();

  for worker_id in [gone.worker_id, Uuid::new_v4(), a.worker_id] {
    let err = domain(
      fx.store
        .record(a.assignment_id, d(2025, 1, 6), replaced_by(worker_id, "sick"), None)
        .await
        .unwrap_err(),
    );
    assert!(matches!(err, CoreError::ReplacementUnavailable { .. }));
  }
}

// ─── Bulk ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn bulk_is_all_or_nothing() {
  let fx = Fixture::new().await;
  let a = on_duty(&fx, "Ana").await;
  let entry = |date, input| BulkEntry { assignment_id: a.assignment_id, date, input };

  let outcome = fx
    .store
    .bulk_record(
      vec![
        entry(d(2025, 1, 6), AttendanceInput::present(t(6, 0), None)),
        entry(d(2025, 1, 7), AttendanceInput { exit_time: Some(t(14, 0)), ..AttendanceInput::default() }),
        entry(d(2025, 5, 1), AttendanceInput::default()),
      ],
      None,
    )
    .await
    .unwrap();

  assert!(!outcome.is_committed());
  assert!(outcome.succeeded.is_empty());
  let indices: Vec<_> = outcome.failed.iter().map(|f| f.index).collect();
  assert_eq!(indices, vec![1, 2]);
  assert!(fx.store.list_attendance(a.assignment_id, None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn bulk_commits_when_every_entry_passes() {
  let fx = Fixture::new().await;
  let a = on_duty(&fx, "Ana").await;
  let entries = (6..=10)
    .map(|day| BulkEntry {
      assignment_id: a.assignment_id,
      date:          d(2025, 1, day),
      input:         AttendanceInput::present(t(6, 0), Some(t(14, 0))),
    })
    .collect();

  let outcome = fx.store.bulk_record(entries, None).await.unwrap();
  assert!(outcome.is_committed());
  assert_eq!(outcome.succeeded.len(), 5);
  let stored = fx.store.list_attendance(a.assignment_id, Some(d(2025, 1, 7)), Some(d(2025, 1, 8))).await.unwrap();
  assert_eq!(stored.len(), 2);
}

// ─── Rest days ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn rotating_shift_rests_every_other_day() {
  let fx = Fixture::new().await;
  let a = rotating_from_new_year(&fx, "Ana").await;
  on_duty(&fx, "Bea").await;

  let created = fx.store.generate_rest_days(d(2025, 1, 1), d(2025, 1, 4)).await.unwrap();
  assert_eq!(created, vec![
    GeneratedRestDay { assignment_id: a.assignment_id, date: d(2025, 1, 2) },
    GeneratedRestDay { assignment_id: a.assignment_id, date: d(2025, 1, 4) },
  ]);
}

#[tokio::test]
async fn rest_day_generation_is_idempotent() {
  let fx = Fixture::new().await;
  let a = rotating_from_new_year(&fx, "Ana").await;
  // A day already recorded is left alone.
  fx.store.record(a.assignment_id, d(2025, 1, 4), AttendanceInput::present(t(7, 0), None), None).await.unwrap();

  let first = fx.store.generate_rest_days(d(2025, 1, 1), d(2025, 1, 10)).await.unwrap();
  assert_eq!(first.len(), 4);
  assert!(fx.store.generate_rest_days(d(2025, 1, 1), d(2025, 1, 10)).await.unwrap().is_empty());

  let worked = fx.store.list_attendance(a.assignment_id, Some(d(2025, 1, 4)), Some(d(2025, 1, 4))).await.unwrap();
  assert!(!worked[0].is_rest_day);
}

#[tokio::test]
async fn inverted_rest_day_window_is_invalid() {
  let fx = Fixture::new().await;
  let err = domain(fx.store.generate_rest_days(d(2025, 1, 10), d(2025, 1, 1)).await.unwrap_err());
  assert!(matches!(err, CoreError::InvalidRange(_)));
}

// ─── History ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn history_summarises_the_window() {
  let fx = Fixture::new().await;
  let a = on_duty(&fx, "Ana").await;
  let day = |n| d(2025, 1, n);
  let id = a.assignment_id;

  fx.store.record(id, day(6), AttendanceInput::present(t(6, 0), Some(t(14, 0))), None).await.unwrap();
  fx.store.record(id, day(7), AttendanceInput::present(t(6, 15), Some(t(14, 0))), None).await.unwrap();
  fx.store.record(id, day(8), AttendanceInput::default(), None).await.unwrap();
  fx.store.record(id, day(9), AttendanceInput::rest_day(), None).await.unwrap();
  fx.store.record(id, day(20), AttendanceInput::present(t(6, 0), None), None).await.unwrap();

  let history = fx.store.history_for_worker(a.worker_id, day(6), day(10)).await.unwrap();
  let s = &history.summary;
  assert_eq!(history.records.len(), 4);
  assert_eq!((s.total_days, s.days_worked, s.days_rest, s.days_absent), (4, 2, 1, 1));
  assert_eq!((s.days_late, s.minutes_late_total), (1, 15));
  assert_eq!(s.hours_total, 15.75);
  assert_eq!(s.attendance_pct, 66.67);
}

#[tokio::test]
async fn empty_history_is_zero_percent() {
  let fx = Fixture::new().await;
  let ana = fx.worker("Ana").await;
  let history = fx.store.history_for_worker(ana.worker_id, d(2025, 1, 1), d(2025, 1, 31)).await.unwrap();
  assert_eq!(history.summary.total_days, 0);
  assert_eq!(history.summary.attendance_pct, 0.0);
}
