//! End-to-end reminder lifecycles through the service.

use crate::helpers::{AlarmCall, DAY, HOUR, march, utc_service};
use nudge::store::{MemoryTaskStore, TaskStore};
use nudge::{JobKind, QuietWindow, ReminderConfig, ScheduledJob, TaskId};
use std::time::Duration;

fn all_day(id: u64, due: u64) -> ReminderConfig {
    ReminderConfig {
        due_date: Some(due),
        notify_at_deadline: true,
        ..ReminderConfig::new(id)
    }
}

#[test]
fn all_day_task_reminds_daily_with_jitter() {
    let store = MemoryTaskStore::new();
    store.insert(all_day(1, march(4, 0, 0)));
    let (svc, alarm, notifier) = utc_service(store, QuietWindow::disabled());

    assert_eq!(svc.rebuild(march(4, 9, 0)).unwrap(), 1);
    assert_eq!(svc.queued_jobs(), [ScheduledJob::new(1, JobKind::Due, march(4, 18, 0))]);
    assert_eq!(alarm.last(), Some(AlarmCall::Schedule(march(4, 18, 0))));

    let fired = svc.on_wake(march(4, 18, 0)).unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(notifier.fired(), fired);

    let next = svc.queued_jobs();
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].kind, JobKind::Due);
    assert!((march(5, 18, 0)..march(5, 19, 0)).contains(&next[0].trigger_time));
    assert_eq!(alarm.last(), Some(AlarmCall::Schedule(next[0].trigger_time)));
}

#[test]
fn overdue_task_nags_once_a_day_at_deadline_time() {
    let store = MemoryTaskStore::new();
    store.insert(ReminderConfig {
        due_date: Some(march(4, 9, 0)),
        has_due_time: true,
        notify_after_deadline: true,
        ..ReminderConfig::new(2)
    });
    let (svc, _, _) = utc_service(store, QuietWindow::disabled());

    svc.rebuild(march(4, 10, 0)).unwrap();
    let first = march(5, 9, 0) + 1_000;
    assert_eq!(svc.queued_jobs(), [ScheduledJob::new(2, JobKind::Overdue, first)]);

    svc.on_wake(first).unwrap();
    let task = svc.store().reminder_config(TaskId(2)).unwrap().unwrap();
    assert_eq!(task.last_reminder_fired, Some(first));
    assert_eq!(
        svc.queued_jobs(),
        [ScheduledJob::new(2, JobKind::Overdue, first + DAY)]
    );
}

#[test]
fn quiet_hours_delay_the_wake_not_the_job() {
    let night = QuietWindow::new(
        true,
        Duration::from_secs(22 * 3600),
        Duration::from_secs(8 * 3600),
    )
    .unwrap();
    let store = MemoryTaskStore::new();
    store.insert(ReminderConfig {
        due_date: Some(march(4, 23, 0)),
        has_due_time: true,
        notify_at_deadline: true,
        ..ReminderConfig::new(3)
    });
    let (svc, alarm, notifier) = utc_service(store, night);

    svc.rebuild(march(4, 12, 0)).unwrap();
    // A future timed deadline is queued as-is; only the wake moves.
    assert_eq!(svc.queued_jobs()[0].trigger_time, march(4, 23, 0));
    assert_eq!(svc.next_wake(), Some(march(5, 8, 0)));
    assert_eq!(alarm.last(), Some(AlarmCall::Schedule(march(5, 8, 0))));

    let fired = svc.on_wake(march(5, 8, 0)).unwrap();
    assert_eq!(fired, [ScheduledJob::new(3, JobKind::Due, march(4, 23, 0))]);
    assert_eq!(notifier.fired().len(), 1);
    // Already reminded on the 5th, so the follow-up moves to the 6th.
    let next = svc.queued_jobs();
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].kind, JobKind::Due);
    assert!((march(6, 18, 0)..march(6, 19, 0)).contains(&next[0].trigger_time));
    assert_eq!(alarm.last(), Some(AlarmCall::Schedule(next[0].trigger_time)));
}

#[test]
fn morning_deadline_keeps_daily_follow_ups() {
    let store = MemoryTaskStore::new();
    store.insert(ReminderConfig {
        due_date: Some(march(4, 9, 0)),
        has_due_time: true,
        notify_at_deadline: true,
        ..ReminderConfig::new(6)
    });
    let (svc, _, notifier) = utc_service(store, QuietWindow::disabled());

    svc.rebuild(march(4, 8, 0)).unwrap();
    svc.on_wake(march(4, 9, 0)).unwrap();

    for day in 5..11 {
        let jobs = svc.queued_jobs();
        assert_eq!(jobs.len(), 1, "nothing queued for March {day}");
        assert_eq!(jobs[0].kind, JobKind::Due);
        assert!((march(day, 18, 0)..march(day, 19, 0)).contains(&jobs[0].trigger_time));
        svc.on_wake(jobs[0].trigger_time).unwrap();
    }
    assert_eq!(notifier.fired().len(), 7);
}

#[test]
fn overdue_backlog_is_spread_out() {
    let store = MemoryTaskStore::new();
    for id in 0..50 {
        store.insert(ReminderConfig {
            due_date: Some(march(1, 9, 0)),
            has_due_time: true,
            notify_after_deadline: true,
            ..ReminderConfig::new(id)
        });
    }
    let (svc, _, notifier) = utc_service(store, QuietWindow::disabled());
    let now = march(10, 12, 0);
    svc.rebuild(now).unwrap();

    let triggers: std::collections::HashSet<u64> =
        svc.queued_jobs().iter().map(|j| j.trigger_time).collect();
    assert!(triggers.len() > 45);
    assert!(triggers.iter().all(|&t| (now..now + HOUR / 2).contains(&t)));

    assert!(svc.on_wake(now).unwrap().len() < 10);
    svc.on_wake(now + HOUR / 2).unwrap();
    assert_eq!(notifier.fired().len(), 50);
    // Every task is back on its daily nag at the deadline's time of day.
    assert!(svc.queued_jobs().iter().all(|j| j.trigger_time == march(11, 9, 0) + 1_000));
}

#[test]
fn snooze_overrides_due_reminder() {
    let (svc, _, _) = utc_service(MemoryTaskStore::new(), QuietWindow::disabled());
    let config = ReminderConfig {
        due_date: Some(march(6, 10, 0)),
        has_due_time: true,
        notify_at_deadline: true,
        snooze_until: Some(march(4, 15, 0)),
        ..ReminderConfig::new(4)
    };
    let job = svc.schedule_task(&config, march(4, 12, 0)).unwrap();
    assert_eq!(job, Some(ScheduledJob::new(4, JobKind::Snooze, march(4, 15, 0))));

    // Once the snooze has fired, the deadline takes over again.
    let fired = ReminderConfig {
        last_reminder_fired: Some(march(4, 15, 0)),
        ..config
    };
    let job = svc.schedule_task(&fired, march(4, 16, 0)).unwrap();
    assert_eq!(job, Some(ScheduledJob::new(4, JobKind::Due, march(6, 10, 0))));
    assert_eq!(svc.queued_jobs().len(), 1);
}

#[test]
fn random_reminder_follows_creation_time() {
    let (svc, _, _) = utc_service(MemoryTaskStore::new(), QuietWindow::disabled());
    let created = march(4, 0, 0);
    let config = ReminderConfig {
        random_reminder_period: Duration::from_secs(48 * 3600),
        created_at: created,
        ..ReminderConfig::new(5)
    };
    let job = svc.schedule_task(&config, created + HOUR).unwrap().unwrap();
    assert_eq!(job.kind, JobKind::Random);
    let low = created + (48 * HOUR * 85) / 100;
    let high = created + (48 * HOUR * 115) / 100;
    assert!((low..=high).contains(&job.trigger_time));
}

#[test]
fn cancelling_the_head_moves_the_alarm_to_the_next_job() {
    let store = MemoryTaskStore::new();
    store.insert(all_day(1, march(4, 0, 0)));
    store.insert(all_day(2, march(5, 0, 0)));
    let (svc, alarm, _) = utc_service(store, QuietWindow::disabled());

    svc.rebuild(march(4, 9, 0)).unwrap();
    assert_eq!(alarm.last(), Some(AlarmCall::Schedule(march(4, 18, 0))));

    assert!(svc.cancel_task(TaskId(1)).unwrap());
    assert_eq!(alarm.last(), Some(AlarmCall::Schedule(march(5, 18, 0))));

    assert!(!svc.cancel_task(TaskId(1)).unwrap());
    assert!(svc.cancel_task(TaskId(2)).unwrap());
    assert_eq!(alarm.last(), Some(AlarmCall::Cancel));
    assert!(alarm.calls().len() >= 3);
}

#[test]
fn completed_task_is_not_rescheduled_after_firing() {
    let store = MemoryTaskStore::new();
    store.insert(all_day(1, march(4, 0, 0)));
    let (svc, alarm, notifier) = utc_service(store, QuietWindow::disabled());
    svc.rebuild(march(4, 9, 0)).unwrap();

    svc.store().remove(TaskId(1));
    let fired = svc.on_wake(march(4, 18, 0)).unwrap();

    assert_eq!(fired.len(), 1);
    assert_eq!(notifier.fired().len(), 1);
    assert!(svc.queued_jobs().is_empty());
    assert_eq!(alarm.last(), Some(AlarmCall::Cancel));
}
