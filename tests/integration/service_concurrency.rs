//! Concurrent producers scheduling into one service.

use crate::helpers::{AlarmCall, utc_service};
use nudge::store::{MemoryTaskStore, TaskStore};
use nudge::{QuietWindow, ReminderConfig, TaskId};

const THREADS: u64 = 8;
const PER_THREAD: u64 = 50;
const BASE: u64 = 1_700_000_000_000;

fn snoozed(id: u64) -> ReminderConfig {
    // Spread triggers over ten seconds; index 0 gets the earliest slot.
    let slot = (id * 7919) % 10_000;
    ReminderConfig {
        snooze_until: Some(BASE + 1_000 + slot * 1_000),
        ..ReminderConfig::new(id)
    }
}

#[test]
fn concurrent_scheduling_keeps_alarm_at_queue_head() {
    let store = MemoryTaskStore::new();
    for id in 0..THREADS * PER_THREAD {
        store.insert(snoozed(id));
    }
    let (svc, alarm, notifier) = utc_service(store, QuietWindow::disabled());

    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let svc = &svc;
            scope.spawn(move || {
                for i in 0..PER_THREAD {
                    let id = t * PER_THREAD + i;
                    svc.schedule_task(&snoozed(id), BASE).unwrap();
                }
            });
        }
    });

    let jobs = svc.queued_jobs();
    assert_eq!(jobs.len() as u64, THREADS * PER_THREAD);
    assert!(jobs.windows(2).all(|w| w[0].trigger_time <= w[1].trigger_time));
    assert_eq!(jobs[0].trigger_time, BASE + 1_000);
    assert_eq!(alarm.last(), Some(AlarmCall::Schedule(BASE + 1_000)));

    let fired = svc.on_wake(BASE + 20_000_000).unwrap();
    assert_eq!(fired.len() as u64, THREADS * PER_THREAD);
    assert_eq!(notifier.fired().len() as u64, THREADS * PER_THREAD);
    assert!(svc.queued_jobs().is_empty());
    assert_eq!(alarm.last(), Some(AlarmCall::Cancel));

    let sample = svc.store().reminder_config(TaskId(17)).unwrap().unwrap();
    assert_eq!(sample.last_reminder_fired, Some(BASE + 20_000_000));
}
