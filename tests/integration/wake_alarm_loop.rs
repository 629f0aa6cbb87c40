//! The tokio wake alarm driving the service, as the `run` command does.

use nudge::notify::ChannelNotifier;
use nudge::reminders::{ReminderService, SharedQuietWindow, TokioWakeAlarm};
use nudge::store::MemoryTaskStore;
use nudge::time::now_epoch_millis;
use nudge::{JobKind, ReminderConfig};
use std::time::Duration;

#[tokio::test]
async fn snoozed_task_fires_through_tokio_alarm() {
    let now = now_epoch_millis();
    let store = MemoryTaskStore::new();
    store.insert(ReminderConfig {
        snooze_until: Some(now + 100),
        ..ReminderConfig::new(42)
    });

    let (alarm, mut wake_rx) = TokioWakeAlarm::channel().unwrap();
    let (notifier, mut notify_rx) = ChannelNotifier::channel();
    let svc = ReminderService::with_time_zone(
        store,
        alarm,
        notifier,
        SharedQuietWindow::default(),
        chrono::Utc,
    );
    assert_eq!(svc.rebuild(now).unwrap(), 1);

    let at = tokio::time::timeout(Duration::from_secs(5), wake_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(at, now + 100);

    let fired = svc.on_wake(now_epoch_millis().max(at)).unwrap();
    assert_eq!(fired.len(), 1);

    let job = notify_rx.try_recv().unwrap();
    assert_eq!(job.id.0, 42);
    assert_eq!(job.kind, JobKind::Snooze);
    assert!(svc.queued_jobs().is_empty());
}
