//! Configuration file and JSON task file feeding the service.

use crate::helpers::{AlarmCall, march, utc_service};
use nudge::store::MemoryTaskStore;
use nudge::{JobKind, NudgeConfig, ScheduledJob};

const CONFIG: &str = r#"
[quiet_hours]
enabled = true
start = "21:00"
end = "07:30"

[reminders]
default_due_time = "20:00"
"#;

const TASKS: &str = r#"[
    { "id": 1, "title": "Pay rent", "due": "2024-03-04T00:00:00Z", "notify_at_deadline": true },
    { "id": 2, "title": "Call mum", "due": "2024-03-05T12:00:00Z", "has_due_time": true,
      "notify_at_deadline": true },
    { "id": 3, "title": "Old chore", "due": "2024-03-01T00:00:00Z", "notify_at_deadline": true,
      "completed": true }
]"#;

#[test]
fn config_and_task_file_drive_the_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let tasks_path = dir.path().join("tasks.json");
    std::fs::write(&config_path, CONFIG).unwrap();
    std::fs::write(&tasks_path, TASKS).unwrap();

    let config = NudgeConfig::from_file(&config_path).unwrap();
    assert_eq!(config.reminders.period_hours, 24);

    let defaults = config.reminder_defaults().unwrap();
    let store = MemoryTaskStore::from_json_file(&tasks_path, &defaults).unwrap();
    assert_eq!(store.len(), 2);

    let (svc, alarm, _) = utc_service(store, config.quiet_window().unwrap());
    assert_eq!(svc.rebuild(march(4, 9, 0)).unwrap(), 2);

    assert_eq!(
        svc.queued_jobs(),
        [
            ScheduledJob::new(1, JobKind::Due, march(4, 20, 0)),
            ScheduledJob::new(2, JobKind::Due, march(5, 12, 0)),
        ]
    );
    // 20:00 is outside 21:00-07:30, so the wake is not moved.
    assert_eq!(alarm.last(), Some(AlarmCall::Schedule(march(4, 20, 0))));
}

#[test]
fn saved_config_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nudge").join("config.toml");

    let mut config = NudgeConfig::default();
    config.quiet_hours.enabled = true;
    config.reminders.default_due_time = "09:15".to_owned();
    config.save_to_file(&path).unwrap();

    let reloaded = NudgeConfig::load_or_default(&path).unwrap();
    assert_eq!(reloaded, config);
    assert!(reloaded.quiet_window().unwrap().is_active());
}
