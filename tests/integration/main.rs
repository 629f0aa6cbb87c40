//! Integration test binary -- all integration tests consolidated into a single
//! binary.

// Allow unwrap/expect in test code
#![allow(clippy::unwrap_used, clippy::expect_used)]


mod config_and_task_file;
mod reminder_flow;
mod service_concurrency;
mod wake_alarm_loop;
