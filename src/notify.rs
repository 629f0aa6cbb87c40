//! Delivery of fired reminders.

use crate::error::{NudgeError, Result};
use crate::reminders::job::ScheduledJob;
use tokio::sync::mpsc;
use tracing::info;

/// Presents a fired reminder to the user.
pub trait Notifier: Send + Sync {
    /// Deliver one fired job.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be delivered. The
    /// reminder service logs it and carries on.
    fn notify(&self, job: &ScheduledJob) -> Result<()>;
}

/// Writes fired reminders to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, job: &ScheduledJob) -> Result<()> {
        info!(
            task = %job.id,
            kind = %job.kind,
            trigger_time = job.trigger_time,
            "reminder"
        );
        Ok(())
    }
}

/// Forwards fired reminders over a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<ScheduledJob>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ScheduledJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, job: &ScheduledJob) -> Result<()> {
        self.tx
            .send(*job)
            .map_err(|_| NudgeError::Notify("notification channel closed".to_owned()))
    }
}
