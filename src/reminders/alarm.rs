//! The single outstanding wake request.
//!
//! [`WakeAlarm`] is the seam to whatever primitive can wake the process at a
//! given time. The reminder core never calls it directly; the
//! [`ReminderService`](crate::reminders::service::ReminderService) does,
//! whenever the queue reports that its earliest trigger changed.

use crate::error::{NudgeError, Result};
use crate::time::now_epoch_millis;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// "Wake me at time T" primitive. Scheduling replaces any earlier request.
pub trait WakeAlarm: Send {
    /// Request a wake-up at `at` (epoch ms). Past times fire immediately.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Alarm`] if the request could not be registered.
    fn schedule_wake(&mut self, at: u64) -> Result<()>;

    /// Withdraw the pending wake-up, if any.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Alarm`] if the request could not be withdrawn.
    fn cancel_wake(&mut self) -> Result<()>;
}

/// Wake alarm backed by a tokio timer task.
///
/// When the timer elapses, the scheduled instant is sent on the channel
/// returned by [`TokioWakeAlarm::channel`].
pub struct TokioWakeAlarm {
    runtime: Handle,
    wake_tx: mpsc::UnboundedSender<u64>,
    pending: Option<JoinHandle<()>>,
}

impl TokioWakeAlarm {
    /// Create an alarm on the current tokio runtime together with its wake
    /// channel.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Alarm`] when called outside a tokio runtime.
    pub fn channel() -> Result<(Self, mpsc::UnboundedReceiver<u64>)> {
        let runtime = Handle::try_current()
            .map_err(|e| NudgeError::Alarm(format!("no tokio runtime: {e}")))?;
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();
        Ok((
            Self {
                runtime,
                wake_tx,
                pending: None,
            },
            wake_rx,
        ))
    }

    /// Returns `true` while a wake-up is scheduled and has not yet fired.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn abort_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl WakeAlarm for TokioWakeAlarm {
    fn schedule_wake(&mut self, at: u64) -> Result<()> {
        self.abort_pending();

        let delay = Duration::from_millis(at.saturating_sub(now_epoch_millis()));
        debug!(at, delay_ms = delay.as_millis() as u64, "scheduling wake");

        let wake_tx = self.wake_tx.clone();
        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if wake_tx.send(at).is_err() {
                debug!("wake channel closed before alarm fired");
            }
        }));
        Ok(())
    }

    fn cancel_wake(&mut self) -> Result<()> {
        if self.pending.is_some() {
            debug!("cancelling wake");
        }
        self.abort_pending();
        Ok(())
    }
}

impl Drop for TokioWakeAlarm {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
