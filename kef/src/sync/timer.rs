use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;

use crate::sync::controller::ControlEvent;

/// Identifies one scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Deferred work of the volume sync controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// End of the debounce window after a user write
    ClearPending,
    PollTick,
}

/// Cancellable deferred callbacks.
///
/// A fired timer is delivered back to its owner as `(TimerId, TimerEvent)`.
/// Cancelling a timer that already fired is a no-op; owners must still ignore
/// ids they no longer expect, since delivery and cancellation can cross.
pub trait Timers {
    fn schedule(&mut self, delay: Duration, event: TimerEvent) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

/// Timers backed by sleeping tokio tasks that post into the controller's
/// event channel
pub struct TokioTimers {
    next_id: u64,
    active: HashMap<TimerId, AbortHandle>,
    events: UnboundedSender<ControlEvent>,
}

impl TokioTimers {
    pub(crate) fn new(events: UnboundedSender<ControlEvent>) -> Self {
        Self {
            next_id: 0,
            active: HashMap::new(),
            events,
        }
    }

    /// Forget a timer whose event has been delivered
    pub(crate) fn fired(&mut self, id: TimerId) {
        self.active.remove(&id);
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn cancel_all(&mut self) {
        for (_, handle) in self.active.drain() {
            handle.abort();
        }
    }
}

impl Timers for TokioTimers {
    fn schedule(&mut self, delay: Duration, event: TimerEvent) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ControlEvent::Timer(id, event));
        });
        self.active.insert(id, task.abort_handle());
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.active.remove(&id) {
            handle.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
