use log::{debug, trace, warn};

use crate::config::SyncConfig;
use crate::error::KefError;
use crate::sync::panel::{Panel, VolumeLabel};
use crate::sync::timer::{TimerEvent, TimerId, Timers};
use crate::volume::Volume;

/// Device work requested by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    WriteVolume(Volume),
    ReadVolume,
}

/// Drag-safe volume synchronization.
///
/// Reconciles slider input with periodic device reads so the panel never snaps
/// back to a stale device value while the user is setting the volume. A poll
/// result only reaches the panel when the user is not dragging and no written
/// value is waiting out its debounce window.
///
/// The machine performs no I/O. It schedules its own timers through [`Timers`]
/// and hands device work back to the caller as [`Effect`]s, whose outcomes are
/// fed back through `on_write_complete` and `on_read_complete`.
#[derive(Debug)]
pub struct VolumeSync {
    config: SyncConfig,
    dragging: bool,
    pending: Option<Volume>,
    clear_timer: Option<TimerId>,
    poll_timer: Option<TimerId>,
    read_in_flight: bool,
    write_in_flight: bool,
    /// Latest release waiting for the in-flight write to finish
    queued_write: Option<Volume>,
    panel: Panel,
}

impl VolumeSync {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            dragging: false,
            pending: None,
            clear_timer: None,
            poll_timer: None,
            read_in_flight: false,
            write_in_flight: false,
            queued_write: None,
            panel: Panel::default(),
        }
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn pending(&self) -> Option<Volume> {
        self.pending
    }

    pub fn is_writing(&self) -> bool {
        self.write_in_flight
    }

    /// Whether device reads are currently kept off the panel
    pub fn is_suppressed(&self) -> bool {
        self.dragging || self.pending.is_some()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.panel.status = Some(status.into());
    }

    pub fn on_press(&mut self, timers: &mut dyn Timers) {
        self.dragging = true;
        if let Some(id) = self.clear_timer.take() {
            timers.cancel(id);
        }
        debug!("volume slider pressed");
    }

    /// Show the dragged value without writing it to the device
    pub fn on_drag(&mut self, raw: f64) {
        let volume = Volume::from_raw(raw);
        self.pending = Some(volume);
        self.panel.show(volume);
    }

    /// Commit the released value.
    ///
    /// Only one write is outstanding at a time. A release made while the device
    /// is still answering an earlier write replaces any queued value and is sent
    /// once that write completes.
    pub fn on_release(&mut self, raw: f64) -> Option<Effect> {
        let volume = Volume::from_raw(raw);
        self.pending = Some(volume);
        self.dragging = false;
        self.panel.show(volume);

        if self.write_in_flight {
            debug!("volume slider released at {}, queued behind running write", volume);
            self.queued_write = Some(volume);
            return None;
        }
        debug!("volume slider released at {}", volume);
        self.write_in_flight = true;
        Some(Effect::WriteVolume(volume))
    }

    /// Send the queued write, or start the debounce window once the device
    /// answered the last one
    pub fn on_write_complete(
        &mut self,
        result: Result<(), KefError>,
        timers: &mut dyn Timers,
    ) -> Option<Effect> {
        self.write_in_flight = false;
        if let Err(error) = result {
            warn!("failed to set volume: {}", error);
            self.panel.label = VolumeLabel::Error(error.to_string());
        }

        if let Some(volume) = self.queued_write.take() {
            debug!("sending queued volume {}", volume);
            self.write_in_flight = true;
            return Some(Effect::WriteVolume(volume));
        }

        // A new drag owns the pending value now; its release restarts the window.
        if self.dragging {
            return None;
        }

        if let Some(id) = self.clear_timer.take() {
            timers.cancel(id);
        }
        self.clear_timer = Some(timers.schedule(self.config.debounce, TimerEvent::ClearPending));
        None
    }

    pub fn on_timer(
        &mut self,
        id: TimerId,
        event: TimerEvent,
        timers: &mut dyn Timers,
    ) -> Option<Effect> {
        match event {
            TimerEvent::ClearPending if self.clear_timer == Some(id) => {
                self.clear_timer = None;
                self.clear_pending(timers)
            }
            TimerEvent::PollTick if self.poll_timer == Some(id) => {
                self.poll_timer = None;
                self.poll_tick(timers)
            }
            _ => {
                trace!("ignoring stale {:?} timer {:?}", event, id);
                None
            }
        }
    }

    /// Drop the pending value and poll right away
    pub fn clear_pending(&mut self, timers: &mut dyn Timers) -> Option<Effect> {
        self.pending = None;
        if let Some(id) = self.poll_timer.take() {
            timers.cancel(id);
        }
        debug!("pending volume cleared");
        self.poll_tick(timers)
    }

    /// Read the device unless user input suppresses polling
    pub fn poll_tick(&mut self, timers: &mut dyn Timers) -> Option<Effect> {
        if self.read_in_flight {
            // The outstanding read reschedules the poll when it lands.
            return None;
        }
        if self.is_suppressed() {
            self.schedule_poll(timers, self.config.suppressed_retry);
            return None;
        }
        self.read_in_flight = true;
        Some(Effect::ReadVolume)
    }

    pub fn on_read_complete(&mut self, result: Result<Volume, KefError>, timers: &mut dyn Timers) {
        self.read_in_flight = false;

        match result {
            Ok(volume) if !self.is_suppressed() => self.panel.show(volume),
            Ok(volume) => debug!("discarding polled volume {} during user input", volume),
            Err(error) if !self.is_suppressed() => {
                warn!("failed to read volume: {}", error);
                self.panel.label = VolumeLabel::Error(error.to_string());
            }
            Err(error) => warn!("failed to read volume during user input: {}", error),
        }

        self.schedule_poll(timers, self.config.poll_interval);
    }

    fn schedule_poll(&mut self, timers: &mut dyn Timers, delay: std::time::Duration) {
        if let Some(id) = self.poll_timer.take() {
            timers.cancel(id);
        }
        self.poll_timer = Some(timers.schedule(delay, TimerEvent::PollTick));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Records timers instead of running them
    #[derive(Default)]
    struct ManualTimers {
        next_id: u64,
        scheduled: Vec<(TimerId, Duration, TimerEvent)>,
        cancelled: Vec<TimerId>,
    }

    impl ManualTimers {
        fn live(&self) -> Vec<(TimerId, Duration, TimerEvent)> {
            self.scheduled
                .iter()
                .filter(|(id, _, _)| !self.cancelled.contains(id))
                .cloned()
                .collect()
        }

        fn live_of(&self, event: TimerEvent) -> Vec<(TimerId, Duration)> {
            self.live()
                .into_iter()
                .filter(|(_, _, e)| *e == event)
                .map(|(id, delay, _)| (id, delay))
                .collect()
        }

        fn take(&mut self, event: TimerEvent) -> TimerId {
            let live = self.live_of(event);
            assert_eq!(live.len(), 1, "expected one live {:?} timer", event);
            let id = live[0].0;
            self.cancelled.push(id);
            id
        }
    }

    impl Timers for ManualTimers {
        fn schedule(&mut self, delay: Duration, event: TimerEvent) -> TimerId {
            let id = TimerId::new(self.next_id);
            self.next_id += 1;
            self.scheduled.push((id, delay, event));
            id
        }

        fn cancel(&mut self, id: TimerId) {
            self.cancelled.push(id);
        }
    }

    fn volume(percent: i32) -> Volume {
        Volume::from_percent(percent)
    }

    /// A machine that completed its first poll at `initial`
    fn settled(initial: i32, timers: &mut ManualTimers) -> VolumeSync {
        let mut sync = VolumeSync::new(SyncConfig::default());
        assert_eq!(sync.poll_tick(timers), Some(Effect::ReadVolume));
        sync.on_read_complete(Ok(volume(initial)), timers);
        sync
    }

    #[test]
    fn test_initial_state() {
        let sync = VolumeSync::new(SyncConfig::default());

        assert!(!sync.is_dragging());
        assert_eq!(sync.pending(), None);
        assert_eq!(sync.panel().label, VolumeLabel::Loading);
    }

    #[test]
    fn test_poll_updates_panel_and_reschedules() {
        let mut timers = ManualTimers::default();
        let sync = settled(35, &mut timers);

        assert_eq!(sync.panel().label, VolumeLabel::Level(volume(35)));
        assert_eq!(sync.panel().slider, volume(35));
        let polls = timers.live_of(TimerEvent::PollTick);
        assert_eq!(polls.len(), 1);
        assert_eq!(polls[0].1, Duration::from_millis(2000));
    }

    #[test]
    fn test_drag_sequence_shows_release_value() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);

        sync.on_press(&mut timers);
        sync.on_drag(10.0);
        assert_eq!(sync.panel().label, VolumeLabel::Level(volume(10)));
        sync.on_drag(75.0);
        assert_eq!(sync.panel().label, VolumeLabel::Level(volume(75)));
        let effect = sync.on_release(64.0);

        assert_eq!(effect, Some(Effect::WriteVolume(volume(64))));
        assert!(sync.is_writing());
        assert_eq!(sync.panel().label, VolumeLabel::Level(volume(64)));
        assert_eq!(sync.panel().slider, volume(64));
        assert_eq!(sync.pending(), Some(volume(64)));
        assert!(!sync.is_dragging());
        assert!(sync.is_suppressed());
    }

    #[test]
    fn test_drag_never_writes() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);
        let before = timers.scheduled.len();

        sync.on_press(&mut timers);
        for raw in [1.0, 2.0, 3.0, 50.0] {
            sync.on_drag(raw);
        }

        assert!(sync.is_dragging());
        assert_eq!(timers.scheduled.len(), before);
    }

    #[test]
    fn test_values_are_clamped() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);

        sync.on_press(&mut timers);
        sync.on_drag(-12.0);
        assert_eq!(sync.pending(), Some(Volume::MIN));
        assert_eq!(sync.panel().label, VolumeLabel::Level(Volume::MIN));

        sync.on_drag(140.0);
        assert_eq!(sync.pending(), Some(Volume::MAX));

        assert_eq!(sync.on_release(1000.0), Some(Effect::WriteVolume(Volume::MAX)));
        assert_eq!(sync.on_write_complete(Ok(()), &mut timers), None);
        assert_eq!(sync.on_release(-1.0), Some(Effect::WriteVolume(Volume::MIN)));
    }

    #[test]
    fn test_poll_is_noop_while_dragging() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);
        sync.on_press(&mut timers);
        sync.on_drag(44.0);
        let panel = sync.panel().clone();

        let poll = timers.take(TimerEvent::PollTick);
        assert_eq!(sync.on_timer(poll, TimerEvent::PollTick, &mut timers), None);

        assert_eq!(sync.panel(), &panel);
        let retries = timers.live_of(TimerEvent::PollTick);
        assert_eq!(retries.len(), 1);
        assert_eq!(retries[0].1, Duration::from_millis(500));
    }

    #[test]
    fn test_poll_is_noop_while_pending() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);
        sync.on_press(&mut timers);
        let _ = sync.on_release(40.0);
        let _ = sync.on_write_complete(Ok(()), &mut timers);

        for _ in 0..3 {
            let poll = timers.take(TimerEvent::PollTick);
            assert_eq!(sync.on_timer(poll, TimerEvent::PollTick, &mut timers), None);
            assert_eq!(sync.panel().label, VolumeLabel::Level(volume(40)));
            assert_eq!(sync.panel().slider, volume(40));
        }
    }

    #[test]
    fn test_read_landing_during_drag_is_discarded() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);

        let poll = timers.take(TimerEvent::PollTick);
        assert_eq!(
            sync.on_timer(poll, TimerEvent::PollTick, &mut timers),
            Some(Effect::ReadVolume)
        );
        sync.on_press(&mut timers);
        sync.on_drag(60.0);
        sync.on_read_complete(Ok(volume(20)), &mut timers);

        assert_eq!(sync.panel().label, VolumeLabel::Level(volume(60)));
        assert_eq!(sync.panel().slider, volume(60));
    }

    #[test]
    fn test_read_error_during_drag_is_not_shown() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);

        let poll = timers.take(TimerEvent::PollTick);
        let _ = sync.on_timer(poll, TimerEvent::PollTick, &mut timers);
        sync.on_press(&mut timers);
        sync.on_drag(60.0);
        sync.on_read_complete(Err(KefError::Device("timeout".into())), &mut timers);

        assert_eq!(sync.panel().label, VolumeLabel::Level(volume(60)));
    }

    #[test]
    fn test_write_completion_schedules_debounce() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);
        sync.on_press(&mut timers);
        let _ = sync.on_release(40.0);

        assert!(timers.live_of(TimerEvent::ClearPending).is_empty());
        let _ = sync.on_write_complete(Ok(()), &mut timers);

        let clears = timers.live_of(TimerEvent::ClearPending);
        assert_eq!(clears.len(), 1);
        assert_eq!(clears[0].1, Duration::from_millis(600));
        assert_eq!(sync.pending(), Some(volume(40)));
    }

    #[test]
    fn test_clear_pending_resumes_polling() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);
        sync.on_press(&mut timers);
        let _ = sync.on_release(40.0);
        let _ = sync.on_write_complete(Ok(()), &mut timers);

        let clear = timers.take(TimerEvent::ClearPending);
        let effect = sync.on_timer(clear, TimerEvent::ClearPending, &mut timers);

        assert_eq!(effect, Some(Effect::ReadVolume));
        assert_eq!(sync.pending(), None);
        assert!(timers.live_of(TimerEvent::PollTick).is_empty());

        sync.on_read_complete(Ok(volume(41)), &mut timers);
        assert_eq!(sync.panel().label, VolumeLabel::Level(volume(41)));
        assert_eq!(timers.live_of(TimerEvent::PollTick).len(), 1);
    }

    #[test]
    fn test_press_cancels_debounce() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);
        sync.on_press(&mut timers);
        let _ = sync.on_release(40.0);
        let _ = sync.on_write_complete(Ok(()), &mut timers);
        let clear = timers.live_of(TimerEvent::ClearPending)[0].0;

        sync.on_press(&mut timers);

        assert!(timers.cancelled.contains(&clear));
        // Delivered anyway (cancel raced the firing): must be ignored.
        assert_eq!(sync.on_timer(clear, TimerEvent::ClearPending, &mut timers), None);
        assert_eq!(sync.pending(), Some(volume(40)));
    }

    #[test]
    fn test_write_completing_during_new_drag_defers_debounce() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);
        sync.on_press(&mut timers);
        let _ = sync.on_release(40.0);
        sync.on_press(&mut timers);
        sync.on_drag(55.0);

        let _ = sync.on_write_complete(Ok(()), &mut timers);
        assert!(timers.live_of(TimerEvent::ClearPending).is_empty());

        let _ = sync.on_release(57.0);
        let _ = sync.on_write_complete(Ok(()), &mut timers);
        assert_eq!(timers.live_of(TimerEvent::ClearPending).len(), 1);
    }

    #[test]
    fn test_release_during_write_is_queued() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);
        sync.on_press(&mut timers);
        assert_eq!(sync.on_release(40.0), Some(Effect::WriteVolume(volume(40))));
        sync.on_press(&mut timers);
        assert_eq!(sync.on_release(45.0), None);
        sync.on_press(&mut timers);
        assert_eq!(sync.on_release(57.0), None);
        assert_eq!(sync.panel().label, VolumeLabel::Level(volume(57)));

        // Only the newest release follows the running write.
        let next = sync.on_write_complete(Ok(()), &mut timers);
        assert_eq!(next, Some(Effect::WriteVolume(volume(57))));
        assert!(sync.is_writing());

        assert_eq!(sync.on_write_complete(Ok(()), &mut timers), None);
        assert!(!sync.is_writing());
        assert_eq!(timers.live_of(TimerEvent::ClearPending).len(), 1);
    }

    #[test]
    fn test_superseded_write_does_not_start_debounce() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);
        sync.on_press(&mut timers);
        let _ = sync.on_release(40.0);
        sync.on_press(&mut timers);
        let _ = sync.on_release(57.0);

        let _ = sync.on_write_complete(Ok(()), &mut timers);
        assert!(timers.live_of(TimerEvent::ClearPending).is_empty());

        // Polls stay suppressed while the newer write is outstanding.
        let poll = timers.take(TimerEvent::PollTick);
        assert_eq!(sync.on_timer(poll, TimerEvent::PollTick, &mut timers), None);
        assert_eq!(sync.pending(), Some(volume(57)));
        assert_eq!(sync.panel().label, VolumeLabel::Level(volume(57)));
    }

    #[test]
    fn test_failed_write_still_sends_queued_value() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);
        sync.on_press(&mut timers);
        let _ = sync.on_release(40.0);
        sync.on_press(&mut timers);
        let _ = sync.on_release(57.0);

        let next = sync.on_write_complete(Err(KefError::Device("busy".into())), &mut timers);

        assert_eq!(next, Some(Effect::WriteVolume(volume(57))));
        assert_eq!(sync.panel().label.to_string(), "Error: device operation failed: busy");
        assert!(timers.live_of(TimerEvent::ClearPending).is_empty());
    }

    #[test]
    fn test_write_failure_shows_error_and_still_debounces() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);
        sync.on_press(&mut timers);
        let _ = sync.on_release(40.0);

        let _ = sync.on_write_complete(Err(KefError::Device("connection reset".into())), &mut timers);

        assert_eq!(
            sync.panel().label.to_string(),
            "Error: device operation failed: connection reset"
        );
        assert_eq!(timers.live_of(TimerEvent::ClearPending).len(), 1);
    }

    #[test]
    fn test_read_failure_keeps_polling() {
        let mut timers = ManualTimers::default();
        let mut sync = VolumeSync::new(SyncConfig::default());

        assert_eq!(sync.poll_tick(&mut timers), Some(Effect::ReadVolume));
        sync.on_read_complete(Err(KefError::PoweredOff), &mut timers);

        assert_eq!(sync.panel().label.to_string(), "Error: speaker is powered off");
        let polls = timers.live_of(TimerEvent::PollTick);
        assert_eq!(polls.len(), 1);
        assert_eq!(polls[0].1, Duration::from_millis(2000));
    }

    #[test]
    fn test_single_read_in_flight() {
        let mut timers = ManualTimers::default();
        let mut sync = VolumeSync::new(SyncConfig::default());

        assert_eq!(sync.poll_tick(&mut timers), Some(Effect::ReadVolume));
        assert_eq!(sync.poll_tick(&mut timers), None);
        assert_eq!(sync.clear_pending(&mut timers), None);
        assert!(timers.live().is_empty());
    }

    #[test]
    fn test_one_poll_chain_after_many_interactions() {
        let mut timers = ManualTimers::default();
        let mut sync = settled(20, &mut timers);

        for raw in [10.0, 30.0, 50.0] {
            sync.on_press(&mut timers);
            sync.on_drag(raw);
            let poll = timers.take(TimerEvent::PollTick);
            let _ = sync.on_timer(poll, TimerEvent::PollTick, &mut timers);
            let _ = sync.on_release(raw);
            let _ = sync.on_write_complete(Ok(()), &mut timers);
            let clear = timers.take(TimerEvent::ClearPending);
            if let Some(Effect::ReadVolume) = sync.on_timer(clear, TimerEvent::ClearPending, &mut timers) {
                sync.on_read_complete(Ok(Volume::from_raw(raw)), &mut timers);
            }
            assert_eq!(timers.live_of(TimerEvent::PollTick).len(), 1);
        }
    }

    #[test]
    fn test_status_line() {
        let mut sync = VolumeSync::new(SyncConfig::default());
        sync.set_status("Source: Aux");
        assert_eq!(sync.panel().status.as_deref(), Some("Source: Aux"));
    }
}
