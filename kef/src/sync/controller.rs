use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::error::{KefError, Result};
use crate::source::Source;
use crate::speaker::SpeakerClient;
use crate::sync::panel::Panel;
use crate::sync::state::{Effect, VolumeSync};
use crate::sync::timer::{TimerEvent, TimerId, TokioTimers};
use crate::volume::Volume;

/// Fire-and-forget speaker commands issued from the panel buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerCommand {
    SelectSource(Source),
    TurnOff,
}

impl fmt::Display for SpeakerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeakerCommand::SelectSource(source) => write!(f, "Source: {}", source),
            SpeakerCommand::TurnOff => write!(f, "Speaker turned off"),
        }
    }
}

/// Everything the controller task reacts to, in arrival order
#[derive(Debug)]
pub enum ControlEvent {
    Press,
    Drag(f64),
    Release(f64),
    Command(SpeakerCommand),
    Timer(TimerId, TimerEvent),
    VolumeRead(Result<Volume>),
    VolumeWritten(Result<()>),
    CommandDone(SpeakerCommand, Result<()>),
    Shutdown,
}

/// Owns the volume sync state and runs it on a single task.
///
/// Input events, timer firings and device completions all arrive through one
/// channel, so every state change happens on this task in dispatch order.
/// Device calls run on their own tasks and report back as events.
pub struct VolumeSyncController {
    sync: VolumeSync,
    client: Arc<dyn SpeakerClient>,
    timers: TokioTimers,
    events_tx: mpsc::UnboundedSender<ControlEvent>,
    events: mpsc::UnboundedReceiver<ControlEvent>,
    panel: watch::Sender<Panel>,
}

impl VolumeSyncController {
    /// Start the controller on the current tokio runtime. The first poll is
    /// issued immediately.
    pub fn spawn(
        client: Arc<dyn SpeakerClient>,
        config: SyncConfig,
    ) -> (ControllerHandle, JoinHandle<()>) {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (panel, panel_rx) = watch::channel(Panel::default());

        let controller = Self {
            sync: VolumeSync::new(config),
            client,
            timers: TokioTimers::new(events_tx.clone()),
            events_tx: events_tx.clone(),
            events,
            panel,
        };

        let handle = ControllerHandle {
            events: events_tx,
            panel: panel_rx,
        };
        (handle, tokio::spawn(controller.run()))
    }

    async fn run(mut self) {
        info!("volume sync started for {}", self.client.address());
        let first = self.sync.poll_tick(&mut self.timers);
        self.apply(first);
        self.publish();

        while let Some(event) = self.events.recv().await {
            if let ControlEvent::Shutdown = event {
                break;
            }
            self.handle(event);
            self.publish();
        }

        self.timers.cancel_all();
        info!("volume sync stopped");
    }

    fn handle(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Press => self.sync.on_press(&mut self.timers),
            ControlEvent::Drag(raw) => self.sync.on_drag(raw),
            ControlEvent::Release(raw) => {
                let effect = self.sync.on_release(raw);
                self.apply(effect);
            }
            ControlEvent::Command(command) => self.send_command(command),
            ControlEvent::Timer(id, event) => {
                self.timers.fired(id);
                let effect = self.sync.on_timer(id, event, &mut self.timers);
                self.apply(effect);
            }
            ControlEvent::VolumeRead(result) => self.sync.on_read_complete(result, &mut self.timers),
            ControlEvent::VolumeWritten(result) => {
                let effect = self.sync.on_write_complete(result, &mut self.timers);
                self.apply(effect);
            }
            ControlEvent::CommandDone(command, result) => match result {
                Ok(()) => self.sync.set_status(command.to_string()),
                Err(error) => {
                    warn!("{:?} failed: {}", command, error);
                    self.sync.set_status(format!("Error: {}", error));
                }
            },
            ControlEvent::Shutdown => {}
        }
    }

    fn apply(&mut self, effect: Option<Effect>) {
        let client = self.client.clone();
        let events = self.events_tx.clone();

        match effect {
            Some(Effect::WriteVolume(volume)) => {
                debug!("writing volume {}", volume);
                tokio::spawn(async move {
                    let result = client.set_volume(volume.as_fraction()).await;
                    let _ = events.send(ControlEvent::VolumeWritten(result));
                });
            }
            Some(Effect::ReadVolume) => {
                tokio::spawn(async move {
                    let result = client.get_volume().await.map(Volume::from_fraction);
                    let _ = events.send(ControlEvent::VolumeRead(result));
                });
            }
            None => {}
        }
    }

    fn send_command(&self, command: SpeakerCommand) {
        let client = self.client.clone();
        let events = self.events_tx.clone();

        debug!("sending {:?}", command);
        tokio::spawn(async move {
            let result = match command {
                SpeakerCommand::SelectSource(source) => client.set_source(source).await,
                SpeakerCommand::TurnOff => client.turn_off().await,
            };
            let _ = events.send(ControlEvent::CommandDone(command, result));
        });
    }

    fn publish(&self) {
        let current = self.sync.panel();
        self.panel.send_if_modified(|shown| {
            if shown == current {
                return false;
            }
            *shown = current.clone();
            true
        });
    }
}

/// Cloneable sender side of a running [`VolumeSyncController`]
#[derive(Clone)]
pub struct ControllerHandle {
    events: mpsc::UnboundedSender<ControlEvent>,
    panel: watch::Receiver<Panel>,
}

impl ControllerHandle {
    fn send(&self, event: ControlEvent) -> Result<()> {
        self.events.send(event).map_err(|_| KefError::ControllerClosed)
    }

    /// The slider was grabbed
    pub fn press(&self) -> Result<()> {
        self.send(ControlEvent::Press)
    }

    pub fn drag(&self, raw: f64) -> Result<()> {
        self.send(ControlEvent::Drag(raw))
    }

    pub fn release(&self, raw: f64) -> Result<()> {
        self.send(ControlEvent::Release(raw))
    }

    pub fn select_source(&self, source: Source) -> Result<()> {
        self.send(ControlEvent::Command(SpeakerCommand::SelectSource(source)))
    }

    pub fn turn_off(&self) -> Result<()> {
        self.send(ControlEvent::Command(SpeakerCommand::TurnOff))
    }

    /// Stop the controller; pending timers are dropped
    pub fn shutdown(&self) -> Result<()> {
        self.send(ControlEvent::Shutdown)
    }

    /// Latest published panel
    pub fn panel(&self) -> Panel {
        self.panel.borrow().clone()
    }

    /// Receiver notified on every panel change
    pub fn subscribe(&self) -> watch::Receiver<Panel> {
        self.panel.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}
