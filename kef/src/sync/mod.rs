pub mod controller;
pub mod panel;
pub mod state;
pub mod timer;

pub use controller::{ControlEvent, ControllerHandle, SpeakerCommand, VolumeSyncController};
pub use panel::{Panel, VolumeLabel};
pub use state::{Effect, VolumeSync};
pub use timer::{TimerEvent, TimerId, Timers, TokioTimers};
