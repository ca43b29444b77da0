pub mod config;
pub mod error;
pub mod source;
pub mod speaker;
pub mod sync;
pub mod volume;

// Re-export key types for easier access
pub use config::SyncConfig;
pub use error::{KefError, Result};
pub use source::Source;
pub use speaker::{SimulatedSpeaker, SpeakerClient};
pub use sync::{ControllerHandle, Panel, VolumeLabel, VolumeSync, VolumeSyncController};
pub use volume::Volume;
