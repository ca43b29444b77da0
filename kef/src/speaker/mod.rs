mod client;
mod simulated;

#[cfg(feature = "mock")]
pub mod mock;

pub use client::SpeakerClient;
pub use simulated::{SimulatedSpeaker, SimulatedSpeakerBuilder};
