use async_trait::async_trait;

use crate::error::KefError;
use crate::source::Source;

/// Control surface of one speaker.
///
/// Volume levels cross this boundary as the device's `0.0..=1.0` fraction;
/// callers convert with [`crate::Volume`]. Implementations bind to a single
/// speaker for their whole lifetime and may be shared between tasks.
#[async_trait]
pub trait SpeakerClient: Send + Sync {
    /// Address the client is bound to, for display
    fn address(&self) -> &str;

    async fn get_volume(&self) -> Result<f64, KefError>;

    async fn set_volume(&self, level: f64) -> Result<(), KefError>;

    /// Switch input. Wakes the speaker from standby.
    async fn set_source(&self, source: Source) -> Result<(), KefError>;

    /// Put the speaker in standby
    async fn turn_off(&self) -> Result<(), KefError>;
}
