use async_trait::async_trait;
use mockall::mock;

use crate::error::KefError;
use crate::source::Source;
use crate::speaker::SpeakerClient;
use crate::volume::Volume;

mock! {
    pub Speaker {}

    #[async_trait]
    impl SpeakerClient for Speaker {
        fn address(&self) -> &str;

        async fn get_volume(&self) -> Result<f64, KefError>;
        async fn set_volume(&self, level: f64) -> Result<(), KefError>;
        async fn set_source(&self, source: Source) -> Result<(), KefError>;
        async fn turn_off(&self) -> Result<(), KefError>;
    }
}

/// Builds a [`MockSpeaker`] that answers every call successfully
pub struct MockSpeakerBuilder {
    address: String,
    volume: Volume,
}

impl Default for MockSpeakerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpeakerBuilder {
    pub fn new() -> Self {
        Self {
            address: "192.168.1.10".into(),
            volume: Volume::from_percent(50),
        }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Volume every `get_volume` call reports
    pub fn volume(mut self, volume: Volume) -> Self {
        self.volume = volume;
        self
    }

    pub fn build(self) -> MockSpeaker {
        let mut speaker = MockSpeaker::new();
        let level = self.volume.as_fraction();

        speaker.expect_address().return_const(self.address);
        speaker.expect_get_volume().returning(move || Ok(level));
        speaker.expect_set_volume().returning(|_| Ok(()));
        speaker.expect_set_source().returning(|_| Ok(()));
        speaker.expect_turn_off().returning(|| Ok(()));

        speaker
    }
}
