use std::fmt;

use crate::volume::Volume;

/// Text of the volume label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeLabel {
    /// Nothing read from the speaker yet
    Loading,
    Level(Volume),
    Error(String),
}

impl fmt::Display for VolumeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeLabel::Loading => write!(f, "Volume: ..."),
            VolumeLabel::Level(volume) => write!(f, "Volume: {}", volume),
            VolumeLabel::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Everything the volume controls display, published by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub label: VolumeLabel,
    pub slider: Volume,
    /// Outcome of the last source or power command
    pub status: Option<String>,
}

impl Default for Panel {
    fn default() -> Self {
        Self {
            label: VolumeLabel::Loading,
            slider: Volume::MIN,
            status: None,
        }
    }
}

impl Panel {
    /// Volume shown by the label, if it shows one
    pub fn displayed_volume(&self) -> Option<Volume> {
        match self.label {
            VolumeLabel::Level(volume) => Some(volume),
            _ => None,
        }
    }

    pub(crate) fn show(&mut self, volume: Volume) {
        self.label = VolumeLabel::Level(volume);
        self.slider = volume;
    }
}
