use std::fmt;
use std::str::FromStr;

use crate::error::KefError;

/// Input sources the speaker can switch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Aux,
    Bluetooth,
    Optical,
    Wifi,
}

impl Source {
    /// All sources in panel order.
    pub const ALL: [Source; 4] = [Source::Aux, Source::Bluetooth, Source::Optical, Source::Wifi];

    pub fn name(&self) -> &'static str {
        match self {
            Source::Aux => "Aux",
            Source::Bluetooth => "Bluetooth",
            Source::Optical => "Optical",
            Source::Wifi => "Wifi",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Source {
    type Err = KefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| KefError::UnknownSource(s.to_string()))
    }
}
