use std::fmt;

/// A speaker volume as a whole percentage, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Volume(u8);

impl Volume {
    pub const MIN: Volume = Volume(0);
    pub const MAX: Volume = Volume(100);

    /// Volume from a raw slider position. Out of range input is clamped and the
    /// fractional part dropped, the way a 0-100 slider with 100 steps reports.
    pub fn from_raw(raw: f64) -> Self {
        if raw.is_nan() {
            return Volume::MIN;
        }
        Volume(raw.clamp(0.0, 100.0).trunc() as u8)
    }

    /// Volume from the device's `0.0..=1.0` level.
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction.is_nan() {
            return Volume::MIN;
        }
        Volume((fraction * 100.0).round().clamp(0.0, 100.0) as u8)
    }

    pub fn from_percent(percent: i32) -> Self {
        Volume(percent.clamp(0, 100) as u8)
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// The device-level representation, `percent / 100`.
    pub fn as_fraction(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Move by `delta` percentage points, clamped.
    pub fn offset(self, delta: i32) -> Self {
        Volume::from_percent(i32::from(self.0) + delta)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
