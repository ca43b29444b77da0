use std::time::Duration;

use crate::error::{KefError, Result};

const MAX_DELAY: Duration = Duration::from_secs(60);

/// Timing of the volume sync controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// How long a user-written volume keeps priority over polled values
    /// after the device confirmed the write
    pub debounce: Duration,
    /// Poll retry delay while polling is suppressed by user input
    pub suppressed_retry: Duration,
    /// Delay between device reads when nothing suppresses polling
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(600),
            suppressed_retry: Duration::from_millis(500),
            poll_interval: Duration::from_millis(2000),
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debounce delay with validation
    pub fn with_debounce(mut self, debounce: Duration) -> Result<Self> {
        self.debounce = check_delay("debounce", debounce)?;
        Ok(self)
    }

    /// Set the suppressed retry delay with validation
    pub fn with_suppressed_retry(mut self, retry: Duration) -> Result<Self> {
        self.suppressed_retry = check_delay("suppressed retry", retry)?;
        Ok(self)
    }

    /// Set the poll interval with validation
    pub fn with_poll_interval(mut self, interval: Duration) -> Result<Self> {
        self.poll_interval = check_delay("poll interval", interval)?;
        Ok(self)
    }

    /// Check all delays, for configs built field by field
    pub fn validate(&self) -> Result<()> {
        check_delay("debounce", self.debounce)?;
        check_delay("suppressed retry", self.suppressed_retry)?;
        check_delay("poll interval", self.poll_interval)?;
        Ok(())
    }
}

fn check_delay(name: &str, delay: Duration) -> Result<Duration> {
    if delay.is_zero() {
        return Err(KefError::InvalidConfig(format!("{} must be greater than 0", name)));
    }
    if delay > MAX_DELAY {
        return Err(KefError::InvalidConfig(format!(
            "{} too large (max {}s)",
            name,
            MAX_DELAY.as_secs()
        )));
    }
    Ok(delay)
}
