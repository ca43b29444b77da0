use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};

use kef::{KefError, Result, SimulatedSpeaker, SyncConfig, Volume};
use log::LevelFilter;
use serde::Deserialize;

pub const DEFAULT_SPEAKER_ADDRESS: &str = "192.168.1.10";

/// Panel configuration: defaults, then the JSON file named by `KEF_CONFIG`,
/// then individual environment overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub speaker_address: String,
    pub sync: SyncConfig,
    /// Percentage points per arrow key press
    pub nudge_step: u8,
    /// Idle time after the last arrow key before the nudged volume is written
    pub nudge_commit: Duration,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
    pub simulation: SimulationConfig,
}

/// Behavior of the in-process speaker the panel drives
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub initial_volume: u8,
    pub latency_ms: u64,
    pub jitter_ms: u64,
    pub propagation_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_volume: 30,
            latency_ms: 30,
            jitter_ms: 40,
            propagation_ms: 300,
        }
    }
}

impl SimulationConfig {
    pub fn build(&self, address: &str) -> SimulatedSpeaker {
        SimulatedSpeaker::builder(address)
            .volume(Volume::from_percent(i32::from(self.initial_volume)))
            .latency(Duration::from_millis(self.latency_ms))
            .jitter(Duration::from_millis(self.jitter_ms))
            .propagation(Duration::from_millis(self.propagation_ms))
            .build()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    speaker_address: Option<String>,
    debounce_ms: Option<u64>,
    suppressed_retry_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
    nudge_step: Option<u8>,
    nudge_commit_ms: Option<u64>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
    simulation: Option<SimulationConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            speaker_address: DEFAULT_SPEAKER_ADDRESS.to_string(),
            sync: SyncConfig::default(),
            nudge_step: 2,
            nudge_commit: Duration::from_millis(400),
            log_file: env::temp_dir().join("kef-panel.log"),
            log_level: LevelFilter::Info,
            simulation: SimulationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self> {
        let file = match env::var("KEF_CONFIG") {
            Ok(path) => Some(fs::read_to_string(path)?),
            Err(_) => None,
        };
        Self::from_sources(file.as_deref(), |key| env::var(key).ok())
    }

    pub fn from_sources<F>(file: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(contents) = file {
            let file: ConfigFile = serde_json::from_str(contents)
                .map_err(|e| KefError::InvalidConfig(format!("config file: {}", e)))?;
            config.apply_file(file)?;
        }

        if let Some(address) = env("KEF_SPEAKER_ADDRESS") {
            config.speaker_address = address;
        }
        if let Some(path) = env("KEF_LOG") {
            config.log_file = PathBuf::from(path);
        }
        if let Some(level) = env("KEF_LOG_LEVEL") {
            config.log_level = parse_level(&level)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) -> Result<()> {
        if let Some(address) = file.speaker_address {
            self.speaker_address = address;
        }
        if let Some(ms) = file.debounce_ms {
            self.sync = self.sync.with_debounce(Duration::from_millis(ms))?;
        }
        if let Some(ms) = file.suppressed_retry_ms {
            self.sync = self.sync.with_suppressed_retry(Duration::from_millis(ms))?;
        }
        if let Some(ms) = file.poll_interval_ms {
            self.sync = self.sync.with_poll_interval(Duration::from_millis(ms))?;
        }
        if let Some(step) = file.nudge_step {
            self.nudge_step = step;
        }
        if let Some(ms) = file.nudge_commit_ms {
            self.nudge_commit = Duration::from_millis(ms);
        }
        if let Some(path) = file.log_file {
            self.log_file = path;
        }
        if let Some(level) = file.log_level {
            self.log_level = parse_level(&level)?;
        }
        if let Some(simulation) = file.simulation {
            self.simulation = simulation;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.speaker_address.trim().is_empty() {
            return Err(KefError::InvalidConfig("speaker address is empty".to_string()));
        }
        if self.nudge_step == 0 || self.nudge_step > 100 {
            return Err(KefError::InvalidConfig(
                "nudge step must be between 1 and 100".to_string(),
            ));
        }
        if self.nudge_commit.is_zero() {
            return Err(KefError::InvalidConfig(
                "nudge commit delay must be greater than 0".to_string(),
            ));
        }
        if self.simulation.initial_volume > 100 {
            return Err(KefError::InvalidConfig(
                "simulated initial volume must be at most 100".to_string(),
            ));
        }
        self.sync.validate()
    }
}

fn parse_level(level: &str) -> Result<LevelFilter> {
    level
        .parse()
        .map_err(|_| KefError::InvalidConfig(format!("unknown log level: {}", level)))
}
