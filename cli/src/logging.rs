use std::fs::OpenOptions;
use std::io;

use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::AppConfig;

/// Send log output to the configured file; the terminal belongs to the UI.
pub fn init(config: &AppConfig) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let log_config = ConfigBuilder::new()
        .set_target_level(simplelog::LevelFilter::Error)
        .build();

    WriteLogger::init(config.log_level, log_config, file)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}
