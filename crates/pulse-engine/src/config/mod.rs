//! Engine config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use pulse_core::error::{Result, TelemetryError};

pub use schema::{
    EventsSection, ExporterSection, LimitsSection, PulseConfig, RetentionSection, SamplerSection,
};

pub fn load_from_file(path: &str) -> Result<PulseConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| TelemetryError::Config(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

/// Like [`load_from_file`], but a missing file yields the defaults.
pub fn load_or_default(path: &str) -> Result<PulseConfig> {
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(%path, "config file not found, using defaults");
            Ok(PulseConfig::default())
        }
        Err(e) => Err(TelemetryError::Config(format!("read config failed: {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<PulseConfig> {
    let cfg: PulseConfig = serde_yaml::from_str(s)
        .map_err(|e| TelemetryError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
