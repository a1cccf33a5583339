use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use pulse_core::error::{Result, TelemetryError};

const MAX_WINDOW_SECS: u64 = 30 * 24 * 3600;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PulseConfig {
    pub version: u32,

    #[serde(default)]
    pub retention: RetentionSection,

    #[serde(default)]
    pub limits: LimitsSection,

    #[serde(default)]
    pub events: EventsSection,

    #[serde(default)]
    pub sampler: SamplerSection,

    #[serde(default)]
    pub exporter: ExporterSection,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            version: 1,
            retention: RetentionSection::default(),
            limits: LimitsSection::default(),
            events: EventsSection::default(),
            sampler: SamplerSection::default(),
            exporter: ExporterSection::default(),
        }
    }
}

impl PulseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TelemetryError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.retention.validate()?;
        self.limits.validate()?;
        self.events.validate()?;
        self.sampler.validate()?;
        self.exporter.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionSection {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RetentionSection {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RetentionSection {
    pub fn validate(&self) -> Result<()> {
        if !(60..=MAX_WINDOW_SECS).contains(&self.window_secs) {
            return Err(TelemetryError::Config(format!(
                "retention.window_secs must be between 60 and {MAX_WINDOW_SECS}"
            )));
        }
        if self.sweep_interval_secs == 0 || self.sweep_interval_secs > self.window_secs {
            return Err(TelemetryError::Config(
                "retention.sweep_interval_secs must be between 1 and window_secs".into(),
            ));
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    #[serde(default = "default_gauge_max_points")]
    pub gauge_max_points: usize,

    #[serde(default = "default_histogram_max_points")]
    pub histogram_max_points: usize,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            gauge_max_points: default_gauge_max_points(),
            histogram_max_points: default_histogram_max_points(),
        }
    }
}

impl LimitsSection {
    pub fn validate(&self) -> Result<()> {
        if self.gauge_max_points == 0 {
            return Err(TelemetryError::Config("limits.gauge_max_points must be >= 1".into()));
        }
        if self.histogram_max_points == 0 {
            return Err(TelemetryError::Config(
                "limits.histogram_max_points must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsSection {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl EventsSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=65536).contains(&self.channel_capacity) {
            return Err(TelemetryError::Config(
                "events.channel_capacity must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_sample_interval_secs")]
    pub interval_secs: u64,
}

impl Default for SamplerSection {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_sample_interval_secs(),
        }
    }
}

impl SamplerSection {
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(TelemetryError::Config("sampler.interval_secs must be >= 1".into()));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            TelemetryError::Config(format!(
                "exporter.listen must be a valid SocketAddr, got {:?}",
                self.listen
            ))
        })
    }
}

fn default_window_secs() -> u64 {
    24 * 3600
}
fn default_sweep_interval_secs() -> u64 {
    3600
}
fn default_gauge_max_points() -> usize {
    100
}
fn default_histogram_max_points() -> usize {
    1000
}
fn default_channel_capacity() -> usize {
    1024
}
fn default_true() -> bool {
    true
}
fn default_sample_interval_secs() -> u64 {
    30
}
fn default_listen() -> String {
    "0.0.0.0:9464".into()
}
