//! Read-only exporters over a registry snapshot.
//!
//! Both formats take one snapshot (`get_all_metrics`) and never mutate the
//! registry.

use pulse_core::error::{Result, TelemetryError};
use pulse_core::{exposition, SeriesSnapshot};

use crate::registry::MetricRegistry;

/// Structured snapshot for programmatic consumers.
pub fn snapshot(registry: &MetricRegistry) -> Vec<SeriesSnapshot> {
    registry.get_all_metrics()
}

/// Structured snapshot as JSON.
pub fn snapshot_json(registry: &MetricRegistry) -> Result<String> {
    serde_json::to_string(&snapshot(registry))
        .map_err(|e| TelemetryError::Internal(format!("snapshot encode failed: {e}")))
}

/// Scrape-compatible text exposition.
pub fn render_text(registry: &MetricRegistry) -> String {
    exposition::render(&snapshot(registry))
}
