//! Metric data model (kinds, tags, points, series snapshots).
//!
//! Everything here is plain owned data: the engine builds these values under
//! its own locks and hands out copies, so nothing in this module needs to be
//! thread-aware.

mod kind;
mod point;
mod tags;

pub use kind::MetricKind;
pub use point::{MetricPoint, SeriesSnapshot};
pub use tags::Tags;

use crate::error::{Result, TelemetryError};

/// Reject names that are empty or would corrupt the exposition format.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TelemetryError::Validation(
            "metric name must not be empty".into(),
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '{' | '}' | '"'))
    {
        return Err(TelemetryError::Validation(format!(
            "metric name {name:?} contains invalid character {c:?}"
        )));
    }
    Ok(())
}

/// Reject tag keys that would break out of the `{k="v"}` label block.
pub fn validate_tag_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(TelemetryError::Validation("tag key must not be empty".into()));
    }
    if let Some(c) = key
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '{' | '}' | '"' | '='))
    {
        return Err(TelemetryError::Validation(format!(
            "tag key {key:?} contains invalid character {c:?}"
        )));
    }
    Ok(())
}

/// Validate every key of a tag set.
pub fn validate_tags(tags: &Tags) -> Result<()> {
    tags.iter().try_for_each(|(k, _)| validate_tag_key(k))
}
