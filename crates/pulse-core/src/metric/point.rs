use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::{MetricKind, Tags};

/// One timestamped observation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Wall-clock time of the observation (`timestamp_ms` on the wire).
    #[serde(rename = "timestamp_ms", with = "epoch_millis")]
    pub timestamp: SystemTime,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl MetricPoint {
    /// Point stamped with the current time.
    pub fn now(value: f64, tags: Tags) -> Self {
        Self::at(SystemTime::now(), value, tags)
    }

    pub fn at(timestamp: SystemTime, value: f64, tags: Tags) -> Self {
        Self {
            timestamp,
            value,
            tags,
        }
    }

    /// True when the point is strictly older than `cutoff`.
    pub fn is_before(&self, cutoff: SystemTime) -> bool {
        self.timestamp < cutoff
    }
}

/// Owned copy of a series handed out by read APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    pub name: String,
    pub kind: MetricKind,
    pub points: Vec<MetricPoint>,
}

impl SeriesSnapshot {
    /// Sum of all retained values (running total for counters).
    pub fn sum(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }

    /// Most recent value, if any.
    pub fn last(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

mod epoch_millis {
    use super::{Duration, SystemTime, UNIX_EPOCH};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &SystemTime, s: S) -> Result<S::Ok, S::Error> {
        // Pre-epoch clocks serialize as 0.
        let ms = ts
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        s.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SystemTime, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(UNIX_EPOCH + Duration::from_millis(ms))
    }
}
