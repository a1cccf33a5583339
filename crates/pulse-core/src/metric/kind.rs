use std::fmt;

use serde::{Deserialize, Serialize};

/// Metric kind, fixed per name at first observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Discrete deltas; consumers sum them.
    Counter,
    /// Instantaneous values; recent samples only.
    Gauge,
    /// Raw samples of a distribution.
    Histogram,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Counter, MetricKind::Gauge, MetricKind::Histogram];

    /// Lowercase name used in `# TYPE` lines and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
