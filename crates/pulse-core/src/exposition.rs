//! Text exposition format (scrape-compatible).
//!
//! Layout per series, in the order the snapshots are given:
//!
//! ```text
//! # HELP <name> <kind> metric
//! # TYPE <name> <kind>
//! <name>{k1="v1",k2="v2"} <value>
//! <blank line>
//! ```
//!
//! One sample line per retained point (raw samples, no pre-aggregation).
//! Tags render in their stored order; the brace block is omitted for points
//! without tags. Rendering is a pure function of its input.

use std::fmt::Write;

use crate::metric::{MetricPoint, SeriesSnapshot};

/// Content type served alongside [`render`].
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Helper to escape label values.
pub fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Render a sample value. Integral floats print without a fraction.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v.is_infinite() {
        if v > 0.0 { "+Inf".into() } else { "-Inf".into() }
    } else {
        format!("{v}")
    }
}

/// Render every series.
pub fn render(series: &[SeriesSnapshot]) -> String {
    let mut out = String::new();
    for s in series {
        render_series(s, &mut out);
    }
    out
}

/// Render one series block, trailing blank line included.
pub fn render_series(series: &SeriesSnapshot, out: &mut String) {
    let name = &series.name;
    let kind = series.kind;
    let _ = writeln!(out, "# HELP {name} {kind} metric");
    let _ = writeln!(out, "# TYPE {name} {kind}");
    for p in &series.points {
        render_sample(name, p, out);
    }
    out.push('\n');
}

fn render_sample(name: &str, point: &MetricPoint, out: &mut String) {
    let value = format_value(point.value);
    if point.tags.is_empty() {
        let _ = writeln!(out, "{name} {value}");
        return;
    }
    let label_str = point
        .tags
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",");
    let _ = writeln!(out, "{name}{{{label_str}}} {value}");
}
