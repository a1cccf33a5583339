#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use pulse_core::{MetricKind, MetricPoint, Tags};
use pulse_engine::{export, MetricRegistry};

#[test]
fn counter_keeps_every_increment() {
    let registry = MetricRegistry::with_defaults();
    for _ in 0..2_500 {
        registry.increment("jobs.done", 1.0, &[]).unwrap();
    }
    let series = registry.get_metric("jobs.done").unwrap();
    assert_eq!(series.kind, MetricKind::Counter);
    assert_eq!(series.len(), 2_500);
    assert_eq!(series.sum(), 2_500.0);
}

#[test]
fn gauge_keeps_latest_hundred_in_order() {
    let registry = MetricRegistry::with_defaults();
    for v in 0..250 {
        registry.gauge("queue.depth", v as f64, &[]).unwrap();
    }
    let values: Vec<f64> = registry
        .get_metric("queue.depth")
        .unwrap()
        .points
        .iter()
        .map(|p| p.value)
        .collect();
    let expected: Vec<f64> = (150..250).map(|v| v as f64).collect();
    assert_eq!(values, expected);
}

#[test]
fn histogram_keeps_latest_thousand_in_order() {
    let registry = MetricRegistry::with_defaults();
    for v in 0..1_500 {
        registry.histogram("latency.ms", v as f64, &[]).unwrap();
    }
    let series = registry.get_metric("latency.ms").unwrap();
    assert_eq!(series.len(), 1_000);
    assert_eq!(series.points.first().unwrap().value, 500.0);
    assert_eq!(series.points.last().unwrap().value, 1_499.0);
}

#[test]
fn empty_name_is_rejected_without_side_effects() {
    let registry = MetricRegistry::with_defaults();
    let err = registry.increment("", 1.0, &[]).unwrap_err();
    assert_eq!(err.code().as_str(), "VALIDATION");
    assert!(registry.gauge("", 1.0, &[]).is_err());
    assert!(registry.histogram("", 1.0, &[]).is_err());
    assert_eq!(registry.stats().total_metrics, 0);
}

// Kind policy: the first kind written for a name wins for the registry's
// lifetime; writing the name as another kind is a KindMismatch error.
#[test]
fn kind_mismatch_is_rejected_and_series_untouched() {
    let registry = MetricRegistry::with_defaults();
    registry.increment("req.count", 1.0, &[]).unwrap();

    let err = registry.gauge("req.count", 5.0, &[]).unwrap_err();
    assert_eq!(err.code().as_str(), "KIND_MISMATCH");
    assert!(err.is_rejection());

    let series = registry.get_metric("req.count").unwrap();
    assert_eq!(series.kind, MetricKind::Counter);
    assert_eq!(series.len(), 1);
}

#[test]
fn get_metric_does_not_create() {
    let registry = MetricRegistry::with_defaults();
    assert!(registry.get_metric("nope").is_none());
    assert_eq!(registry.stats().total_metrics, 0);
}

#[test]
fn stats_count_by_kind() {
    let registry = MetricRegistry::with_defaults();
    registry.increment("a", 1.0, &[]).unwrap();
    registry.increment("b", 1.0, &[]).unwrap();
    registry.gauge("c", 1.0, &[]).unwrap();

    let stats = registry.stats();
    assert_eq!(stats.total_metrics, 3);
    assert_eq!(stats.total_points, 3);
    assert_eq!(stats.by_type[&MetricKind::Counter], 2);
    assert_eq!(stats.by_type[&MetricKind::Gauge], 1);
    assert_eq!(stats.by_type[&MetricKind::Histogram], 0);

    registry.histogram("d", 1.0, &[]).unwrap();
    assert_eq!(registry.stats().by_type[&MetricKind::Histogram], 1);
}

#[test]
fn all_metrics_follow_creation_order() {
    let registry = MetricRegistry::with_defaults();
    for name in ["zeta", "alpha", "mid"] {
        registry.increment(name, 1.0, &[]).unwrap();
    }
    let names: Vec<String> = registry.get_all_metrics().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn concurrent_producers_lose_no_writes() {
    let registry = MetricRegistry::with_defaults();
    let producers: Vec<_> = (0..8)
        .map(|p| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let producer = p.to_string();
                for i in 0..500 {
                    registry
                        .increment("shared.count", 1.0, &[("producer", &producer)])
                        .unwrap();
                    registry.gauge(&format!("own.{p}"), i as f64, &[]).unwrap();
                }
            })
        })
        .collect();
    for handle in producers {
        handle.join().unwrap();
    }

    let shared = registry.get_metric("shared.count").unwrap();
    assert_eq!(shared.len(), 8 * 500);

    // Each producer's own writes stay in issue order.
    for p in 0..8 {
        let mine: Vec<f64> = shared
            .points
            .iter()
            .filter(|pt| pt.tags.get("producer") == Some(p.to_string().as_str()))
            .map(|pt| pt.value)
            .collect();
        assert_eq!(mine.len(), 500);

        let own = registry.get_metric(&format!("own.{p}")).unwrap();
        let values: Vec<f64> = own.points.iter().map(|pt| pt.value).collect();
        let expected: Vec<f64> = (400..500).map(|v| v as f64).collect();
        assert_eq!(values, expected);
    }
}

#[test]
fn req_count_scenario() {
    let registry = MetricRegistry::with_defaults();
    for _ in 0..3 {
        registry.increment_one("req.count").unwrap();
    }
    let series = registry.get_metric("req.count").unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series.kind, MetricKind::Counter);

    let text = export::render_text(&registry);
    assert!(text.starts_with(
        "# HELP req.count counter metric\n# TYPE req.count counter\nreq.count 1\nreq.count 1\nreq.count 1\n"
    ));
}

#[test]
fn tagged_gauge_scenario() {
    let registry = MetricRegistry::with_defaults();
    registry.gauge("mem.mb", 128.0, &[("unit", "MB")]).unwrap();
    let text = export::render_text(&registry);
    assert!(text.lines().any(|l| l == r#"mem.mb{unit="MB"} 128"#), "{text}");
}

#[test]
fn export_round_trip_and_idempotence() {
    let registry = MetricRegistry::with_defaults();
    registry.increment("a", 2.0, &[("route", "/x"), ("method", "GET")]).unwrap();
    registry.gauge("b", 0.5, &[]).unwrap();
    registry.histogram("c", 12.25, &[("shard", "1")]).unwrap();
    registry.histogram("c", 3.0, &[]).unwrap();

    let first = export::render_text(&registry);
    assert_eq!(first, export::render_text(&registry));

    for series in registry.get_all_metrics() {
        let samples: Vec<&str> = first
            .lines()
            .filter(|l| {
                !l.starts_with('#')
                    && (l.starts_with(&format!("{} ", series.name))
                        || l.starts_with(&format!("{}{{", series.name)))
            })
            .collect();
        assert_eq!(samples.len(), series.len(), "{}", series.name);
    }
    assert!(first.contains("a{route=\"/x\",method=\"GET\"} 2\n"));

    let json = export::snapshot_json(&registry).unwrap();
    let back: Vec<pulse_core::SeriesSnapshot> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 3);
    assert_eq!(back[2].points.len(), 2);
}

#[test]
fn invalid_tag_keys_are_rejected_without_side_effects() {
    let registry = MetricRegistry::with_defaults();
    let mut sub = registry.subscribe();

    for bad in ["a\nb", "a\"b", "a}b", "a=b", "", "a b"] {
        let err = registry.gauge("g", 1.0, &[(bad, "v")]).unwrap_err();
        assert_eq!(err.code().as_str(), "VALIDATION", "{bad:?}");
        assert!(registry.increment("c", 1.0, &[(bad, "v")]).is_err());
        assert!(registry.histogram("h", 1.0, &[(bad, "v")]).is_err());
    }
    assert_eq!(registry.stats().total_metrics, 0);
    assert!(sub.try_recv().is_none());

    // Hostile values are fine: they are escaped onto a single line.
    registry.gauge("g", 1.0, &[("k", "a\nb}")]).unwrap();
    registry.gauge("g", 2.0, &[]).unwrap();
    let text = export::render_text(&registry);
    let samples = text
        .lines()
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .count();
    assert_eq!(samples, 2, "{text}");
}

#[test]
fn record_rejects_invalid_tag_keys() {
    let registry = MetricRegistry::with_defaults();
    let point = MetricPoint::now(1.0, Tags::from([("bad=key", "v")]));
    let err = registry.record("r", MetricKind::Counter, point).unwrap_err();
    assert_eq!(err.code().as_str(), "VALIDATION");
    assert!(registry.get_metric("r").is_none());
}

#[test]
fn concurrent_appends_are_chronological() {
    let registry = MetricRegistry::with_defaults();
    let producers: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..500 {
                    registry.histogram("contended.ms", 1.0, &[]).unwrap();
                }
            })
        })
        .collect();
    for handle in producers {
        handle.join().unwrap();
    }

    let series = registry.get_metric("contended.ms").unwrap();
    assert_eq!(series.len(), 1_000);
    assert!(series
        .points
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));
}
