#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::{Duration, UNIX_EPOCH};

use pulse_core::metric::validate_name;
use pulse_core::{MetricKind, MetricPoint, SeriesSnapshot, Tags};

#[test]
fn empty_name_is_rejected() {
    let err = validate_name("").expect_err("must fail");
    assert_eq!(err.code().as_str(), "VALIDATION");
}

#[test]
fn names_that_break_exposition_are_rejected() {
    for bad in ["a b", "a{b", "a\"b", "a\nb"] {
        assert!(validate_name(bad).is_err(), "{bad:?}");
    }
    validate_name("system.memory.heap_used").unwrap();
}

#[test]
fn tags_keep_insertion_order_and_overwrite_in_place() {
    let tags = Tags::from_pairs(&[("z", "1"), ("a", "2"), ("z", "3")]);
    let pairs: Vec<_> = tags.iter().collect();
    assert_eq!(pairs, vec![("z", "3"), ("a", "2")]);
    assert_eq!(tags.get("a"), Some("2"));
}

#[test]
fn point_json_shape() {
    let point = MetricPoint::at(
        UNIX_EPOCH + Duration::from_millis(1_500),
        2.5,
        Tags::from([("b", "1"), ("a", "2")]),
    );
    let json = serde_json::to_string(&point).unwrap();
    assert_eq!(json, r#"{"timestamp_ms":1500,"value":2.5,"tags":{"b":"1","a":"2"}}"#);

    let back: MetricPoint = serde_json::from_str(&json).unwrap();
    assert_eq!(back, point);
}

#[test]
fn untagged_point_omits_tags() {
    let point = MetricPoint::at(UNIX_EPOCH, 1.0, Tags::new());
    let json = serde_json::to_string(&point).unwrap();
    assert_eq!(json, r#"{"timestamp_ms":0,"value":1.0}"#);
}

#[test]
fn snapshot_sum_is_running_total() {
    let snap = SeriesSnapshot {
        name: "req.count".into(),
        kind: MetricKind::Counter,
        points: (1..=4)
            .map(|v| MetricPoint::at(UNIX_EPOCH, v as f64, Tags::new()))
            .collect(),
    };
    assert_eq!(snap.sum(), 10.0);
    assert_eq!(snap.last(), Some(4.0));
    assert_eq!(serde_json::to_value(snap.kind).unwrap(), "counter");
}

#[test]
fn tag_keys_that_break_the_label_block_are_rejected() {
    use pulse_core::metric::{validate_tag_key, validate_tags};

    for bad in ["", "a\nb", "a b", "a\"b", "a}b", "a{b", "a=b"] {
        let err = validate_tag_key(bad).expect_err(bad);
        assert_eq!(err.code().as_str(), "VALIDATION", "{bad:?}");
    }
    validate_tag_key("http.route").unwrap();
    validate_tag_key("shard-id_2").unwrap();

    assert!(validate_tags(&Tags::from([("ok", "1"), ("bad key", "2")])).is_err());
    // Values are escaped at render time, so anything goes there.
    validate_tags(&Tags::from([("route", "/a\"b\n}")])).unwrap();
}

#[test]
fn error_codes_are_stable() {
    use pulse_core::ErrorCode;

    assert_eq!(ErrorCode::NotFound.as_str(), "NOT_FOUND");
    assert_eq!(ErrorCode::KindMismatch.as_str(), "KIND_MISMATCH");
}
