use grantstack_cli::{Inspection, Shape, cache_entry, inspect, inspect_all};
use grantstack_consent::DataDebitStatus;
use grantstack_model::{CacheKeys, CodecConfig};
use grantstack_types::Timestamp;
use pretty_assertions::assert_eq;
use serde_json::json;

fn ts(text: &str) -> Timestamp {
    Timestamp::parse(text).unwrap()
}

fn at_march() -> Timestamp {
    ts("2026-03-01T00:00:00Z")
}

fn debit_payload() -> String {
    json!({
        "dataDebitKey": "dd-calendar",
        "dateCreated": "2026-01-10T08:00:00Z",
        "requestClientName": "Planner",
        "requestClientUrl": "https://planner.example",
        "requestClientLogoUrl": "https://planner.example/logo.png",
        "active": true,
        "permissions": [{
            "dateCreated": "2026-01-10T08:00:00Z",
            "start": "2026-01-10T00:00:00Z",
            "end": "2026-07-10T00:00:00Z",
            "cancelAtPeriodEnd": false,
            "period": 0,
            "active": true,
            "accepted": true,
            "bundle": {"calendar": {"events": true}, "contacts": {"names": true}},
            "conditions": {"contacts": false}
        }]
    })
    .to_string()
}

// ── inspect ──────────────────────────────────────────────────────

#[test]
fn inspect_reports_active_grant() {
    let report = inspect(&debit_payload(), at_march(), &CodecConfig::default()).unwrap();

    assert_eq!(report.data_debit_key, "dd-calendar");
    assert_eq!(report.status, DataDebitStatus::Active);
    assert_eq!(report.permission_count, 1);
    assert_eq!(report.active_permission, Some(0));
    assert_eq!(report.latest_permission, Some(0));
    assert_eq!(report.endpoints, vec!["calendar", "contacts"]);
    assert_eq!(
        report.effective_grant,
        Some(json!({"calendar": {"events": true}, "contacts": false}))
    );
}

#[test]
fn inspect_after_window_is_expired_without_grant() {
    let at = ts("2026-08-01T00:00:00Z");
    let report = inspect(&debit_payload(), at, &CodecConfig::default()).unwrap();

    assert_eq!(report.status, DataDebitStatus::Expired);
    assert_eq!(report.active_permission, None);
    assert!(report.endpoints.is_empty());
    assert_eq!(report.effective_grant, None);
}

#[test]
fn inspect_rejects_malformed_payload() {
    let raw = r#"{"dataDebitKey": 7}"#;
    let err = inspect(raw, at_march(), &CodecConfig::default()).unwrap_err();
    assert!(err.to_string().contains("Failed to decode data debit"));
}

#[test]
fn inspect_report_serializes_camel_case() {
    let report = inspect(&debit_payload(), at_march(), &CodecConfig::default()).unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["dataDebitKey"], json!("dd-calendar"));
    assert_eq!(value["status"], json!("active"));
    assert_eq!(value["at"], json!("2026-03-01T00:00:00Z"));
}

#[test]
fn inspect_all_skips_bad_items() {
    let good: serde_json::Value = serde_json::from_str(&debit_payload()).unwrap();
    let raw = json!([good, {"dataDebitKey": "broken"}, good]).to_string();

    let inspection = inspect_all(&raw, at_march(), &CodecConfig::default()).unwrap();

    let Inspection::Batch(reports) = inspection else {
        panic!("array input must give a batch");
    };
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.status == DataDebitStatus::Active));
}

#[test]
fn inspect_all_skips_debit_with_inconsistent_conditions() {
    let good: serde_json::Value = serde_json::from_str(&debit_payload()).unwrap();
    let mut bad = good.clone();
    bad["dataDebitKey"] = json!("bad");
    bad["permissions"][0]["conditions"] = json!({"zzz": 1});
    let raw = json!([good, bad]).to_string();

    let inspection = inspect_all(&raw, at_march(), &CodecConfig::default()).unwrap();

    let keys: Vec<_> = inspection.reports().iter().map(|r| r.data_debit_key.as_str()).collect();
    assert_eq!(keys, vec!["dd-calendar"]);
}

#[test]
fn inspect_all_keeps_array_shape_for_one_item() {
    let good: serde_json::Value = serde_json::from_str(&debit_payload()).unwrap();
    let raw = json!([good]).to_string();

    let inspection = inspect_all(&raw, at_march(), &CodecConfig::default()).unwrap();

    assert!(matches!(inspection, Inspection::Batch(_)));
    let value = serde_json::to_value(&inspection).unwrap();
    assert!(value.is_array());
    assert_eq!(value[0]["dataDebitKey"], json!("dd-calendar"));
}

#[test]
fn inspect_all_accepts_single_object() {
    let inspection = inspect_all(&debit_payload(), at_march(), &CodecConfig::default()).unwrap();

    assert!(matches!(inspection, Inspection::Single(_)));
    assert_eq!(inspection.reports()[0].data_debit_key, "dd-calendar");
    assert!(serde_json::to_value(&inspection).unwrap().is_object());
}

// ── cache ────────────────────────────────────────────────────────

#[test]
fn cache_entry_uses_configured_keys() {
    let config = CodecConfig {
        cache: CacheKeys {
            normalized_at_key: "_cachedAt".into(),
            image_key: "_logo".into(),
        },
        ..CodecConfig::default()
    };
    let plug = json!({
        "plugId": "calendar",
        "name": "Calendar",
        "url": "https://calendar.example",
        "approved": true,
        "rating": 4
    })
    .to_string();

    let entry = cache_entry(&plug, Shape::Plug, ts("2026-05-01T12:00:00Z"), &config).unwrap();

    assert_eq!(entry["_cachedAt"], json!("2026-05-01T12:00:00Z"));
    assert_eq!(entry["plugId"], json!("calendar"));
    assert!(entry.get("_normalizedAt").is_none());
    assert!(entry.get("_logo").is_none());
}

#[test]
fn cache_entry_for_debit_drops_permissions() {
    let entry = cache_entry(
        &debit_payload(),
        Shape::Debit,
        ts("2026-05-01T12:00:00Z"),
        &CodecConfig::default(),
    )
    .unwrap();

    assert_eq!(entry["dataDebitKey"], json!("dd-calendar"));
    assert_eq!(entry["dateCreated"], json!("2026-01-10T08:00:00Z"));
    assert!(entry.get("permissions").is_none());
    assert_eq!(entry["_normalizedAt"], json!("2026-05-01T12:00:00Z"));
}

#[test]
fn cache_entry_rejects_key_shadowing_a_field() {
    let config = CodecConfig {
        cache: CacheKeys {
            normalized_at_key: "message".into(),
            ..CacheKeys::default()
        },
        ..CodecConfig::default()
    };
    let notice = json!({
        "noticeId": 1,
        "message": "hello",
        "dateCreated": "2026-10-01T00:00:00Z",
        "read": false
    })
    .to_string();

    let err = cache_entry(&notice, Shape::Notice, at_march(), &config).unwrap_err();

    assert!(err.to_string().contains("message"));
}

#[test]
fn cache_entry_reports_shape_on_failure() {
    let config = CodecConfig::default();
    let err = cache_entry("{}", Shape::Notice, Timestamp::now(), &config).unwrap_err();
    assert!(err.to_string().contains("Notice"));
}
