use grantstack_model::records::{DataPlug, Notice, ProfileField};
use grantstack_model::{
    CacheCodec, CacheDict, CacheKeys, CacheValue, CodecConfig, Marshal, MarshalError,
};
use grantstack_types::Timestamp;
use pretty_assertions::assert_eq;
use serde_json::json;

fn ts(text: &str) -> Timestamp {
    Timestamp::parse(text).unwrap()
}

fn sample_plug() -> DataPlug {
    DataPlug {
        plug_id: "spotify".into(),
        name: "Spotify".into(),
        url: "https://spotify.example".into(),
        description: Some("Listening history".into()),
        category: None,
        approved: true,
        rating: 5,
        image: Some(vec![0x89, 0x50, 0x4e, 0x47]),
        last_updated: None,
    }
}

// ── Round trips ──────────────────────────────────────────────────

#[test]
fn plug_round_trip_preserves_scalars_and_image() {
    let codec = CacheCodec::default();
    let plug = sample_plug();
    let now = ts("2026-04-01T12:00:00Z");

    let dict = codec.encode_at(&plug, now);
    let back: DataPlug = codec.decode(&dict);

    assert_eq!(
        back,
        DataPlug {
            last_updated: Some(now),
            ..plug
        }
    );
}

#[test]
fn notice_round_trip_is_exact() {
    let codec = CacheCodec::default();
    let notice = Notice {
        notice_id: 3,
        message: "m".into(),
        date_created: ts("2026-01-02T03:04:05.678Z"),
        read: true,
        sender_name: Some("s".into()),
    };
    let back: Notice = codec.decode(&codec.encode(&notice));
    assert_eq!(back, notice);
}

#[test]
fn profile_round_trip_keeps_absent_optional_absent() {
    let codec = CacheCodec::default();
    let field = ProfileField {
        name: "city".into(),
        value: "Leeds".into(),
        shared: false,
        date_updated: None,
    };
    let back: ProfileField = codec.decode(&codec.encode(&field));
    assert_eq!(back, field);
}

// ── Encoding layout ──────────────────────────────────────────────

#[test]
fn encode_writes_flat_primitives_and_reserved_keys() {
    let codec = CacheCodec::default();
    let now = ts("2026-04-01T12:00:00Z");
    let dict = codec.encode_at(&sample_plug(), now);

    assert_eq!(dict.get("plugId"), Some(&CacheValue::Text("spotify".into())));
    assert_eq!(dict.get("rating"), Some(&CacheValue::Integer(5)));
    assert_eq!(dict.get("approved"), Some(&CacheValue::Bool(true)));
    assert_eq!(dict.get("category"), None);
    assert_eq!(dict.get("image"), None);
    assert_eq!(
        dict.get("_image"),
        Some(&CacheValue::Blob(vec![0x89, 0x50, 0x4e, 0x47]))
    );
    assert_eq!(
        dict.get("_normalizedAt"),
        Some(&CacheValue::Text("2026-04-01T12:00:00Z".into()))
    );
}

#[test]
fn encode_ignores_carried_over_last_updated() {
    let codec = CacheCodec::default();
    let plug = DataPlug {
        last_updated: Some(ts("2020-01-01T00:00:00Z")),
        ..sample_plug()
    };
    let now = ts("2026-04-01T12:00:00Z");
    let back: DataPlug = codec.decode(&codec.encode_at(&plug, now));
    assert_eq!(back.last_updated, Some(now));
}

#[test]
fn every_encode_writes_normalization_key() {
    let codec = CacheCodec::default();
    let notice = Notice::default();
    let dict = codec.encode(&notice);
    let Some(CacheValue::Text(stamp)) = dict.get("_normalizedAt") else {
        panic!("normalization key missing");
    };
    assert!(Timestamp::parse(stamp).is_ok());
}

#[test]
fn configured_keys_are_used() {
    let config = CodecConfig::from_toml_str(
        "[cache]\nnormalized_at_key = \"syncedAt\"\nimage_key = \"logo\"\n",
    )
    .unwrap();
    let codec = CacheCodec::new(config.cache);
    let dict = codec.encode_at(&sample_plug(), ts("2026-01-01T00:00:00Z"));
    assert!(dict.get("syncedAt").is_some());
    assert!(dict.get("logo").is_some());
    assert!(dict.get("_image").is_none());
    assert_eq!(codec.keys().image_key, "logo");
}

#[test]
fn reserved_key_shadowing_a_field_is_reported() {
    let codec = CacheCodec::new(CacheKeys {
        normalized_at_key: "message".into(),
        ..CacheKeys::default()
    });
    let notice = Notice {
        notice_id: 9,
        message: "hello".into(),
        date_created: ts("2026-10-01T00:00:00Z"),
        read: false,
        sender_name: None,
    };

    let err = codec.check::<Notice>().unwrap_err();
    assert!(matches!(err, MarshalError::ReservedKeyCollision { record: "Notice", .. }));
    assert_eq!(err.field(), Some("message"));

    let stamp = ts("2026-10-16T20:35:42.896Z");
    let dict = codec.encode_at(&notice, stamp);
    assert_eq!(dict.get("message"), Some(&CacheValue::Text(stamp.to_iso8601())));

    let back: Notice = codec.decode(&dict);
    assert_ne!(back.message, stamp.to_iso8601());
    assert_eq!(back, Notice { message: String::new(), ..notice });
}

#[test]
fn default_keys_pass_the_check() {
    let codec = CacheCodec::default();
    assert!(codec.check::<Notice>().is_ok());
    assert!(codec.check::<DataPlug>().is_ok());
    assert!(codec.check::<ProfileField>().is_ok());
}

#[test]
fn try_new_rejects_duplicate_reserved_keys() {
    let err = CacheCodec::try_new(CacheKeys {
        normalized_at_key: "meta".into(),
        image_key: "meta".into(),
    })
    .unwrap_err();
    assert!(matches!(err, MarshalError::ReservedKeyCollision { ref key, .. } if key == "meta"));
    assert!(CacheCodec::try_new(CacheKeys::default()).is_ok());
}

// ── Tolerant decode ──────────────────────────────────────────────

#[test]
fn numeric_text_decodes_to_integer() {
    let codec = CacheCodec::default();
    let dict: CacheDict = [
        ("noticeId", CacheValue::Text("42".into())),
        ("message", CacheValue::Text("hi".into())),
    ]
    .into_iter()
    .collect();
    let notice: Notice = codec.decode(&dict);
    assert_eq!(notice.notice_id, 42);
    assert_eq!(notice.message, "hi");
}

#[test]
fn integer_decodes_to_text() {
    let codec = CacheCodec::default();
    let dict: CacheDict = [("value", CacheValue::Integer(7))].into_iter().collect();
    let field: ProfileField = codec.decode(&dict);
    assert_eq!(field.value, "7");
}

#[test]
fn boolean_text_decodes_to_bool() {
    let codec = CacheCodec::default();
    let dict: CacheDict = [("shared", CacheValue::Text("true".into()))].into_iter().collect();
    let field: ProfileField = codec.decode(&dict);
    assert!(field.shared);
}

#[test]
fn missing_fields_default_to_zero_values() {
    let codec = CacheCodec::default();
    let notice: Notice = codec.decode(&CacheDict::new());
    assert_eq!(notice, Notice::default());
    assert_eq!(notice.date_created, Timestamp::unix_epoch());
    assert_eq!(notice.sender_name, None);
}

#[test]
fn uncoercible_value_defaults_only_that_field() {
    let codec = CacheCodec::default();
    let dict: CacheDict = [
        ("noticeId", CacheValue::Text("forty-two".into())),
        ("message", CacheValue::Text("kept".into())),
        ("read", CacheValue::Blob(vec![1])),
    ]
    .into_iter()
    .collect();
    let notice: Notice = codec.decode(&dict);
    assert_eq!(notice.notice_id, 0);
    assert!(!notice.read);
    assert_eq!(notice.message, "kept");
}

#[test]
fn legacy_epoch_millis_timestamp_is_accepted() {
    let codec = CacheCodec::default();
    let dict: CacheDict = [("dateCreated", CacheValue::Integer(1_700_000_000_500))]
        .into_iter()
        .collect();
    let notice: Notice = codec.decode(&dict);
    assert_eq!(notice.date_created.epoch_millis(), 1_700_000_000_000);
}

#[test]
fn malformed_timestamp_defaults_silently() {
    let codec = CacheCodec::default();
    let dict: CacheDict = [("dateUpdated", CacheValue::Text("soon".into()))]
        .into_iter()
        .collect();
    let field: ProfileField = codec.decode(&dict);
    assert_eq!(field.date_updated, None);
}

// ── JSON import/export ───────────────────────────────────────────

#[test]
fn import_json_accepts_primitives() {
    let codec = CacheCodec::new(CacheKeys::default());
    let dict = codec
        .import_json(&json!({"noticeId": 5, "read": true, "message": "x", "_image": "AQI="}))
        .unwrap();
    assert_eq!(dict.get("noticeId"), Some(&CacheValue::Integer(5)));
    assert_eq!(dict.get("_image"), Some(&CacheValue::Blob(vec![1, 2])));
    assert_eq!(dict.len(), 4);
}

#[test]
fn import_json_rejects_nested_values() {
    let codec = CacheCodec::default();
    let err = codec
        .import_json(&json!({"conditions": {"a": 1}}))
        .unwrap_err();
    match err {
        MarshalError::UnsupportedCacheValueType { key, found } => {
            assert_eq!(key, "conditions");
            assert_eq!(found, "object");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(codec.import_json(&json!({"x": 1.5})).is_err());
    assert!(codec.import_json(&json!({"x": null})).is_err());
    assert!(codec.import_json(&json!({"x": [1]})).is_err());
    assert!(codec.import_json(&json!("flat")).is_err());
}

#[test]
fn export_then_import_preserves_dictionary() {
    let codec = CacheCodec::default();
    let dict = codec.encode_at(&sample_plug(), ts("2026-01-01T00:00:00Z"));
    let back = codec.import_json(&codec.export_json(&dict)).unwrap();
    assert_eq!(back, dict);
}

#[test]
fn describe_renders_scalars_only() {
    assert_eq!(CacheValue::Integer(-3).describe(), Some("-3".into()));
    assert_eq!(CacheValue::Bool(false).describe(), Some("false".into()));
    assert_eq!(CacheValue::Blob(vec![]).describe(), None);
}

#[test]
fn schema_drives_cache_keys() {
    let codec = CacheCodec::default();
    let dict = codec.encode_at(&sample_plug(), Timestamp::unix_epoch());
    for (key, _) in dict.iter() {
        let known = DataPlug::SCHEMA.field(key).is_some() || key.starts_with('_');
        assert!(known, "unexpected cache key {key}");
    }
}
