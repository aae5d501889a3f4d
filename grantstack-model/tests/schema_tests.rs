use grantstack_model::records::{DataPlug, Notice, ProfileField};
use grantstack_model::{
    FieldDescriptor, FieldRole, FieldType, FieldValue, Fields, Marshal, RecordSchema,
};

// ── FieldDescriptor constructors ─────────────────────────────────

#[test]
fn text_field_is_required_wire_field() {
    let f = FieldDescriptor::text("name");
    assert_eq!(f.name, "name");
    assert!(matches!(f.field_type, FieldType::Text));
    assert!(f.required);
    assert_eq!(f.role, FieldRole::Wire);
}

#[test]
fn optional_clears_required_only() {
    let f = FieldDescriptor::timestamp("end").optional();
    assert!(!f.required);
    assert!(matches!(f.field_type, FieldType::Timestamp));
    assert_eq!(f.role, FieldRole::Wire);
}

#[test]
fn image_field_is_cache_only_blob() {
    let f = FieldDescriptor::image("logo");
    assert!(matches!(f.field_type, FieldType::Blob));
    assert_eq!(f.role, FieldRole::Image);
    assert!(!f.required);
    assert!(f.is_cacheable());
}

#[test]
fn last_updated_field_is_cache_only_timestamp() {
    let f = FieldDescriptor::last_updated("lastUpdated");
    assert!(matches!(f.field_type, FieldType::Timestamp));
    assert_eq!(f.role, FieldRole::LastUpdated);
    assert!(f.is_cacheable());
}

#[test]
fn nested_fields_are_not_cacheable() {
    const INNER: RecordSchema = RecordSchema {
        record_type: "Inner",
        fields: &[],
    };
    assert!(!FieldDescriptor::tree("bundle").is_cacheable());
    assert!(!FieldDescriptor::list("items", &INNER).is_cacheable());
    assert!(!FieldDescriptor::record("inner", &INNER).is_cacheable());
    assert!(FieldDescriptor::integer("period").is_cacheable());
}

#[test]
fn expected_names_for_errors() {
    assert_eq!(FieldType::Text.expected(), "string");
    assert_eq!(FieldType::Integer.expected(), "integer");
    assert_eq!(FieldType::Tree.expected(), "object");
}

// ── RecordSchema ─────────────────────────────────────────────────

#[test]
fn wire_fields_skip_cache_only_fields() {
    let names: Vec<&str> = DataPlug::SCHEMA.wire_fields().map(|f| f.name).collect();
    assert!(names.contains(&"plugId"));
    assert!(!names.contains(&"image"));
    assert!(!names.contains(&"lastUpdated"));
}

#[test]
fn schema_field_lookup() {
    assert!(Notice::SCHEMA.field("dateCreated").is_some());
    assert!(Notice::SCHEMA.field("missing").is_none());
    assert_eq!(ProfileField::SCHEMA.record_type, "ProfileField");
}

// ── Fields ───────────────────────────────────────────────────────

#[test]
fn fields_builder_skips_none() {
    let f = Fields::new()
        .text("a", "x")
        .opt_text("b", None::<&str>)
        .opt_timestamp("c", None);
    assert_eq!(f.len(), 1);
    assert!(f.contains("a"));
    assert!(!f.contains("b"));
}

#[test]
fn fields_take_removes_and_defaults() {
    let mut f = Fields::new().text("name", "n").integer("count", 3);
    assert_eq!(f.take_text("name"), "n");
    assert_eq!(f.take_text("name"), "");
    assert_eq!(f.take_integer("count"), 3);
    assert!(!f.take_bool("flag"));
    assert!(f.is_empty());
}

#[test]
fn fields_take_ignores_wrong_variant() {
    let mut f = Fields::new().integer("name", 7);
    assert_eq!(f.take_opt_text("name"), None);
}

#[test]
fn field_value_kind_names() {
    assert_eq!(FieldValue::Bool(true).kind(), "boolean");
    assert_eq!(FieldValue::List(Vec::new()).kind(), "list");
}

#[test]
fn flat_shapes_survive_fields_round_trip() {
    let notice = Notice {
        notice_id: 9,
        message: "hello".into(),
        date_created: grantstack_types::Timestamp::parse("2026-02-01T10:00:00Z").unwrap(),
        read: true,
        sender_name: None,
    };
    let back = Notice::from_fields(notice.to_fields()).unwrap();
    assert_eq!(back, notice);
}
