//! Integration tests for the metaobject model and definition validation.

use serde_json::json;
use shopify_metaobjects::{
    validate_metaobject, FieldDefinition, FieldValue, Metaobject, MetaobjectDefinition,
};

// ============================================================================
// Wire Round-Trip Tests
// ============================================================================

#[test]
fn test_wire_round_trip_reproduces_field_mapping() {
    let mut original = Metaobject::new("product_spec", "example-spec-1");
    original.set_field("spec_name", "Spec 1");
    original.set_field("spec_value", 100);
    original.set_field("certified", true);

    // Feed to_shopify_fields back through a minimal response envelope
    let fields: Vec<serde_json::Value> = original
        .to_shopify_fields()
        .into_iter()
        .map(|f| json!({"key": f.key, "value": f.value}))
        .collect();
    let envelope = json!({
        "type": "product_spec",
        "handle": "example-spec-1",
        "fields": fields
    });

    let restored = Metaobject::from_shopify_data(&envelope).unwrap();
    assert_eq!(restored.object_type, original.object_type);
    assert_eq!(restored.handle, original.handle);
    assert_eq!(restored.to_shopify_fields(), original.to_shopify_fields());
}

#[test]
fn test_wire_values_follow_string_contract() {
    let mut record = Metaobject::new("t", "h");
    record.set_field("flag", false);
    record.set_field("count", -3);

    let fields = record.to_shopify_fields();
    assert_eq!(fields[0].value, "false");
    assert_eq!(fields[1].value, "-3");
}

// ============================================================================
// Validation Tests
// ============================================================================

fn fabric_definition() -> MetaobjectDefinition {
    MetaobjectDefinition::new("t", "Fabric")
        .with_field(
            FieldDefinition::new("fabric_name", "Fabric name", "single_line_text_field")
                .required(),
        )
        .with_field(
            FieldDefinition::new("stretch_level", "Stretch level", "number_integer").required(),
        )
}

#[test]
fn test_missing_required_field_reported() {
    let mut record = Metaobject::new("t", "h");
    record.set_field("fabric_name", "Wool");

    let violations = validate_metaobject(&record, &fabric_definition());
    assert_eq!(violations.len(), 1);
    assert!(violations[0].contains("stretch_level"));
}

#[test]
fn test_fully_conformant_record_validates_clean() {
    let mut record = Metaobject::new("t", "h");
    record.set_field("fabric_name", "Wool");
    record.set_field("stretch_level", 2);

    assert!(validate_metaobject(&record, &fabric_definition()).is_empty());
}

#[test]
fn test_csv_parsed_record_validates_against_definition() {
    // Raw strings from a CSV resolve against declared wire types
    let mut record = Metaobject::new("t", "main-cotton");
    record.set_field("fabric_name", FieldValue::Raw("Classic Cotton".to_string()));
    record.set_field("stretch_level", FieldValue::Raw("2".to_string()));
    assert!(validate_metaobject(&record, &fabric_definition()).is_empty());

    let mut bad = Metaobject::new("t", "main-cotton");
    bad.set_field("fabric_name", FieldValue::Raw("Classic Cotton".to_string()));
    bad.set_field("stretch_level", FieldValue::Raw("very".to_string()));
    let violations = validate_metaobject(&bad, &fabric_definition());
    assert_eq!(violations.len(), 1);
    assert!(violations[0].contains("number_integer"));
}

// ============================================================================
// Metafield Addressing Tests
// ============================================================================

#[test]
fn test_metafield_default_namespace_is_custom() {
    let mut record = Metaobject::new("t", "h");
    record.set_metafield("source", "import", "single_line_text_field");

    assert_eq!(record.metafield("source").unwrap().namespace, "custom");
    assert!(record.metafield_in("other", "source").is_none());
}

#[test]
fn test_payload_reconstruction_defaults_metafield_namespace() {
    let data = json!({
        "type": "t",
        "handle": "h",
        "metafields": [
            {"key": "source", "value": "import", "type": "single_line_text_field"}
        ]
    });

    let record = Metaobject::from_shopify_data(&data).unwrap();
    assert!(record.metafield("source").is_some());
}
