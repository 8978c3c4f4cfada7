//! Metaobject type definitions and record validation.
//!
//! A [`MetaobjectDefinition`] is the schema for a metaobject type: its field
//! keys, display names, wire types, required flags, and validation rules.
//! Definitions are fetched from Shopify as a read-only mirror, or built
//! locally before submission as a creation request.
//!
//! [`validate_metaobject`] is the pure validation entry point: no network,
//! just a list of human-readable violations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Metaobject, PayloadError};

/// A single validation rule attached to a field definition.
///
/// Rules are name/value pairs (`min`, `max`, `max_length`, `pattern`, ...).
/// The value arrives JSON-encoded from the API and stays a raw
/// [`serde_json::Value`] here; interpretation happens per rule name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldValidation {
    /// The rule name.
    pub name: String,
    /// The rule value, e.g. a bound or a pattern.
    pub value: serde_json::Value,
}

/// The schema for one field of a metaobject type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// The field key records use.
    pub key: String,
    /// The display name.
    pub name: String,
    /// The wire-type tag, e.g. `single_line_text_field`. Opaque here;
    /// the vocabulary is owned by Shopify.
    #[serde(rename = "type")]
    pub wire_type: String,
    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether records must carry this field.
    #[serde(default)]
    pub required: bool,
    /// Validation rules applied to field values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<FieldValidation>,
}

impl FieldDefinition {
    /// Creates a field definition with no description or validations.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        wire_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            wire_type: wire_type.into(),
            description: None,
            required: false,
            validations: Vec::new(),
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Adds a validation rule.
    #[must_use]
    pub fn with_validation(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.validations.push(FieldValidation {
            name: name.into(),
            value,
        });
        self
    }
}

/// The schema for a metaobject type.
///
/// Field keys are unique within a definition; [`structural_errors`] reports
/// violations before a creation request is attempted.
///
/// [`structural_errors`]: MetaobjectDefinition::structural_errors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaobjectDefinition {
    /// The opaque definition identifier, when fetched from the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The metaobject type tag this definition governs.
    #[serde(rename = "type")]
    pub object_type: String,
    /// The display name.
    pub name: String,
    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The ordered field definitions.
    pub fields: Vec<FieldDefinition>,
}

impl MetaobjectDefinition {
    /// Creates a definition with no fields yet.
    #[must_use]
    pub fn new(object_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            object_type: object_type.into(),
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// Appends a field definition.
    #[must_use]
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the field definition for a key, if present.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Reports structural completeness problems.
    ///
    /// Checked before a creation request: every field entry needs a
    /// non-empty key, name, and wire type, and keys must be unique. An empty
    /// list means the definition is structurally complete. Value-level
    /// validation rules are not interpreted here.
    #[must_use]
    pub fn structural_errors(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.object_type.is_empty() {
            problems.push("definition type must not be empty".to_string());
        }
        if self.name.is_empty() {
            problems.push("definition name must not be empty".to_string());
        }
        if self.fields.is_empty() {
            problems.push("definition must declare at least one field".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for (index, field) in self.fields.iter().enumerate() {
            if field.key.is_empty() {
                problems.push(format!("field #{index} is missing a key"));
            } else if !seen.insert(field.key.as_str()) {
                problems.push(format!("duplicate field key '{}'", field.key));
            }
            if field.name.is_empty() {
                problems.push(format!("field '{}' is missing a name", field.key));
            }
            if field.wire_type.is_empty() {
                problems.push(format!("field '{}' is missing a type", field.key));
            }
        }
        problems
    }

    /// Reconstructs a definition from a `metaobjectDefinitionByType` payload.
    ///
    /// Tolerates missing optional sections; the field `type` may arrive
    /// either as a plain tag or as the nested `{ "name": ... }` object the
    /// Admin API returns.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] when `type` or `name` is absent.
    pub fn from_shopify_data(data: &serde_json::Value) -> Result<Self, PayloadError> {
        let object_type = data
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(PayloadError { key: "type" })?;
        let name = data
            .get("name")
            .and_then(serde_json::Value::as_str)
            .ok_or(PayloadError { key: "name" })?;

        let mut definition = Self::new(object_type, name);
        definition.id = data
            .get("id")
            .and_then(serde_json::Value::as_str)
            .map(String::from);
        definition.description = data
            .get("description")
            .and_then(serde_json::Value::as_str)
            .map(String::from);

        if let Some(entries) = data
            .get("fieldDefinitions")
            .and_then(serde_json::Value::as_array)
        {
            for entry in entries {
                let Some(key) = entry.get("key").and_then(serde_json::Value::as_str) else {
                    continue;
                };
                let name = entry
                    .get("name")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or(key);
                let wire_type = entry
                    .get("type")
                    .map_or("single_line_text_field", |t| {
                        t.as_str().or_else(|| {
                            t.get("name").and_then(serde_json::Value::as_str)
                        })
                        .unwrap_or("single_line_text_field")
                    });

                let mut field = FieldDefinition::new(key, name, wire_type);
                field.description = entry
                    .get("description")
                    .and_then(serde_json::Value::as_str)
                    .map(String::from);
                field.required = entry
                    .get("required")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false);
                if let Some(validations) = entry
                    .get("validations")
                    .and_then(serde_json::Value::as_array)
                {
                    for rule in validations {
                        if let Some(rule_name) = rule.get("name").and_then(serde_json::Value::as_str)
                        {
                            field.validations.push(FieldValidation {
                                name: rule_name.to_string(),
                                value: rule.get("value").cloned().unwrap_or_default(),
                            });
                        }
                    }
                }
                definition.fields.push(field);
            }
        }

        Ok(definition)
    }

    /// Produces the `metaobjectDefinitionCreate` input object.
    #[must_use]
    pub fn to_create_input(&self) -> serde_json::Value {
        let field_definitions: Vec<serde_json::Value> = self
            .fields
            .iter()
            .map(|field| {
                let mut entry = serde_json::json!({
                    "key": field.key,
                    "name": field.name,
                    "type": field.wire_type,
                    "required": field.required,
                });
                if let Some(description) = &field.description {
                    entry["description"] = serde_json::json!(description);
                }
                if !field.validations.is_empty() {
                    entry["validations"] = serde_json::json!(field.validations);
                }
                entry
            })
            .collect();

        let mut input = serde_json::json!({
            "type": self.object_type,
            "name": self.name,
            "fieldDefinitions": field_definitions,
        });
        if let Some(description) = &self.description {
            input["description"] = serde_json::json!(description);
        }
        input
    }

    /// Derives the required/optional partition and wire-type histogram.
    #[must_use]
    pub fn summary(&self) -> DefinitionSummary {
        let mut required = Vec::new();
        let mut optional = Vec::new();
        let mut field_types = BTreeMap::new();
        for field in &self.fields {
            if field.required {
                required.push(field.key.clone());
            } else {
                optional.push(field.key.clone());
            }
            *field_types.entry(field.wire_type.clone()).or_insert(0) += 1;
        }
        DefinitionSummary {
            total_fields: self.fields.len(),
            required,
            optional,
            field_types,
        }
    }
}

/// Read-only description of a definition's field structure.
///
/// Derived entirely from a fetched [`MetaobjectDefinition`]; the `Display`
/// implementation renders the human-oriented type description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DefinitionSummary {
    /// Total number of declared fields.
    pub total_fields: usize,
    /// Keys of required fields.
    pub required: Vec<String>,
    /// Keys of optional fields.
    pub optional: Vec<String>,
    /// Count of fields per wire-type tag.
    pub field_types: BTreeMap<String, usize>,
}

impl fmt::Display for DefinitionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total fields: {}", self.total_fields)?;
        writeln!(f, "Required ({}): {}", self.required.len(), self.required.join(", "))?;
        writeln!(f, "Optional ({}): {}", self.optional.len(), self.optional.join(", "))?;
        writeln!(f, "Field types:")?;
        for (wire_type, count) in &self.field_types {
            writeln!(f, "  {wire_type}: {count}")?;
        }
        Ok(())
    }
}

/// Validates a metaobject against a definition, without any network call.
///
/// Returns human-readable violation strings; an empty list signals a valid
/// record. Checks, in order:
///
/// - every required field key is present,
/// - every present field key is declared by the definition,
/// - every present value is compatible with its declared wire type,
/// - declared validation rules hold (`min`/`max` on integer readings,
///   `max_length` on text length, `pattern` as substring containment).
///
/// # Example
///
/// ```rust
/// use shopify_metaobjects::{
///     validate_metaobject, FieldDefinition, Metaobject, MetaobjectDefinition,
/// };
///
/// let definition = MetaobjectDefinition::new("fabric", "Fabric")
///     .with_field(FieldDefinition::new("fabric_name", "Name", "single_line_text_field").required())
///     .with_field(FieldDefinition::new("stretch_level", "Stretch", "number_integer").required());
///
/// let mut record = Metaobject::new("fabric", "h");
/// record.set_field("fabric_name", "Wool");
///
/// let violations = validate_metaobject(&record, &definition);
/// assert_eq!(violations.len(), 1);
/// assert!(violations[0].contains("stretch_level"));
/// ```
#[must_use]
pub fn validate_metaobject(
    metaobject: &Metaobject,
    definition: &MetaobjectDefinition,
) -> Vec<String> {
    let mut violations = Vec::new();

    for field in &definition.fields {
        if field.required && metaobject.field(&field.key).is_none() {
            violations.push(format!("Missing required field '{}'", field.key));
        }
    }

    for (key, value) in metaobject.fields() {
        let Some(field) = definition.field(key) else {
            violations.push(format!(
                "Unknown field '{key}' is not declared by definition '{}'",
                definition.object_type
            ));
            continue;
        };

        if !value.is_compatible_with(&field.wire_type) {
            violations.push(format!(
                "Field '{key}' value '{value}' is not compatible with type '{}'",
                field.wire_type
            ));
            continue;
        }

        for rule in &field.validations {
            if let Some(problem) = check_rule(key, value, rule) {
                violations.push(problem);
            }
        }
    }

    violations
}

/// Applies one validation rule; returns the violation message, if any.
fn check_rule(
    key: &str,
    value: &crate::model::FieldValue,
    rule: &FieldValidation,
) -> Option<String> {
    let bound = || {
        rule.value
            .as_i64()
            .or_else(|| rule.value.as_str().and_then(|s| s.parse().ok()))
    };

    match rule.name.as_str() {
        "min" => {
            let (limit, actual) = (bound()?, value.as_integer()?);
            (actual < limit)
                .then(|| format!("Field '{key}' value {actual} is below the minimum {limit}"))
        }
        "max" => {
            let (limit, actual) = (bound()?, value.as_integer()?);
            (actual > limit)
                .then(|| format!("Field '{key}' value {actual} is above the maximum {limit}"))
        }
        "max_length" => {
            let limit = usize::try_from(bound()?).ok()?;
            let length = value.to_wire_string().chars().count();
            (length > limit).then(|| {
                format!("Field '{key}' length {length} exceeds the maximum length {limit}")
            })
        }
        // Substring containment stands in for full pattern matching
        "pattern" => {
            let pattern = rule.value.as_str()?;
            let wire = value.to_wire_string();
            (!wire.contains(pattern))
                .then(|| format!("Field '{key}' value '{wire}' does not match pattern '{pattern}'"))
        }
        _ => None,
    }
}
