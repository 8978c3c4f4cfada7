//! The metaobject record type and its wire-format conversions.
//!
//! A [`Metaobject`] is one custom structured record: a type tag naming its
//! schema, a handle unique within that type, ordinary fields, and namespaced
//! metafields. Instances are built locally (from a CSV row or
//! programmatically) or reconstructed from an API payload with
//! [`Metaobject::from_shopify_data`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::FieldValue;

/// The namespace metafields belong to when none is given.
///
/// Mirrors Shopify's own default and must stay `"custom"` for compatibility.
pub const DEFAULT_METAFIELD_NAMESPACE: &str = "custom";

/// Error raised when an API payload cannot be read back into a model type.
///
/// Reconstruction is deliberately tolerant: missing optional sections and
/// unknown extra keys are fine. Only the identity keys are load-bearing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Metaobject payload is missing required key '{key}'")]
pub struct PayloadError {
    /// The key that was absent from the payload.
    pub key: &'static str,
}

/// A single `{key, value}` pair in Shopify's field-value wire form.
///
/// Produced by [`Metaobject::to_shopify_fields`] and embedded directly into
/// mutation variables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInput {
    /// The field key.
    pub key: String,
    /// The string-serialized field value.
    pub value: String,
}

/// A namespaced key/value annotation attached to a metaobject.
///
/// Metafields are addressed by the composite key `namespace.key`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metafield {
    /// The metafield namespace.
    pub namespace: String,
    /// The metafield key within its namespace.
    pub key: String,
    /// The string-serialized value.
    pub value: String,
    /// The declared wire type, e.g. `single_line_text_field`.
    #[serde(rename = "type")]
    pub wire_type: String,
    /// The opaque global identifier, when persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A custom structured record in Shopify, identified by type + handle.
///
/// An absent `id` means the record has not been persisted yet. Handles are
/// unique within a type; uniqueness is enforced server-side by the upsert
/// keyed on `{type, handle}`.
///
/// # Example
///
/// ```rust
/// use shopify_metaobjects::Metaobject;
///
/// let mut spec = Metaobject::new("product_spec", "example-spec");
/// spec.set_field("spec_name", "Spec 1");
/// spec.set_field("spec_value", 100);
/// spec.set_metafield("source", "import", "single_line_text_field");
///
/// let fields = spec.to_shopify_fields();
/// assert_eq!(fields[1].value, "100");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Metaobject {
    /// The opaque global identifier; `None` until persisted.
    pub id: Option<String>,
    /// The metaobject type tag naming the schema.
    pub object_type: String,
    /// The human-readable unique key within the type.
    pub handle: String,
    fields: IndexMap<String, FieldValue>,
    metafields: IndexMap<String, IndexMap<String, Metafield>>,
}

impl Metaobject {
    /// Creates an empty, unpersisted metaobject.
    #[must_use]
    pub fn new(object_type: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            id: None,
            object_type: object_type.into(),
            handle: handle.into(),
            fields: IndexMap::new(),
            metafields: IndexMap::new(),
        }
    }

    /// Returns `true` once the record carries a server-side identifier.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Returns a field value, or `None` when the key is absent.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Inserts or overwrites a field value.
    ///
    /// No type checking happens here; values are resolved against the
    /// declared wire type during validation.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Iterates fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns a metafield from the default `custom` namespace.
    #[must_use]
    pub fn metafield(&self, key: &str) -> Option<&Metafield> {
        self.metafield_in(DEFAULT_METAFIELD_NAMESPACE, key)
    }

    /// Returns a metafield from an explicit namespace.
    #[must_use]
    pub fn metafield_in(&self, namespace: &str, key: &str) -> Option<&Metafield> {
        self.metafields.get(namespace).and_then(|ns| ns.get(key))
    }

    /// Sets a metafield in the default `custom` namespace.
    pub fn set_metafield(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        wire_type: impl Into<String>,
    ) {
        self.set_metafield_in(DEFAULT_METAFIELD_NAMESPACE, key, value, wire_type);
    }

    /// Sets a metafield in an explicit namespace.
    pub fn set_metafield_in(
        &mut self,
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        wire_type: impl Into<String>,
    ) {
        let namespace = namespace.into();
        let key = key.into();
        let metafield = Metafield {
            namespace: namespace.clone(),
            key: key.clone(),
            value: value.into(),
            wire_type: wire_type.into(),
            id: None,
        };
        self.metafields
            .entry(namespace)
            .or_default()
            .insert(key, metafield);
    }

    /// Iterates all metafields across namespaces, addressed `namespace.key`.
    pub fn metafields(&self) -> impl Iterator<Item = (String, &Metafield)> {
        self.metafields.iter().flat_map(|(namespace, entries)| {
            entries
                .values()
                .map(move |m| (format!("{namespace}.{}", m.key), m))
        })
    }

    /// Produces the ordered `{key, value}` sequence for mutation variables.
    ///
    /// All values are serialized to string form per Shopify's field-value
    /// wire contract: booleans as `"true"`/`"false"`, integers as decimal
    /// strings.
    #[must_use]
    pub fn to_shopify_fields(&self) -> Vec<FieldInput> {
        self.fields
            .iter()
            .map(|(key, value)| FieldInput {
                key: key.clone(),
                value: value.to_wire_string(),
            })
            .collect()
    }

    /// Reconstructs a metaobject from a raw API payload.
    ///
    /// Tolerates missing optional sections (no `fields`, no `metafields`)
    /// and ignores unknown extra keys. Field values arrive as wire strings
    /// and are stored as [`FieldValue::Raw`].
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] when `type` or `handle` is absent.
    pub fn from_shopify_data(data: &serde_json::Value) -> Result<Self, PayloadError> {
        let object_type = data
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(PayloadError { key: "type" })?;
        let handle = data
            .get("handle")
            .and_then(serde_json::Value::as_str)
            .ok_or(PayloadError { key: "handle" })?;

        let mut metaobject = Self::new(object_type, handle);
        metaobject.id = data
            .get("id")
            .and_then(serde_json::Value::as_str)
            .map(String::from);

        if let Some(fields) = data.get("fields").and_then(serde_json::Value::as_array) {
            for entry in fields {
                let Some(key) = entry.get("key").and_then(serde_json::Value::as_str) else {
                    continue;
                };
                // Null-valued fields are simply absent locally
                match entry.get("value") {
                    Some(serde_json::Value::String(s)) => {
                        metaobject.set_field(key, FieldValue::Raw(s.clone()));
                    }
                    Some(serde_json::Value::Number(n)) => {
                        metaobject.set_field(key, FieldValue::Raw(n.to_string()));
                    }
                    Some(serde_json::Value::Bool(b)) => {
                        metaobject.set_field(key, FieldValue::Raw(b.to_string()));
                    }
                    _ => {}
                }
            }
        }

        if let Some(metafields) = data.get("metafields").and_then(serde_json::Value::as_array) {
            for entry in metafields {
                let Some(key) = entry.get("key").and_then(serde_json::Value::as_str) else {
                    continue;
                };
                let namespace = entry
                    .get("namespace")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or(DEFAULT_METAFIELD_NAMESPACE);
                let value = entry
                    .get("value")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default();
                let wire_type = entry
                    .get("type")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("single_line_text_field");

                metaobject.set_metafield_in(namespace, key, value, wire_type);
                if let Some(id) = entry.get("id").and_then(serde_json::Value::as_str) {
                    if let Some(stored) = metaobject
                        .metafields
                        .get_mut(namespace)
                        .and_then(|ns| ns.get_mut(key))
                    {
                        stored.id = Some(id.to_string());
                    }
                }
            }
        }

        Ok(metaobject)
    }
}
