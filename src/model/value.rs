//! Tagged field values and their wire-format serialization.
//!
//! Shopify's field-value wire contract is string-only: every field value is
//! transmitted as a string and interpreted against the field's declared wire
//! type (`single_line_text_field`, `number_integer`, `boolean`, ...). This
//! module provides [`FieldValue`], a tagged value type that keeps the caller's
//! intent (`Text`, `Integer`, `Boolean`) or defers interpretation entirely
//! (`Raw`, used for CSV cells), and resolves compatibility against a declared
//! wire type at validation time.

use serde::{Serialize, Serializer};
use std::fmt;

/// A single metaobject field value.
///
/// Values serialize to Shopify's string wire form: booleans as
/// `"true"`/`"false"`, integers as decimal strings, text as-is. `Raw` holds
/// an uncoerced string (typically a CSV cell) whose interpretation is
/// deferred to the field's declared wire type.
///
/// # Example
///
/// ```rust
/// use shopify_metaobjects::FieldValue;
///
/// assert_eq!(FieldValue::from(true).to_wire_string(), "true");
/// assert_eq!(FieldValue::from(42).to_wire_string(), "42");
/// assert_eq!(FieldValue::from("Wool").to_wire_string(), "Wool");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// A text value.
    Text(String),
    /// An integer value.
    Integer(i64),
    /// A boolean value.
    Boolean(bool),
    /// An uncoerced string, e.g. a CSV cell prior to type resolution.
    Raw(String),
}

impl FieldValue {
    /// Returns the value in Shopify's string wire form.
    #[must_use]
    pub fn to_wire_string(&self) -> String {
        match self {
            Self::Text(s) | Self::Raw(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Boolean(b) => b.to_string(),
        }
    }

    /// Returns the integer reading of this value, if it has one.
    ///
    /// `Integer` values return directly; `Text`/`Raw` values are parsed.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Text(s) | Self::Raw(s) => s.trim().parse().ok(),
            Self::Boolean(_) => None,
        }
    }

    /// Checks this value against a declared wire-type tag.
    ///
    /// The wire-type vocabulary is open (owned by Shopify, not this crate):
    /// tags this module does not recognize accept any value. For the known
    /// tags, `Raw` and `Text` values are checked by parsing, so CSV cells
    /// resolve against the declared type here rather than at parse time.
    #[must_use]
    pub fn is_compatible_with(&self, wire_type: &str) -> bool {
        match wire_type {
            "number_integer" => match self {
                Self::Integer(_) => true,
                Self::Text(s) | Self::Raw(s) => s.trim().parse::<i64>().is_ok(),
                Self::Boolean(_) => false,
            },
            "boolean" => match self {
                Self::Boolean(_) => true,
                Self::Text(s) | Self::Raw(s) => matches!(s.trim(), "true" | "false"),
                Self::Integer(_) => false,
            },
            // Integers and booleans always render as single-line text
            "single_line_text_field" => match self {
                Self::Text(s) | Self::Raw(s) => !s.contains('\n'),
                Self::Integer(_) | Self::Boolean(_) => true,
            },
            _ => true,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) | Self::Raw(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_wire_string())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}
