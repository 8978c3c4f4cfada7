//! Data model for metaobjects and their type definitions.
//!
//! This module provides the local representations of Shopify's metaobject
//! concepts:
//!
//! - [`Metaobject`]: one custom structured record (type + handle + fields +
//!   namespaced metafields)
//! - [`FieldValue`]: a tagged field value resolved against a declared wire
//!   type at validation time
//! - [`Metafield`] / [`FieldInput`]: the wire-facing pieces of a record
//! - [`MetaobjectDefinition`] / [`FieldDefinition`]: the schema for a
//!   metaobject type
//! - [`validate_metaobject`]: pure record-against-definition validation
//!
//! Everything here is plain data - no network I/O. Conversions to and from
//! the GraphQL wire format live on the types themselves
//! ([`Metaobject::to_shopify_fields`], [`Metaobject::from_shopify_data`],
//! [`MetaobjectDefinition::from_shopify_data`]).

mod definition;
mod metaobject;
mod value;

pub use definition::{
    validate_metaobject, DefinitionSummary, FieldDefinition, FieldValidation,
    MetaobjectDefinition,
};
pub use metaobject::{
    FieldInput, Metafield, Metaobject, PayloadError, DEFAULT_METAFIELD_NAMESPACE,
};
pub use value::FieldValue;
