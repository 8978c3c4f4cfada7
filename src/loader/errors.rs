//! Pipeline-level error types.
//!
//! [`LoaderError`] is the error type of the public pipeline surface. It
//! keeps lookup failures (`KeyFieldMissing`, `UnknownType`) as variants
//! distinct from transport failures, so callers can branch on cause.

use thiserror::Error;

use crate::clients::ApiError;
use crate::loader::ingest::CsvError;
use crate::model::PayloadError;

/// Unified error type for loader pipelines.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// A CSV input error, raised before any network call.
    #[error(transparent)]
    Csv(#[from] CsvError),

    /// An API communication failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An API payload that could not be read back into a model type.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// A response arrived without the section the pipeline expected.
    #[error("Response payload is missing expected section '{section}'")]
    MissingData {
        /// The absent section.
        section: &'static str,
    },

    /// The chosen key field is absent from a record and is not one of the
    /// reserved names `id`/`handle`.
    #[error("Field '{key_field}' is missing from metaobject '{handle}' and is not one of the reserved names 'id'/'handle'")]
    KeyFieldMissing {
        /// The requested key field.
        key_field: String,
        /// The handle of the record lacking it.
        handle: String,
    },

    /// No definition exists for the requested metaobject type.
    #[error("No metaobject definition found for type '{object_type}'")]
    UnknownType {
        /// The unknown type tag.
        object_type: String,
    },

    /// A definition submitted for creation is structurally incomplete.
    #[error("Metaobject definition for '{object_type}' is structurally incomplete: {}", .problems.join("; "))]
    IncompleteDefinition {
        /// The type tag of the offending definition.
        object_type: String,
        /// The structural problems found.
        problems: Vec<String>,
    },

    /// A CSV export failed while writing.
    #[error("CSV export failed: {0}")]
    Export(#[from] csv::Error),

    /// An I/O failure during CSV export.
    #[error("I/O error during CSV export: {0}")]
    Io(#[from] std::io::Error),
}
