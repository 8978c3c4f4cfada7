//! CSV adapter: parses a CSV file into metaobject records.
//!
//! The first column header must literally be `handle`; every other column
//! becomes a field key. Cell values pass through as uncoerced strings
//! ([`FieldValue::Raw`]) - type resolution belongs to the field's declared
//! wire type during validation, not to the parser.
//!
//! All failures here happen before any network call is made.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{FieldValue, Metaobject};

/// Errors raised while reading a CSV file into metaobjects.
///
/// Missing files, empty files, and a wrong first column are distinct,
/// structured conditions - never silent empty results.
#[derive(Debug, Error)]
pub enum CsvError {
    /// The file could not be opened or read.
    #[error("CSV file '{path}' could not be read: {source}")]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not parseable CSV.
    #[error("CSV file '{path}' is malformed: {source}")]
    Malformed {
        /// The offending path.
        path: PathBuf,
        /// The underlying parser error.
        #[source]
        source: csv::Error,
    },

    /// The first column header is not `handle`.
    #[error("First column of '{path}' must be named 'handle', found '{found}'")]
    MissingHandleColumn {
        /// The offending path.
        path: PathBuf,
        /// What the first header actually was.
        found: String,
    },

    /// The file holds no data rows (including a bare header).
    #[error("CSV file '{path}' contains no data rows")]
    Empty {
        /// The offending path.
        path: PathBuf,
    },
}

/// Reads a CSV file into an ordered list of metaobjects.
///
/// One record per data row, in file order; the `handle` column supplies the
/// unique key and every other column becomes a raw string field.
///
/// # Errors
///
/// Returns [`CsvError::Io`] when the file cannot be read,
/// [`CsvError::MissingHandleColumn`] when the first header is not `handle`,
/// and [`CsvError::Empty`] when no data rows are present.
pub fn read_metaobjects_from_csv(
    path: impl AsRef<Path>,
    metaobject_type: &str,
) -> Result<Vec<Metaobject>, CsvError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| CsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| CsvError::Malformed {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let Some(first) = headers.get(0) else {
        return Err(CsvError::Empty {
            path: path.to_path_buf(),
        });
    };
    if first != "handle" {
        return Err(CsvError::MissingHandleColumn {
            path: path.to_path_buf(),
            found: first.to_string(),
        });
    }

    let field_keys: Vec<String> = headers.iter().skip(1).map(String::from).collect();

    let mut metaobjects = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| CsvError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        let handle = row.get(0).unwrap_or_default().trim();
        if handle.is_empty() {
            tracing::warn!("Skipping a row with an empty handle in {path:?}");
            continue;
        }

        let mut metaobject = Metaobject::new(metaobject_type, handle);
        for (index, key) in field_keys.iter().enumerate() {
            if let Some(cell) = row.get(index + 1) {
                metaobject.set_field(key.clone(), FieldValue::Raw(cell.to_string()));
            }
        }
        metaobjects.push(metaobject);
    }

    if metaobjects.is_empty() {
        return Err(CsvError::Empty {
            path: path.to_path_buf(),
        });
    }

    tracing::debug!(
        "Parsed {} metaobject(s) of type '{metaobject_type}' from {path:?}",
        metaobjects.len()
    );
    Ok(metaobjects)
}
