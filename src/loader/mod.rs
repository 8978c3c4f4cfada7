//! Loader pipelines: CSV ingest, batch upsert, fetch/export, definitions.
//!
//! [`MetaobjectLoader`] is the crate's main entry point. It wires the CSV
//! adapter and the model types to the [`Gateway`](crate::clients::Gateway)
//! and exposes the pipeline surface:
//!
//! - [`MetaobjectLoader::process_csv`]: CSV file -> batched upserts
//! - [`MetaobjectLoader::batch_upsert_metaobjects`]: create-or-update by
//!   `{type, handle}` with per-record failure tolerance
//! - [`MetaobjectLoader::fetch_metaobjects`] /
//!   [`MetaobjectLoader::fetch_all_metaobjects`] /
//!   [`MetaobjectLoader::fetch_metaobjects_as_dict`]: cursor-paged reads
//! - [`MetaobjectLoader::export_metaobjects_to_csv`]: full listing -> CSV
//! - [`MetaobjectLoader::describe_metaobject_type`] /
//!   [`MetaobjectLoader::create_metaobject_definition`] /
//!   [`MetaobjectLoader::update_metaobject_definition`]: definition management
//!
//! Batches and records are processed strictly sequentially; there is no
//! parallel dispatch, which keeps rate-limit compliance simple.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_metaobjects::{AccessToken, LoaderConfig, MetaobjectLoader, ShopDomain};
//!
//! let config = LoaderConfig::builder()
//!     .shop_domain(ShopDomain::new("my-store")?)
//!     .access_token(AccessToken::new(std::env::var("SHOPIFY_ACCESS_TOKEN")?)?)
//!     .cache_dir(".cache")
//!     .build()?;
//!
//! let loader = MetaobjectLoader::new(&config);
//! let summary = loader.process_csv("fabrics.csv", "fabric", 50).await?;
//! println!("upserted {}, failed {}", summary.upserted, summary.failed);
//! ```

mod errors;
mod graphql;
mod ingest;

pub use errors::LoaderError;
pub use ingest::{read_metaobjects_from_csv, CsvError};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use indexmap::IndexSet;
use serde::Serialize;

use crate::clients::{user_errors_from, ApiError, Gateway};
use crate::config::LoaderConfig;
use crate::model::{DefinitionSummary, Metaobject, MetaobjectDefinition};

/// Default number of records per upsert batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Shopify's ceiling on `first` for a single page; larger requests are
/// clamped before the call.
pub const MAX_PAGE_SIZE: u32 = 250;

/// One record that failed during a batch upsert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpsertFailure {
    /// The handle of the failed record.
    pub handle: String,
    /// Why the upsert failed.
    pub reason: String,
}

/// Aggregate result of a batch upsert run.
///
/// `upserted + failed` always equals the number of input records; a
/// per-record failure never aborts the batch or the run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UpsertSummary {
    /// Number of records upserted successfully.
    pub upserted: usize,
    /// Number of records that failed.
    pub failed: usize,
    /// Per-record failure details, in input order.
    pub failures: Vec<UpsertFailure>,
}

/// One cursor page of fetched metaobjects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetaobjectPage {
    /// The records on this page, in server-returned order.
    pub metaobjects: Vec<Metaobject>,
    /// Whether the server reports a further page.
    pub has_next_page: bool,
    /// The opaque cursor to pass as `after` for the next page.
    pub end_cursor: Option<String>,
}

/// Options controlling CSV export.
///
/// `Default` is the standard shape: handle column on, id and metafields off.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Explicit column order; when absent, columns are the first-seen union
    /// of observed field keys.
    pub field_order: Option<Vec<String>>,
    /// Emit the reserved `id` column.
    pub include_id: bool,
    /// Emit the reserved `handle` column.
    pub include_handle: bool,
    /// Emit metafield columns, addressed `namespace.key`.
    pub include_metafields: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            field_order: None,
            include_id: false,
            include_handle: true,
            include_metafields: false,
        }
    }
}

/// A fetched definition together with its derived summary.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDescription {
    /// The read-only definition mirror.
    pub definition: MetaobjectDefinition,
    /// The required/optional partition and wire-type histogram.
    pub summary: DefinitionSummary,
}

impl fmt::Display for TypeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Metaobject type '{}' ({})",
            self.definition.object_type, self.definition.name
        )?;
        if let Some(description) = &self.definition.description {
            writeln!(f, "{description}")?;
        }
        write!(f, "{}", self.summary)
    }
}

/// Population statistics over a type's existing metaobjects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetaobjectStats {
    /// Total number of records of the type.
    pub total: usize,
    /// How many records populate each field key.
    pub field_counts: BTreeMap<String, usize>,
}

/// High-level client for loading, fetching, and describing metaobjects.
///
/// Owns the [`Gateway`](crate::clients::Gateway) and is the only layer the
/// typical caller touches.
#[derive(Debug)]
pub struct MetaobjectLoader {
    gateway: Gateway,
}

impl MetaobjectLoader {
    /// Creates a loader for the configured store.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be created (see
    /// [`Gateway::new`](crate::clients::Gateway::new)).
    #[must_use]
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            gateway: Gateway::new(config),
        }
    }

    /// Creates a loader over an existing gateway.
    ///
    /// Use when the gateway carries an injected cache or other
    /// customization.
    #[must_use]
    pub const fn with_gateway(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Returns the underlying gateway.
    #[must_use]
    pub const fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Loads a CSV file into metaobjects of a type and upserts them.
    ///
    /// The file's first column must be named `handle`; all other columns
    /// become field values passed through as strings. Input problems
    /// (missing file, wrong first column, empty file) fail here, before any
    /// network call is made.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Csv`] for input problems. Per-record upsert
    /// failures do not error; they are counted in the returned summary.
    pub async fn process_csv(
        &self,
        path: impl AsRef<Path>,
        metaobject_type: &str,
        batch_size: usize,
    ) -> Result<UpsertSummary, LoaderError> {
        let metaobjects = read_metaobjects_from_csv(path, metaobject_type)?;
        Ok(self
            .batch_upsert_metaobjects(&metaobjects, batch_size)
            .await)
    }

    /// Upserts records in contiguous batches of at most `batch_size`.
    ///
    /// Each record is one create-or-update mutation keyed by
    /// `{type, handle}`: an existing record is updated in place, a new one
    /// is created. There is a single code path either way - the split is
    /// the server's business.
    ///
    /// Per-record failures are counted, not raised: the returned summary
    /// always satisfies `upserted + failed == metaobjects.len()`. A
    /// `batch_size` of zero falls back to [`DEFAULT_BATCH_SIZE`].
    pub async fn batch_upsert_metaobjects(
        &self,
        metaobjects: &[Metaobject],
        batch_size: usize,
    ) -> UpsertSummary {
        let batch_size = if batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            batch_size
        };

        let mut summary = UpsertSummary::default();
        let batch_count = (metaobjects.len() + batch_size - 1) / batch_size;

        for (index, batch) in metaobjects.chunks(batch_size).enumerate() {
            tracing::info!(
                "Upserting batch {}/{batch_count} ({} record(s))",
                index + 1,
                batch.len()
            );
            for metaobject in batch {
                match self.upsert_one(metaobject).await {
                    Ok(()) => summary.upserted += 1,
                    Err(reason) => {
                        tracing::warn!(
                            "Upsert failed for '{}/{}': {reason}",
                            metaobject.object_type,
                            metaobject.handle
                        );
                        summary.failed += 1;
                        summary.failures.push(UpsertFailure {
                            handle: metaobject.handle.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        tracing::info!(
            "Batch upsert finished: {} upserted, {} failed",
            summary.upserted,
            summary.failed
        );
        summary
    }

    /// Issues one create-or-update mutation; failures come back as strings
    /// so the batch loop can count them uniformly.
    async fn upsert_one(&self, metaobject: &Metaobject) -> Result<(), String> {
        let variables = serde_json::json!({
            "handle": {
                "type": metaobject.object_type,
                "handle": metaobject.handle,
            },
            "metaobject": {
                "fields": metaobject.to_shopify_fields(),
            },
        });

        let data = self
            .gateway
            .execute(graphql::UPSERT_METAOBJECT, Some(variables))
            .await
            .map_err(|error| error.to_string())?;

        let payload = data
            .get("metaobjectUpsert")
            .ok_or_else(|| "response is missing the metaobjectUpsert section".to_string())?;

        let errors = user_errors_from(payload);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::UserErrors {
                operation: "metaobjectUpsert".to_string(),
                errors,
            }
            .to_string())
        }
    }

    /// Fetches one page of a type's metaobjects.
    ///
    /// `after` is the opaque cursor from a prior page, or `None` for the
    /// first page. `first` is clamped to 1..=[`MAX_PAGE_SIZE`]; values above
    /// the ceiling are clamped with a warning rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Api`] on communication failures and
    /// [`LoaderError::MissingData`] when the response lacks the
    /// `metaobjects` connection.
    pub async fn fetch_metaobjects(
        &self,
        metaobject_type: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<MetaobjectPage, LoaderError> {
        let first = if first > MAX_PAGE_SIZE {
            tracing::warn!("Clamping page size {first} to the API ceiling of {MAX_PAGE_SIZE}");
            MAX_PAGE_SIZE
        } else {
            first.max(1)
        };

        let variables = serde_json::json!({
            "type": metaobject_type,
            "first": first,
            "after": after,
        });
        let data = self
            .gateway
            .execute_cached(graphql::FETCH_METAOBJECTS, Some(variables))
            .await?;

        let connection = data
            .get("metaobjects")
            .filter(|value| !value.is_null())
            .ok_or(LoaderError::MissingData {
                section: "metaobjects",
            })?;

        let mut metaobjects = Vec::new();
        if let Some(edges) = connection.get("edges").and_then(serde_json::Value::as_array) {
            for edge in edges {
                if let Some(node) = edge.get("node") {
                    metaobjects.push(Metaobject::from_shopify_data(node)?);
                }
            }
        }

        let page_info = connection.get("pageInfo");
        let has_next_page = page_info
            .and_then(|info| info.get("hasNextPage"))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        let end_cursor = page_info
            .and_then(|info| info.get("endCursor"))
            .and_then(serde_json::Value::as_str)
            .map(String::from);

        Ok(MetaobjectPage {
            metaobjects,
            has_next_page,
            end_cursor,
        })
    }

    /// Fetches every metaobject of a type, paging until the server reports
    /// no further pages.
    ///
    /// Results are concatenated in server-returned order; no fixed total is
    /// assumed ahead of time.
    ///
    /// # Errors
    ///
    /// Returns the first page-level failure encountered.
    pub async fn fetch_all_metaobjects(
        &self,
        metaobject_type: &str,
        batch_size: u32,
    ) -> Result<Vec<Metaobject>, LoaderError> {
        let mut all = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let page = self
                .fetch_metaobjects(metaobject_type, batch_size, after.as_deref())
                .await?;
            all.extend(page.metaobjects);

            if !page.has_next_page {
                break;
            }
            match page.end_cursor {
                Some(cursor) => after = Some(cursor),
                None => {
                    tracing::warn!(
                        "Server reported another page without an end cursor; stopping pagination"
                    );
                    break;
                }
            }
        }

        tracing::debug!(
            "Fetched {} metaobject(s) of type '{metaobject_type}'",
            all.len()
        );
        Ok(all)
    }

    /// Fetches all metaobjects of a type and reindexes them by a field.
    ///
    /// `key_field` may be a field key or one of the reserved names
    /// `id`/`handle`. When two records share a key value, the later one
    /// wins - a defined collision policy, not an accident.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::KeyFieldMissing`] when a record lacks the key
    /// field and it is not a reserved name, plus any fetch failure.
    pub async fn fetch_metaobjects_as_dict(
        &self,
        metaobject_type: &str,
        key_field: &str,
    ) -> Result<HashMap<String, Metaobject>, LoaderError> {
        let records = self
            .fetch_all_metaobjects(metaobject_type, MAX_PAGE_SIZE)
            .await?;

        let mut dict = HashMap::with_capacity(records.len());
        for record in records {
            let key = match key_field {
                // Fetched records always carry ids; handle covers the
                // locally built stragglers.
                "id" => record
                    .id
                    .clone()
                    .unwrap_or_else(|| record.handle.clone()),
                "handle" => record.handle.clone(),
                other => match record.field(other) {
                    Some(value) => value.to_wire_string(),
                    None => {
                        return Err(LoaderError::KeyFieldMissing {
                            key_field: other.to_string(),
                            handle: record.handle.clone(),
                        })
                    }
                },
            };
            dict.insert(key, record);
        }
        Ok(dict)
    }

    /// Fetches every metaobject of a type and writes them to a CSV file.
    ///
    /// Returns the number of rows written. Column order follows
    /// `options.field_order` when given, otherwise the first-seen union of
    /// observed field keys.
    ///
    /// # Errors
    ///
    /// Returns fetch failures and [`LoaderError::Export`]/[`LoaderError::Io`]
    /// for write problems.
    pub async fn export_metaobjects_to_csv(
        &self,
        metaobject_type: &str,
        path: impl AsRef<Path>,
        options: &ExportOptions,
    ) -> Result<usize, LoaderError> {
        let records = self
            .fetch_all_metaobjects(metaobject_type, MAX_PAGE_SIZE)
            .await?;
        let written = write_metaobjects_to_csv(&records, path, options)?;
        tracing::info!("Exported {written} metaobject(s) of type '{metaobject_type}'");
        Ok(written)
    }

    /// Fetches a type's definition and derives its description.
    ///
    /// A read-only computation over the fetched definition: required/optional
    /// partition plus a per-wire-type histogram.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::UnknownType`] when no definition exists for
    /// the type, distinct from network failures.
    pub async fn describe_metaobject_type(
        &self,
        metaobject_type: &str,
    ) -> Result<TypeDescription, LoaderError> {
        let variables = serde_json::json!({ "type": metaobject_type });
        let data = self
            .gateway
            .execute_cached(graphql::DEFINITION_BY_TYPE, Some(variables))
            .await?;

        let node = data
            .get("metaobjectDefinitionByType")
            .filter(|value| !value.is_null())
            .ok_or_else(|| LoaderError::UnknownType {
                object_type: metaobject_type.to_string(),
            })?;

        let definition = MetaobjectDefinition::from_shopify_data(node)?;
        let summary = definition.summary();
        Ok(TypeDescription {
            definition,
            summary,
        })
    }

    /// Creates a metaobject type definition.
    ///
    /// The only local pre-validation is structural completeness of the
    /// field-definition list (key/name/type per entry, unique keys); value
    /// semantics are the server's call. Returns the new definition's id.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::IncompleteDefinition`] before any network
    /// call for structural problems, and [`ApiError::UserErrors`] (wrapped)
    /// when the server rejects the creation.
    pub async fn create_metaobject_definition(
        &self,
        definition: &MetaobjectDefinition,
    ) -> Result<String, LoaderError> {
        let problems = definition.structural_errors();
        if !problems.is_empty() {
            return Err(LoaderError::IncompleteDefinition {
                object_type: definition.object_type.clone(),
                problems,
            });
        }

        let variables = serde_json::json!({ "definition": definition.to_create_input() });
        let data = self
            .gateway
            .execute(graphql::CREATE_DEFINITION, Some(variables))
            .await?;

        let payload =
            data.get("metaobjectDefinitionCreate")
                .ok_or(LoaderError::MissingData {
                    section: "metaobjectDefinitionCreate",
                })?;
        check_user_errors("metaobjectDefinitionCreate", payload)?;

        payload
            .get("metaobjectDefinition")
            .and_then(|node| node.get("id"))
            .and_then(serde_json::Value::as_str)
            .map(String::from)
            .ok_or(LoaderError::MissingData {
                section: "metaobjectDefinition.id",
            })
    }

    /// Updates a type's definition, passing the update input through as-is.
    ///
    /// The definition id is resolved from the type first; the `update`
    /// value is the raw `MetaobjectDefinitionUpdateInput` object.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::UnknownType`] when the type has no definition,
    /// plus any mutation failure.
    pub async fn update_metaobject_definition(
        &self,
        metaobject_type: &str,
        update: serde_json::Value,
    ) -> Result<(), LoaderError> {
        let description = self.describe_metaobject_type(metaobject_type).await?;
        let id = description
            .definition
            .id
            .ok_or(LoaderError::MissingData {
                section: "metaobjectDefinitionByType.id",
            })?;

        let variables = serde_json::json!({ "id": id, "definition": update });
        let data = self
            .gateway
            .execute(graphql::UPDATE_DEFINITION, Some(variables))
            .await?;

        let payload =
            data.get("metaobjectDefinitionUpdate")
                .ok_or(LoaderError::MissingData {
                    section: "metaobjectDefinitionUpdate",
                })?;
        check_user_errors("metaobjectDefinitionUpdate", payload)
    }

    /// Deletes a metaobject by id, returning the deleted id.
    ///
    /// # Errors
    ///
    /// Returns mutation failures, including user errors for unknown ids.
    pub async fn delete_metaobject(&self, id: &str) -> Result<String, LoaderError> {
        let variables = serde_json::json!({ "id": id });
        let data = self
            .gateway
            .execute(graphql::DELETE_METAOBJECT, Some(variables))
            .await?;

        let payload = data
            .get("metaobjectDelete")
            .ok_or(LoaderError::MissingData {
                section: "metaobjectDelete",
            })?;
        check_user_errors("metaobjectDelete", payload)?;

        payload
            .get("deletedId")
            .and_then(serde_json::Value::as_str)
            .map(String::from)
            .ok_or(LoaderError::MissingData {
                section: "deletedId",
            })
    }

    /// Computes population statistics over a type's existing metaobjects.
    ///
    /// # Errors
    ///
    /// Returns any fetch failure.
    pub async fn get_metaobject_stats(
        &self,
        metaobject_type: &str,
    ) -> Result<MetaobjectStats, LoaderError> {
        let records = self
            .fetch_all_metaobjects(metaobject_type, MAX_PAGE_SIZE)
            .await?;

        let mut field_counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in &records {
            for (key, _) in record.fields() {
                *field_counts.entry(key.to_string()).or_insert(0) += 1;
            }
        }

        Ok(MetaobjectStats {
            total: records.len(),
            field_counts,
        })
    }

}

/// Surfaces a mutation payload's `userErrors` as a typed failure.
fn check_user_errors(operation: &str, payload: &serde_json::Value) -> Result<(), LoaderError> {
    let errors = user_errors_from(payload);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::UserErrors {
            operation: operation.to_string(),
            errors,
        }
        .into())
    }
}

/// Writes metaobjects to a CSV file without fetching anything.
///
/// The building block behind
/// [`MetaobjectLoader::export_metaobjects_to_csv`], exposed for callers
/// exporting records they already hold (including ones carrying metafields).
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`LoaderError::Export`] for CSV writer failures and
/// [`LoaderError::Io`] for flush failures.
pub fn write_metaobjects_to_csv(
    metaobjects: &[Metaobject],
    path: impl AsRef<Path>,
    options: &ExportOptions,
) -> Result<usize, LoaderError> {
    let columns: Vec<String> = options.field_order.clone().unwrap_or_else(|| {
        let mut seen = IndexSet::new();
        for record in metaobjects {
            for (key, _) in record.fields() {
                seen.insert(key.to_string());
            }
        }
        seen.into_iter().collect()
    });

    let metafield_columns: Vec<String> = if options.include_metafields {
        let mut seen = IndexSet::new();
        for record in metaobjects {
            for (composite, _) in record.metafields() {
                seen.insert(composite);
            }
        }
        seen.into_iter().collect()
    } else {
        Vec::new()
    };

    let mut writer = csv::Writer::from_path(path)?;

    let mut header = Vec::new();
    if options.include_id {
        header.push("id".to_string());
    }
    if options.include_handle {
        header.push("handle".to_string());
    }
    header.extend(columns.iter().cloned());
    header.extend(metafield_columns.iter().cloned());
    writer.write_record(&header)?;

    for record in metaobjects {
        let mut row = Vec::new();
        if options.include_id {
            row.push(record.id.clone().unwrap_or_default());
        }
        if options.include_handle {
            row.push(record.handle.clone());
        }
        for column in &columns {
            row.push(
                record
                    .field(column)
                    .map(crate::model::FieldValue::to_wire_string)
                    .unwrap_or_default(),
            );
        }
        for composite in &metafield_columns {
            let value = composite.split_once('.').and_then(|(namespace, key)| {
                record
                    .metafield_in(namespace, key)
                    .map(|metafield| metafield.value.clone())
            });
            row.push(value.unwrap_or_default());
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(metaobjects.len())
}
