//! # Shopify Metaobjects
//!
//! A Rust client for managing Shopify metaobjects over the GraphQL Admin
//! API: bulk-loading CSV data (upsert by handle), fetching and exporting
//! metaobjects, and managing metaobject type definitions.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`LoaderConfig`] and [`LoaderConfigBuilder`]
//! - Validated newtypes for credentials and domain values
//! - A [`Metaobject`] model with tagged field values and namespaced metafields
//! - A CSV adapter mapping files onto metaobject records
//! - An async API gateway with rate-limit-aware retry and optional response
//!   caching
//! - Batch upsert, cursor-paged fetch, CSV export, and definition-management
//!   pipelines via [`MetaobjectLoader`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shopify_metaobjects::{AccessToken, LoaderConfig, MetaobjectLoader, ShopDomain};
//!
//! // Credentials come from the calling environment
//! let config = LoaderConfig::builder()
//!     .shop_domain(ShopDomain::new(std::env::var("SHOPIFY_SHOP_DOMAIN")?)?)
//!     .access_token(AccessToken::new(std::env::var("SHOPIFY_ACCESS_TOKEN")?)?)
//!     .cache_dir(".cache")
//!     .build()?;
//!
//! let loader = MetaobjectLoader::new(&config);
//!
//! // Bulk-load a CSV file: first column `handle`, one record per row
//! let summary = loader.process_csv("fabrics.csv", "fabric", 50).await?;
//! println!("upserted {}, failed {}", summary.upserted, summary.failed);
//!
//! // Export the type back out
//! loader
//!     .export_metaobjects_to_csv("fabric", "fabric_export.csv", &Default::default())
//!     .await?;
//! ```
//!
//! ## Building Records Programmatically
//!
//! ```rust
//! use shopify_metaobjects::Metaobject;
//!
//! let mut spec = Metaobject::new("product_spec", "example-spec-1");
//! spec.set_field("spec_name", "Spec 1");
//! spec.set_field("spec_value", 100);
//! spec.set_field("certified", true);
//! spec.set_metafield("source", "import", "single_line_text_field");
//!
//! // Values serialize to Shopify's string wire form
//! assert_eq!(spec.to_shopify_fields()[2].value, "true");
//! ```
//!
//! ## Validating Against a Definition
//!
//! ```rust
//! use shopify_metaobjects::{
//!     validate_metaobject, FieldDefinition, Metaobject, MetaobjectDefinition,
//! };
//!
//! let definition = MetaobjectDefinition::new("fabric", "Fabric")
//!     .with_field(FieldDefinition::new("fabric_name", "Name", "single_line_text_field").required())
//!     .with_field(FieldDefinition::new("stretch_level", "Stretch", "number_integer").required());
//!
//! let mut record = Metaobject::new("fabric", "h");
//! record.set_field("fabric_name", "Wool");
//!
//! let violations = validate_metaobject(&record, &definition);
//! assert!(violations[0].contains("stretch_level"));
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration, logging, and caching are
//!   instance-based and injected by the caller
//! - **Fail-fast validation**: newtypes and CSV input validate before any
//!   network call
//! - **Sequential by design**: batches and records run strictly in order,
//!   which keeps rate-limit compliance simple
//! - **Partial-failure tolerance**: a failed record is counted, never fatal
//!   to the run
//! - **Async-first**: designed for use with the Tokio runtime

pub mod clients;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;

// Re-export public types at crate root for convenience
pub use config::{
    AccessToken, ApiVersion, HostUrl, LoaderConfig, LoaderConfigBuilder, RetryPolicy, ShopDomain,
};
pub use error::ConfigError;

// Re-export gateway types
pub use clients::{ApiError, DiskCache, Gateway, MemoryCache, ResponseCache, UserError};

// Re-export model types
pub use model::{
    validate_metaobject, DefinitionSummary, FieldDefinition, FieldInput, FieldValidation,
    FieldValue, Metafield, Metaobject, MetaobjectDefinition, PayloadError,
    DEFAULT_METAFIELD_NAMESPACE,
};

// Re-export pipeline types
pub use loader::{
    read_metaobjects_from_csv, write_metaobjects_to_csv, CsvError, ExportOptions, LoaderError,
    MetaobjectLoader, MetaobjectPage, MetaobjectStats, TypeDescription, UpsertFailure,
    UpsertSummary, DEFAULT_BATCH_SIZE, MAX_PAGE_SIZE,
};
