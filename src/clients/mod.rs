//! Network gateway and response caching for the Admin API.
//!
//! This module provides the transport layer for GraphQL communication with
//! Shopify. All network I/O in the crate goes through [`Gateway`]; the
//! pipelines in [`crate::loader`] never touch a socket themselves.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`Gateway`]: the async GraphQL client with retry and caching
//! - [`ApiError`]: the error taxonomy for API communication
//! - [`UserError`]: a mutation-level field/message/code triple
//! - [`ResponseCache`]: the injected caching capability
//! - [`DiskCache`] / [`MemoryCache`]: the provided cache implementations
//!
//! # Retry Behavior
//!
//! Transient failures (429 throttling, 5xx, transport faults) are retried
//! with bounded exponential backoff per the configured
//! [`RetryPolicy`](crate::RetryPolicy). GraphQL-level errors are returned in
//! successful HTTP responses and are never retried - repeating an invalid
//! mutation cannot succeed.

mod cache;
mod errors;
mod gateway;

pub use cache::{request_signature, DiskCache, MemoryCache, ResponseCache};
pub use errors::{user_errors_from, ApiError, UserError};
pub use gateway::{Gateway, LIB_VERSION};
