//! Error types for GraphQL Admin API communication.
//!
//! This module contains the error taxonomy for the API gateway, split along
//! the lines that matter for callers:
//!
//! - [`ApiError::RetriesExceeded`]: a transient failure (throttling, 5xx, or
//!   a network fault) survived every retry attempt
//! - [`ApiError::Response`]: a non-retryable HTTP failure
//! - [`ApiError::Graphql`]: top-level GraphQL errors in a 200 response
//! - [`ApiError::UserErrors`]: mutation-level user errors - never retried,
//!   since repeating an invalid mutation cannot help
//! - [`ApiError::Network`]: a transport fault with no retries configured
//!
//! # Example
//!
//! ```rust,ignore
//! match gateway.execute(query, variables).await {
//!     Ok(data) => println!("data: {data}"),
//!     Err(ApiError::RetriesExceeded { attempts, .. }) => {
//!         println!("gave up after {attempts} attempts");
//!     }
//!     Err(ApiError::UserErrors { errors, .. }) => {
//!         for error in errors {
//!             println!("{error}");
//!         }
//!     }
//!     Err(other) => println!("{other}"),
//! }
//! ```

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// A single user error from a mutation's `userErrors` array.
///
/// Carries the field/message/code triple the API reports for semantic
/// failures (bad permission scope, malformed input, validation failures).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserError {
    /// Path to the input field the error refers to, when the API gives one.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    /// The human-readable message.
    pub message: String,
    /// The machine-readable error code, when present.
    #[serde(default)]
    pub code: Option<String>,
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "{}: ", field.join("."))?;
        }
        f.write_str(&self.message)?;
        if let Some(code) = &self.code {
            write!(f, " ({code})")?;
        }
        Ok(())
    }
}

/// Extracts the `userErrors` array from a mutation payload.
///
/// Entries that do not match the expected shape are skipped rather than
/// failing the whole extraction.
#[must_use]
pub fn user_errors_from(payload: &serde_json::Value) -> Vec<UserError> {
    payload
        .get("userErrors")
        .and_then(serde_json::Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Unified error type for GraphQL Admin API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A non-retryable HTTP failure (4xx other than 429).
    #[error("Shopify API returned status {code}: {message}")]
    Response {
        /// The HTTP status code.
        code: u16,
        /// The response body, abbreviated to its error content.
        message: String,
    },

    /// A transient failure survived every retry attempt.
    #[error("Exceeded maximum retry count of {attempts}. Last status {code}: {message}")]
    RetriesExceeded {
        /// The number of attempts made.
        attempts: u32,
        /// The HTTP status of the last response, or 0 for a transport fault.
        code: u16,
        /// The last failure message.
        message: String,
    },

    /// Top-level GraphQL errors returned inside a successful HTTP response.
    ///
    /// Not retried: the request itself is malformed or rejected, so a
    /// repeat would fail identically.
    #[error("GraphQL errors: {}", .messages.join("; "))]
    Graphql {
        /// The error messages from the response's `errors` array.
        messages: Vec<String>,
    },

    /// Mutation-level user errors. Never retried.
    #[error("{operation} reported {} user error(s): {}", .errors.len(), format_user_errors(.errors))]
    UserErrors {
        /// The mutation that reported the errors.
        operation: String,
        /// The field/message/code triples from the API.
        errors: Vec<UserError>,
    },

    /// A network or connection error with no retries left to spend.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
