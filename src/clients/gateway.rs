//! The API gateway: the sole component performing network I/O.
//!
//! [`Gateway`] issues GraphQL requests against the Admin API endpoint,
//! carries the authentication headers, retries transient failures with
//! bounded exponential backoff, and optionally serves read-only queries
//! from an injected response cache.

use std::collections::HashMap;
use std::time::Duration;

use crate::clients::cache::{request_signature, DiskCache, ResponseCache};
use crate::clients::errors::ApiError;
use crate::config::LoaderConfig;

/// Library version from Cargo.toml, reported in the User-Agent header.
pub const LIB_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The outcome of a single POST attempt, before retry classification.
enum Outcome {
    /// A 2xx response with no GraphQL-level errors; holds the `data` object.
    Success(serde_json::Value),
    /// A failure that retrying cannot fix.
    Fatal(ApiError),
    /// Throttling, a server error, or a transport fault.
    Retryable {
        code: u16,
        message: String,
        retry_after: Option<f64>,
        source: Option<reqwest::Error>,
    },
}

/// GraphQL gateway for the Shopify Admin API.
///
/// Every request goes to
/// `https://{shop_domain}/admin/api/{api_version}/graphql.json` with the
/// access-token header; the API version is pinned by configuration and
/// always explicit in the URL.
///
/// # Retry Behavior
///
/// - **429 (throttled)** and **5xx** responses, plus transport faults, are
///   retried per the configured [`RetryPolicy`](crate::RetryPolicy),
///   honoring a `Retry-After` hint when it exceeds the computed backoff.
///   Exhaustion surfaces as [`ApiError::RetriesExceeded`].
/// - **GraphQL-level errors** (top-level `errors`, mutation `userErrors`)
///   arrive inside successful HTTP responses and are never retried -
///   repeating an invalid request would fail identically.
///
/// # Caching
///
/// With a cache configured, [`Gateway::execute_cached`] serves repeats of a
/// read-only query from the cache, keyed by query + variables. Mutations go
/// through [`Gateway::execute`], which never touches the cache. A cache miss
/// behaves identically to no-cache operation.
///
/// # Thread Safety
///
/// `Gateway` is `Send + Sync`, making it safe to share across async tasks.
#[derive(Debug)]
pub struct Gateway {
    client: reqwest::Client,
    endpoint: String,
    default_headers: HashMap<String, String>,
    retry: crate::config::RetryPolicy,
    cache: Option<Box<dyn ResponseCache>>,
}

// Verify Gateway is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Gateway>();
};

impl Gateway {
    /// Creates a gateway for the configured store.
    ///
    /// When the configuration carries a `cache_dir`, responses to read-only
    /// queries are cached on disk under it. Use [`Gateway::with_cache`] to
    /// inject a different cache implementation.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This should
    /// only happen in extremely unusual circumstances (e.g., TLS
    /// initialization failure).
    #[must_use]
    pub fn new(config: &LoaderConfig) -> Self {
        let cache = config
            .cache_dir()
            .map(|dir| Box::new(DiskCache::new(dir)) as Box<dyn ResponseCache>);
        Self::build(config, cache)
    }

    /// Creates a gateway with an explicitly injected response cache.
    ///
    /// Overrides any `cache_dir` in the configuration; tests typically pass
    /// a [`MemoryCache`](crate::clients::MemoryCache) here.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created.
    #[must_use]
    pub fn with_cache(config: &LoaderConfig, cache: Box<dyn ResponseCache>) -> Self {
        Self::build(config, Some(cache))
    }

    fn build(config: &LoaderConfig, cache: Option<Box<dyn ResponseCache>>) -> Self {
        // Base URI comes from the api_host override when configured
        // (proxy/test scenario), otherwise straight from the shop domain.
        let base_uri = config.api_host().map_or_else(
            || format!("https://{}", config.shop_domain().as_ref()),
            |host| host.trimmed().to_string(),
        );
        let endpoint = format!(
            "{base_uri}/admin/api/{}/graphql.json",
            config.api_version()
        );

        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent = format!(
            "{user_agent_prefix}Shopify Metaobjects Loader v{LIB_VERSION} | Rust {rust_version}"
        );

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        default_headers.insert(
            "Content-Type".to_string(),
            "application/json".to_string(),
        );
        default_headers.insert(
            "X-Shopify-Access-Token".to_string(),
            config.access_token().as_ref().to_string(),
        );

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint,
            default_headers,
            retry: *config.retry(),
            cache,
        }
    }

    /// Returns the full GraphQL endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the default headers sent with every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Executes a GraphQL request, bypassing the cache.
    ///
    /// Use for mutations and for reads that must be fresh.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failures, retry exhaustion,
    /// non-2xx responses, or top-level GraphQL errors. On success the
    /// response's `data` object is returned.
    pub async fn execute(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        self.run(query, variables, false).await
    }

    /// Executes a read-only GraphQL query, consulting the cache first.
    ///
    /// A hit returns the stored `data` object without network I/O; a miss
    /// runs the query and stores the result. Without a configured cache this
    /// is identical to [`Gateway::execute`].
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::execute`].
    pub async fn execute_cached(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        self.run(query, variables, true).await
    }

    async fn run(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
        cacheable: bool,
    ) -> Result<serde_json::Value, ApiError> {
        let signature = request_signature(query, variables.as_ref());

        if cacheable {
            if let Some(cache) = &self.cache {
                if let Some(hit) = cache.get(&signature) {
                    tracing::debug!("Serving request {signature} from cache");
                    return Ok(hit);
                }
            }
        }

        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });
        let data = self.post_with_retry(&body).await?;

        if cacheable {
            if let Some(cache) = &self.cache {
                cache.put(&signature, &data);
            }
        }
        Ok(data)
    }

    async fn post_with_retry(
        &self,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let (code, message, retry_after, source) = match self.post_once(body).await {
                Outcome::Success(data) => return Ok(data),
                Outcome::Fatal(error) => return Err(error),
                Outcome::Retryable {
                    code,
                    message,
                    retry_after,
                    source,
                } => (code, message, retry_after, source),
            };

            if attempt >= max_attempts {
                // A single-attempt policy surfaces the raw failure rather
                // than a retry-exhaustion wrapper.
                if attempt == 1 {
                    return Err(source.map_or(ApiError::Response { code, message }, ApiError::Network));
                }
                return Err(ApiError::RetriesExceeded {
                    attempts: attempt,
                    code,
                    message,
                });
            }

            let mut delay = self.retry.delay_for(attempt);
            if let Some(seconds) = retry_after.filter(|s| s.is_finite() && *s > 0.0) {
                delay = delay.max(Duration::from_secs_f64(seconds));
            }
            tracing::warn!(
                "Transient failure (status {code}) on attempt {attempt}/{max_attempts}, retrying in {delay:?}"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn post_once(&self, body: &serde_json::Value) -> Outcome {
        let mut request = self.client.post(&self.endpoint);
        for (key, value) in &self.default_headers {
            request = request.header(key, value);
        }

        let response = match request.json(body).send().await {
            Ok(response) => response,
            Err(error) => {
                let message = error.to_string();
                return Outcome::Retryable {
                    code: 0,
                    message,
                    retry_after: None,
                    source: Some(error),
                };
            }
        };

        let code = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<f64>().ok());
        let text = response.text().await.unwrap_or_default();
        let json_body: serde_json::Value =
            serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({}));

        // Throttling signal or server fault: retryable.
        if code == 429 || code >= 500 {
            return Outcome::Retryable {
                code,
                message: Self::serialize_error(&json_body, &text),
                retry_after,
                source: None,
            };
        }

        if !(200..300).contains(&code) {
            return Outcome::Fatal(ApiError::Response {
                code,
                message: Self::serialize_error(&json_body, &text),
            });
        }

        // GraphQL-level errors arrive with HTTP 200 and are not retried.
        if let Some(errors) = json_body.get("errors").and_then(serde_json::Value::as_array) {
            if !errors.is_empty() {
                let messages = errors
                    .iter()
                    .map(|error| {
                        error
                            .get("message")
                            .and_then(serde_json::Value::as_str)
                            .map_or_else(|| error.to_string(), String::from)
                    })
                    .collect();
                return Outcome::Fatal(ApiError::Graphql { messages });
            }
        }

        Outcome::Success(
            json_body
                .get("data")
                .cloned()
                .unwrap_or_else(|| serde_json::json!({})),
        )
    }

    /// Reduces a failure response to its error content.
    fn serialize_error(json_body: &serde_json::Value, raw: &str) -> String {
        json_body.get("errors").map_or_else(
            || {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    "(empty response body)".to_string()
                } else {
                    trimmed.to_string()
                }
            },
            ToString::to_string,
        )
    }
}
