//! Configuration types for the metaobject loader.
//!
//! This module provides the core configuration types used to initialize the
//! loader for API communication with a Shopify store.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`LoaderConfig`]: The main configuration struct holding all settings
//! - [`LoaderConfigBuilder`]: A builder for constructing [`LoaderConfig`] instances
//! - [`ShopDomain`]: A validated Shopify shop domain
//! - [`AccessToken`]: A validated Admin API access token with masked debug output
//! - [`HostUrl`]: A validated endpoint-override URL
//! - [`ApiVersion`]: The pinned Admin API version to use
//! - [`RetryPolicy`]: Bounded exponential backoff settings for transient failures
//!
//! # Example
//!
//! ```rust
//! use shopify_metaobjects::{AccessToken, LoaderConfig, ShopDomain};
//!
//! let config = LoaderConfig::builder()
//!     .shop_domain(ShopDomain::new("my-store").unwrap())
//!     .access_token(AccessToken::new("shpat_example").unwrap())
//!     .build()
//!     .unwrap();
//! ```

mod newtypes;
mod version;

pub use newtypes::{AccessToken, HostUrl, ShopDomain};
pub use version::ApiVersion;

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Bounded exponential backoff for transient API failures.
///
/// A call is attempted at most `max_attempts` times. The wait before retry
/// `n` (counting the first retry as `n = 1`) is `min_delay * 2^(n-1)`,
/// capped at `max_delay`, so delays grow strictly until they hit the cap.
///
/// The defaults reproduce the loader's long-standing behavior: 3 attempts,
/// waits of 4 s then 8 s, never more than 10 s.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use shopify_metaobjects::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts(), 3);
/// assert_eq!(policy.delay_for(1), Duration::from_secs(4));
/// assert_eq!(policy.delay_for(2), Duration::from_secs(8));
/// assert_eq!(policy.delay_for(3), Duration::from_secs(10)); // capped
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    min_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRetryPolicy`] if `max_attempts` is zero
    /// or `max_delay` is below `min_delay`.
    pub fn new(
        max_attempts: u32,
        min_delay: Duration,
        max_delay: Duration,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidRetryPolicy {
                reason: "max_attempts must be at least 1",
            });
        }
        if max_delay < min_delay {
            return Err(ConfigError::InvalidRetryPolicy {
                reason: "max_delay must not be below min_delay",
            });
        }
        Ok(Self {
            max_attempts,
            min_delay,
            max_delay,
        })
    }

    /// Returns the maximum number of attempts (initial call included).
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the wait before retry number `retry` (1-based).
    ///
    /// Doubles from `min_delay`, capped at `max_delay`. `retry == 0` is
    /// treated as the first retry.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(32);
        let scaled = self
            .min_delay
            .saturating_mul(2u32.saturating_pow(exponent));
        scaled.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Configuration for the metaobject loader.
///
/// This struct holds everything needed to talk to one store: credentials,
/// the pinned API version, retry behavior, and the optional response-cache
/// directory.
///
/// # Thread Safety
///
/// `LoaderConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
///
/// # Example
///
/// ```rust
/// use shopify_metaobjects::{AccessToken, ApiVersion, LoaderConfig, ShopDomain};
///
/// let config = LoaderConfig::builder()
///     .shop_domain(ShopDomain::new("my-store").unwrap())
///     .access_token(AccessToken::new("shpat_example").unwrap())
///     .api_version(ApiVersion::V2025_04)
///     .cache_dir(".cache")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.api_version(), &ApiVersion::V2025_04);
/// ```
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    shop_domain: ShopDomain,
    access_token: AccessToken,
    api_version: ApiVersion,
    api_host: Option<HostUrl>,
    cache_dir: Option<PathBuf>,
    user_agent_prefix: Option<String>,
    retry: RetryPolicy,
}

impl LoaderConfig {
    /// Creates a new builder for constructing a `LoaderConfig`.
    #[must_use]
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::new()
    }

    /// Returns the shop domain.
    #[must_use]
    pub const fn shop_domain(&self) -> &ShopDomain {
        &self.shop_domain
    }

    /// Returns the access token.
    #[must_use]
    pub const fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the pinned API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the endpoint-override host, if configured.
    #[must_use]
    pub const fn api_host(&self) -> Option<&HostUrl> {
        self.api_host.as_ref()
    }

    /// Returns the response-cache directory, if configured.
    #[must_use]
    pub fn cache_dir(&self) -> Option<&std::path::Path> {
        self.cache_dir.as_deref()
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}

// Verify LoaderConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<LoaderConfig>();
};

/// Builder for constructing [`LoaderConfig`] instances.
///
/// Required fields are `shop_domain` and `access_token`. All other fields
/// have defaults.
///
/// # Defaults
///
/// - `api_version`: [`ApiVersion::PINNED`]
/// - `api_host`: `None` (requests go to `https://{shop}.myshopify.com`)
/// - `cache_dir`: `None` (no response caching)
/// - `user_agent_prefix`: `None`
/// - `retry`: [`RetryPolicy::default`]
#[derive(Debug, Default)]
pub struct LoaderConfigBuilder {
    shop_domain: Option<ShopDomain>,
    access_token: Option<AccessToken>,
    api_version: Option<ApiVersion>,
    api_host: Option<HostUrl>,
    cache_dir: Option<PathBuf>,
    user_agent_prefix: Option<String>,
    retry: Option<RetryPolicy>,
}

impl LoaderConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the shop domain (required).
    #[must_use]
    pub fn shop_domain(mut self, domain: ShopDomain) -> Self {
        self.shop_domain = Some(domain);
        self
    }

    /// Sets the access token (required).
    #[must_use]
    pub fn access_token(mut self, token: AccessToken) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Routes requests to an alternative host instead of the shop domain.
    ///
    /// Intended for proxies and test servers; the GraphQL path and headers
    /// are unchanged.
    #[must_use]
    pub fn api_host(mut self, host: HostUrl) -> Self {
        self.api_host = Some(host);
        self
    }

    /// Enables on-disk caching of read-only responses under this directory.
    #[must_use]
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the retry policy for transient failures.
    #[must_use]
    pub const fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Builds the [`LoaderConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `shop_domain` or
    /// `access_token` are not set.
    pub fn build(self) -> Result<LoaderConfig, ConfigError> {
        let shop_domain = self.shop_domain.ok_or(ConfigError::MissingRequiredField {
            field: "shop_domain",
        })?;
        let access_token = self.access_token.ok_or(ConfigError::MissingRequiredField {
            field: "access_token",
        })?;

        Ok(LoaderConfig {
            shop_domain,
            access_token,
            api_version: self.api_version.unwrap_or_default(),
            api_host: self.api_host,
            cache_dir: self.cache_dir,
            user_agent_prefix: self.user_agent_prefix,
            retry: self.retry.unwrap_or_default(),
        })
    }
}
