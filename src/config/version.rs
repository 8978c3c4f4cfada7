//! Shopify API version definitions.
//!
//! This module provides the [`ApiVersion`] enum for specifying which version
//! of the GraphQL Admin API to use. Every request carries an explicit,
//! concrete version in its URL - there is no floating "latest" alias.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Shopify API version.
///
/// Shopify releases new API versions quarterly (January, April, July,
/// October). This enum provides variants for known stable versions, plus a
/// `Custom` variant for future versions.
///
/// The crate pins [`ApiVersion::PINNED`] as its default; callers that need a
/// different version set it explicitly on the configuration.
///
/// # Example
///
/// ```rust
/// use shopify_metaobjects::ApiVersion;
///
/// // Parse from string
/// let version: ApiVersion = "2025-04".parse().unwrap();
/// assert_eq!(version, ApiVersion::V2025_04);
///
/// // Display as string
/// assert_eq!(format!("{}", ApiVersion::V2025_04), "2025-04");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// API version 2024-07 (July 2024)
    V2024_07,
    /// API version 2024-10 (October 2024)
    V2024_10,
    /// API version 2025-01 (January 2025)
    V2025_01,
    /// API version 2025-04 (April 2025)
    V2025_04,
    /// API version 2025-07 (July 2025)
    V2025_07,
    /// Custom version string for future or unrecognized versions.
    Custom(String),
}

impl ApiVersion {
    /// The version this crate pins by default.
    ///
    /// Bump deliberately alongside the GraphQL documents, never implicitly.
    pub const PINNED: Self = Self::V2025_04;

    /// Returns `true` if this is a known stable API version.
    ///
    /// Returns `false` for the `Custom` variant.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    /// Returns the version as its `YYYY-MM` URL segment.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::V2024_07 => "2024-07",
            Self::V2024_10 => "2024-10",
            Self::V2025_01 => "2025-01",
            Self::V2025_04 => "2025-04",
            Self::V2025_07 => "2025-07",
            Self::Custom(s) => s,
        }
    }

    /// Validates that a string looks like a `YYYY-MM` version tag.
    fn is_well_formed(s: &str) -> bool {
        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return false;
        }
        if !bytes[..4].iter().all(u8::is_ascii_digit)
            || !bytes[5..].iter().all(u8::is_ascii_digit)
        {
            return false;
        }
        // Quarterly release tags, still bounded to real months
        matches!(s[5..].parse::<u8>(), Ok(1..=12))
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::PINNED
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "2024-07" => Ok(Self::V2024_07),
            "2024-10" => Ok(Self::V2024_10),
            "2025-01" => Ok(Self::V2025_01),
            "2025-04" => Ok(Self::V2025_04),
            "2025-07" => Ok(Self::V2025_07),
            other if Self::is_well_formed(other) => Ok(Self::Custom(other.to_string())),
            other => Err(ConfigError::InvalidApiVersion {
                version: other.to_string(),
            }),
        }
    }
}
