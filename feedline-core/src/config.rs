//! Configuration types

use crate::{ConfigError, FeedError, FeedResult};
use serde::{Deserialize, Serialize};

/// Page size used when a request does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 25;

/// Upper bound applied to any requested page size.
pub const MAX_PAGE_LIMIT: u32 = 200;

/// Feed query configuration.
///
/// Injected into request parsing; nothing reads page limits from globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Page size when `limit` is absent
    pub default_page_limit: u32,
    /// Clamp for `limit`
    pub max_page_limit: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_limit: DEFAULT_PAGE_LIMIT,
            max_page_limit: MAX_PAGE_LIMIT,
        }
    }
}

impl FeedConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `FEEDLINE_DEFAULT_PAGE_LIMIT`: page size when `limit` is absent (default: 25)
    /// - `FEEDLINE_MAX_PAGE_LIMIT`: maximum page size (default: 200)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            default_page_limit: std::env::var("FEEDLINE_DEFAULT_PAGE_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_page_limit),
            max_page_limit: std::env::var("FEEDLINE_MAX_PAGE_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_page_limit),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - max_page_limit > 0
    /// - default_page_limit <= max_page_limit
    pub fn validate(&self) -> FeedResult<()> {
        if self.max_page_limit == 0 {
            return Err(FeedError::Config(ConfigError::InvalidValue {
                field: "max_page_limit".to_string(),
                value: self.max_page_limit.to_string(),
                reason: "max_page_limit must be greater than 0".to_string(),
            }));
        }

        if self.default_page_limit > self.max_page_limit {
            return Err(FeedError::Config(ConfigError::InvalidValue {
                field: "default_page_limit".to_string(),
                value: self.default_page_limit.to_string(),
                reason: format!(
                    "default_page_limit must not exceed max_page_limit ({})",
                    self.max_page_limit
                ),
            }));
        }

        Ok(())
    }

    /// Clamp a requested page size into `[0, max_page_limit]`.
    pub fn clamp_limit(&self, requested: i64) -> u32 {
        requested.clamp(0, i64::from(self.max_page_limit)) as u32
    }
}
