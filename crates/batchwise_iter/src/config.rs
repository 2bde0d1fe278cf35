//! Iterator configuration.
//!
//! [`IteratorConfig`] bundles the two tunables of a paginating iterator. It can
//! be deserialized with serde, read from the environment, or built in code:
//!
//! ```
//! use batchwise_iter::IteratorConfig;
//!
//! let config = IteratorConfig::default().with_page_size(500).with_limit(10_000);
//! assert_eq!(config.page_size, 500);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Items requested per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Environment variable holding the page size.
pub const PAGE_SIZE_VAR: &str = "BATCHWISE_PAGE_SIZE";

/// Environment variable holding the item limit.
pub const LIMIT_VAR: &str = "BATCHWISE_LIMIT";

/// Page size and limit for a paginating iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IteratorConfig {
    /// Items requested per fetch.
    pub page_size: usize,
    /// Hard cap on the number of items yielded. `0` means unlimited.
    pub limit: usize,
}

impl Default for IteratorConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            limit: 0,
        }
    }
}

impl IteratorConfig {
    /// Sets the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the item limit. `0` means unlimited.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Reads [`PAGE_SIZE_VAR`] and [`LIMIT_VAR`] from the process environment.
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to something other than an
    /// unsigned integer, or if the page size is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(page_size) = parse_var(&lookup, PAGE_SIZE_VAR)? {
            if page_size == 0 {
                return Err(ConfigError::ZeroPageSize { key: PAGE_SIZE_VAR });
            }
            config.page_size = page_size;
        }

        if let Some(limit) = parse_var(&lookup, LIMIT_VAR)? {
            config.limit = limit;
        }

        Ok(config)
    }
}

fn parse_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<usize>, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue { key, value: raw })
}
