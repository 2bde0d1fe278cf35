//! Error types for the paginating iterator.

use batchwise_hooks::{BoxError, HookError, RegistrationError};

/// Errors raised while configuring or driving a [`PaginatingIterator`](crate::PaginatingIterator).
#[derive(Debug, thiserror::Error)]
pub enum IterError {
    /// A configuration change or a second `start()` after iteration began.
    #[error("cannot {operation}: configuration is locked once iteration has started")]
    LockedConfiguration {
        /// The rejected operation.
        operation: &'static str,
    },

    /// A page was needed but no fetcher was configured.
    #[error("no fetcher configured")]
    MissingFetcher,

    /// `advance()` was called before `start()`.
    #[error("iteration has not been started")]
    NotStarted,

    /// A page size of zero was requested.
    #[error("page size must be greater than zero")]
    InvalidPageSize,

    /// A feature could not be registered.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A lifecycle handler failed.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The fetcher failed.
    #[error("failed to fetch page {page}")]
    Fetch {
        /// The page being fetched.
        page: usize,
        /// The fetcher's error.
        #[source]
        source: BoxError,
    },
}

/// Error loading an [`IteratorConfig`](crate::IteratorConfig) from the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed as an unsigned integer.
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue {
        /// Name of the variable.
        key: &'static str,
        /// The raw value.
        value: String,
    },

    /// The page size variable was set to zero.
    #[error("{key} must be greater than zero")]
    ZeroPageSize {
        /// Name of the variable.
        key: &'static str,
    },
}
