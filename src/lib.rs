//! Chunked iteration over paginated data sources.
//!
//! `batchwise` walks large collections one page at a time and runs
//! memory-reclaiming features between pages, so long batch jobs inside a host
//! framework keep a flat memory profile.
//!
//! # Crates
//!
//! - [`hooks`]: lifecycle events, feature capabilities, the hook registry
//! - [`host`]: the host environment interface and cleanup operations
//! - [`iter`]: the paginating iterator
//! - [`features`]: the standard features, cache toggles and the [`Batcher`](features::Batcher) factory
//! - [`logging`]: subscriber setup
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use batchwise::prelude::*;
//! # struct NullHost;
//! # impl HostEnvironment for NullHost {
//! #     fn backup_actions(&self) -> ActionSnapshot { ActionSnapshot::new() }
//! #     fn restore_actions(&self, _snapshot: ActionSnapshot) {}
//! #     fn clear_query_log(&self) {}
//! #     fn reset_object_cache_bookkeeping(&self) {}
//! #     fn flush_object_cache(&self) {}
//! #     fn using_external_object_cache(&self) -> bool { false }
//! #     fn set_cache_addition_suspended(&self, _suspended: bool) {}
//! #     fn filter_callback_ids(&self, _hook: &str, _priority: i32) -> Vec<String> { Vec::new() }
//! #     fn remove_filter_callback(&self, _hook: &str, _priority: i32, _id: &str) -> bool { false }
//! # }
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! LoggingConfig::from_env()?.init();
//!
//! let batcher = Batcher::new(Arc::new(NullHost));
//! let mut orders = batcher.callback(|page, size| {
//!     let start = (page - 1) * size;
//!     (start..(start + size).min(250)).collect::<Vec<usize>>()
//! })?;
//! orders.configure(&IteratorConfig::from_env()?)?;
//!
//! let mut exported = 0;
//! for order in orders {
//!     order?;
//!     exported += 1;
//! }
//! assert!(exported <= 250);
//! # Ok(())
//! # }
//! ```

pub use batchwise_core::logging;
pub use batchwise_features as features;
pub use batchwise_hooks as hooks;
pub use batchwise_host as host;
pub use batchwise_iter as iter;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use batchwise_core::{LogFormat, LoggingConfig, LoggingError};
    pub use batchwise_features::{
        ActionsRestorer, Batcher, CacheCleaner, CacheSuspender, CacheToggles,
        LazyloadCycleBreaker, QueryArgs, QueryBackend, QueryKind, QueryLogCleaner,
    };
    pub use batchwise_hooks::{
        AfterEachChunk, BoxError, Feature, FnFeature, HandlerResult, HookError, LifecycleEvent,
        OnFinish, OnStart, RegistrationError,
    };
    pub use batchwise_host::{ActionSnapshot, HostEnvironment};
    pub use batchwise_iter::{
        ConfigError, IterError, IteratorConfig, IteratorState, PaginatingIterator,
    };
}
