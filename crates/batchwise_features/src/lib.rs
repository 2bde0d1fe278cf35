//! Standard features and iterator factories for batchwise.
//!
//! Long batch jobs inside a host framework slowly fill process-wide state:
//! the query log, the object cache, action counters and lazy-loading
//! callbacks. The features here reset that state at page boundaries so memory
//! use stays flat no matter how many pages are processed.
//!
//! # Features
//!
//! | Feature | Name |
//! |---------|------|
//! | [`CacheCleaner`] | `cache_cleaner` |
//! | [`LazyloadCycleBreaker`] | `lazyload_cycle_breaker` |
//! | [`QueryLogCleaner`] | `query_log_cleaner` |
//! | [`ActionsRestorer`] | `actions_restorer` |
//! | [`CacheSuspender`] | `cache_suspender` |
//!
//! [`Batcher`] registers the first four on every iterator it builds.
//! [`CacheToggles`] swaps [`CacheCleaner`] for [`CacheSuspender`] and back.

mod actions;
mod cache;
mod factory;
mod housekeeping;
pub mod query;

pub use actions::ActionsRestorer;
pub use cache::{CacheCleaner, CacheSuspender, CacheToggles};
pub use factory::Batcher;
pub use housekeeping::{LazyloadCycleBreaker, QueryLogCleaner};
pub use query::{QueryArgs, QueryBackend, QueryKind};
