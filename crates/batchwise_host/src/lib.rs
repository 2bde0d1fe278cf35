//! Host environment interface and cleanup operations.
//!
//! Batch jobs running inside a host framework leak memory through the
//! framework's process-wide state: query logs, action counters, object caches
//! and callback registrations. This crate provides:
//!
//! - [`HostEnvironment`] - the narrow interface to that state
//! - [`ActionSnapshot`] - a copy of the action counters
//! - cleanup free functions ([`clear_query_log`], [`clear_object_cache`], ...)
//! - [`InMemoryHost`] - an in-memory fake for tests
//!
//! # Feature Flags
//!
//! - `test-utils` - Enables [`InMemoryHost`]

mod cleanup;
mod environment;

#[cfg(any(test, feature = "test-utils"))]
mod memory;

pub use cleanup::{
    LAZYLOAD_HOOK, LAZYLOAD_PRIORITY, backup_actions, break_lazyload_cycles, clear_object_cache,
    clear_query_log, restore_actions, resume_cache_addition, suspend_cache_addition,
};
pub use environment::{ActionSnapshot, HostEnvironment};

#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemoryHost;
