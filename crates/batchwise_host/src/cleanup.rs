//! Cleanup operations on the host's ambient state.
//!
//! Each function is independent and idempotent. Features compose them into
//! lifecycle handlers; nothing here keeps state between calls.

use std::sync::LazyLock;

use regex::Regex;

use crate::environment::{ActionSnapshot, HostEnvironment};

/// Hook on which lazy-loading term metadata callbacks are registered.
pub const LAZYLOAD_HOOK: &str = "get_term_metadata";

/// Priority of the lazy-loading term metadata callbacks.
pub const LAZYLOAD_PRIORITY: i32 = 10;

/// Callback ids look like a 32 character hex object hash followed by the
/// method name.
static LAZYLOAD_CALLBACK_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{32}lazyload_term_meta$").expect("lazyload callback pattern is valid")
});

/// Empties the host's query log.
pub fn clear_query_log<H: HostEnvironment + ?Sized>(host: &H) {
    host.clear_query_log();
    tracing::trace!("query log cleared");
}

/// Copies the host's action counters.
#[must_use]
pub fn backup_actions<H: HostEnvironment + ?Sized>(host: &H) -> ActionSnapshot {
    let snapshot = host.backup_actions();
    tracing::trace!(actions = snapshot.len(), "action counters backed up");
    snapshot
}

/// Writes a previously taken snapshot back into the host.
pub fn restore_actions<H: HostEnvironment + ?Sized>(host: &H, snapshot: &ActionSnapshot) {
    host.restore_actions(snapshot.clone());
    tracing::trace!(actions = snapshot.len(), "action counters restored");
}

/// Resets object cache bookkeeping and, when no external cache backend is
/// active, flushes the in-process cache. Buffered remote writes are synced
/// either way.
pub fn clear_object_cache<H: HostEnvironment + ?Sized>(host: &H) {
    host.reset_object_cache_bookkeeping();

    if host.using_external_object_cache() {
        tracing::trace!("object cache bookkeeping reset, external backend left intact");
    } else {
        host.flush_object_cache();
        tracing::trace!("object cache flushed");
    }

    host.sync_remote_cache();
}

/// Removes stale lazy-loading callbacks that keep query results reachable.
///
/// Only callbacks on [`LAZYLOAD_HOOK`] at [`LAZYLOAD_PRIORITY`] whose id
/// matches the lazy-loader naming pattern are removed. Returns the number of
/// callbacks removed.
pub fn break_lazyload_cycles<H: HostEnvironment + ?Sized>(host: &H) -> usize {
    let mut removed = 0;

    for id in host.filter_callback_ids(LAZYLOAD_HOOK, LAZYLOAD_PRIORITY) {
        if LAZYLOAD_CALLBACK_ID.is_match(&id)
            && host.remove_filter_callback(LAZYLOAD_HOOK, LAZYLOAD_PRIORITY, &id)
        {
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::debug!(removed, "lazyload callbacks removed");
    }
    removed
}

/// Stops the host from adding new entries to its object cache.
pub fn suspend_cache_addition<H: HostEnvironment + ?Sized>(host: &H) {
    host.set_cache_addition_suspended(true);
    tracing::trace!("cache addition suspended");
}

/// Lets the host add entries to its object cache again.
pub fn resume_cache_addition<H: HostEnvironment + ?Sized>(host: &H) {
    host.set_cache_addition_suspended(false);
    tracing::trace!("cache addition resumed");
}
