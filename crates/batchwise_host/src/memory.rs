//! In-memory host for tests.
//!
//! [`InMemoryHost`] models the ambient state a host framework accumulates
//! while a batch job runs, and counts the cleanup calls made against it.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::environment::{ActionSnapshot, HostEnvironment};

#[derive(Debug, Default)]
struct HostState {
    actions: IndexMap<String, u64>,
    query_log: Vec<String>,
    cache: IndexMap<(String, String), String>,
    group_ops: IndexMap<String, u64>,
    cache_hits: u64,
    cache_misses: u64,
    cache_addition_suspended: bool,
    filters: IndexMap<String, BTreeMap<i32, Vec<String>>>,
    flush_count: usize,
    remote_sync_count: usize,
    restore_count: usize,
}

/// Host environment backed by in-process maps.
///
/// Only available with the `test-utils` feature or in tests.
///
/// # Example
///
/// ```ignore
/// use batchwise_host::{InMemoryHost, clear_query_log};
///
/// let host = InMemoryHost::new();
/// host.log_query("SELECT * FROM posts");
///
/// clear_query_log(&host);
/// assert!(host.query_log().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryHost {
    state: Mutex<HostState>,
    external_object_cache: bool,
}

impl InMemoryHost {
    /// Creates an empty host with a local object cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the object cache as an external backend.
    #[must_use]
    pub fn with_external_object_cache(mut self, external: bool) -> Self {
        self.external_object_cache = external;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Simulated host activity
    // ─────────────────────────────────────────────────────────────────────────

    /// Records one invocation of `action`.
    pub fn do_action(&self, action: &str) {
        *self.state.lock().actions.entry(action.to_owned()).or_default() += 1;
    }

    /// Appends a statement to the query log.
    pub fn log_query(&self, sql: impl Into<String>) {
        self.state.lock().query_log.push(sql.into());
    }

    /// Adds a value to the object cache. Returns `false` when additions are
    /// suspended or the key is already cached.
    pub fn cache_add(&self, group: &str, key: &str, value: impl Into<String>) -> bool {
        let mut state = self.state.lock();
        *state.group_ops.entry(group.to_owned()).or_default() += 1;

        if state.cache_addition_suspended {
            return false;
        }

        let slot = (group.to_owned(), key.to_owned());
        if state.cache.contains_key(&slot) {
            return false;
        }
        state.cache.insert(slot, value.into());
        true
    }

    /// Looks a value up in the object cache, updating hit/miss statistics.
    pub fn cache_get(&self, group: &str, key: &str) -> Option<String> {
        let mut state = self.state.lock();
        *state.group_ops.entry(group.to_owned()).or_default() += 1;

        let value = state
            .cache
            .get(&(group.to_owned(), key.to_owned()))
            .cloned();
        if value.is_some() {
            state.cache_hits += 1;
        } else {
            state.cache_misses += 1;
        }
        value
    }

    /// Registers a callback id on `hook` at `priority`.
    pub fn add_filter(&self, hook: &str, priority: i32, id: impl Into<String>) {
        self.state
            .lock()
            .filters
            .entry(hook.to_owned())
            .or_default()
            .entry(priority)
            .or_default()
            .push(id.into());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns how many times `action` was recorded.
    #[must_use]
    pub fn action_count(&self, action: &str) -> u64 {
        self.state.lock().actions.get(action).copied().unwrap_or(0)
    }

    /// Returns the number of distinct actions recorded.
    #[must_use]
    pub fn distinct_actions(&self) -> usize {
        self.state.lock().actions.len()
    }

    /// Returns a copy of the query log.
    #[must_use]
    pub fn query_log(&self) -> Vec<String> {
        self.state.lock().query_log.clone()
    }

    /// Number of values in the object cache.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.state.lock().cache.len()
    }

    /// Total number of recorded cache group operations.
    #[must_use]
    pub fn group_op_count(&self) -> u64 {
        self.state.lock().group_ops.values().sum()
    }

    /// Cache `(hits, misses)` since the last bookkeeping reset.
    #[must_use]
    pub fn cache_stats(&self) -> (u64, u64) {
        let state = self.state.lock();
        (state.cache_hits, state.cache_misses)
    }

    /// Whether cache additions are currently suspended.
    #[must_use]
    pub fn is_cache_addition_suspended(&self) -> bool {
        self.state.lock().cache_addition_suspended
    }

    /// Number of times the object cache was flushed.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.state.lock().flush_count
    }

    /// Number of times buffered cache writes were synced to the remote backend.
    #[must_use]
    pub fn remote_sync_count(&self) -> usize {
        self.state.lock().remote_sync_count
    }

    /// Number of times action counters were restored.
    #[must_use]
    pub fn restore_count(&self) -> usize {
        self.state.lock().restore_count
    }
}

impl HostEnvironment for InMemoryHost {
    fn backup_actions(&self) -> ActionSnapshot {
        ActionSnapshot::from(self.state.lock().actions.clone())
    }

    fn restore_actions(&self, snapshot: ActionSnapshot) {
        let mut state = self.state.lock();
        state.actions = snapshot.into_inner();
        state.restore_count += 1;
    }

    fn clear_query_log(&self) {
        self.state.lock().query_log.clear();
    }

    fn reset_object_cache_bookkeeping(&self) {
        let mut state = self.state.lock();
        state.group_ops.clear();
        state.cache_hits = 0;
        state.cache_misses = 0;
        state.cache.clear();
    }

    fn flush_object_cache(&self) {
        let mut state = self.state.lock();
        state.cache.clear();
        state.flush_count += 1;
    }

    fn using_external_object_cache(&self) -> bool {
        self.external_object_cache
    }

    fn sync_remote_cache(&self) {
        self.state.lock().remote_sync_count += 1;
    }

    fn set_cache_addition_suspended(&self, suspended: bool) {
        self.state.lock().cache_addition_suspended = suspended;
    }

    fn filter_callback_ids(&self, hook: &str, priority: i32) -> Vec<String> {
        self.state
            .lock()
            .filters
            .get(hook)
            .and_then(|priorities| priorities.get(&priority))
            .cloned()
            .unwrap_or_default()
    }

    fn remove_filter_callback(&self, hook: &str, priority: i32, id: &str) -> bool {
        let mut state = self.state.lock();
        let Some(ids) = state
            .filters
            .get_mut(hook)
            .and_then(|priorities| priorities.get_mut(&priority))
        else {
            return false;
        };

        let before = ids.len();
        ids.retain(|existing| existing != id);
        ids.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_add_refuses_duplicates_and_suspension() {
        let host = InMemoryHost::new();

        assert!(host.cache_add("posts", "1", "a"));
        assert!(!host.cache_add("posts", "1", "b"));

        host.set_cache_addition_suspended(true);
        assert!(!host.cache_add("posts", "2", "c"));
        assert_eq!(host.cache_len(), 1);
    }

    #[test]
    fn cache_get_tracks_stats() {
        let host = InMemoryHost::new();
        host.cache_add("users", "7", "admin");

        assert_eq!(host.cache_get("users", "7").as_deref(), Some("admin"));
        assert_eq!(host.cache_get("users", "8"), None);

        assert_eq!(host.cache_stats(), (1, 1));
        assert_eq!(host.group_op_count(), 3);
    }

    #[test]
    fn reset_bookkeeping_clears_stats_and_values() {
        let host = InMemoryHost::new();
        host.cache_add("users", "7", "admin");
        host.cache_get("users", "7");

        host.reset_object_cache_bookkeeping();

        assert_eq!(host.cache_stats(), (0, 0));
        assert_eq!(host.group_op_count(), 0);
        assert_eq!(host.cache_len(), 0);
        assert_eq!(host.flush_count(), 0);
    }

    #[test]
    fn restore_replaces_counters() {
        let host = InMemoryHost::new();
        host.do_action("init");
        let snapshot = host.backup_actions();

        host.do_action("init");
        host.do_action("the_post");
        assert_eq!(host.distinct_actions(), 2);

        host.restore_actions(snapshot);
        assert_eq!(host.action_count("init"), 1);
        assert_eq!(host.distinct_actions(), 1);
        assert_eq!(host.restore_count(), 1);
    }

    #[test]
    fn remove_filter_callback_reports_presence() {
        let host = InMemoryHost::new();
        host.add_filter("get_term_metadata", 10, "cb");

        assert!(host.remove_filter_callback("get_term_metadata", 10, "cb"));
        assert!(!host.remove_filter_callback("get_term_metadata", 10, "cb"));
        assert!(!host.remove_filter_callback("unknown", 10, "cb"));
    }
}
