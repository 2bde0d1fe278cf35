//! The host environment interface.
//!
//! A host framework keeps process-wide state that grows while a large result
//! set is walked: a log of executed queries, counters of fired actions, an
//! object cache and callback registrations that pin query results in memory.
//! [`HostEnvironment`] exposes exactly the operations the cleanup routines
//! need, so the iterator core never touches that state directly.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// ActionSnapshot
// ─────────────────────────────────────────────────────────────────────────────

/// A copy of the host's per-action invocation counters.
///
/// Taken before an iteration starts and written back between chunks so that
/// actions fired while processing items do not accumulate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSnapshot(IndexMap<String, u64>);

impl ActionSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the counter for `action`, if it was recorded.
    #[must_use]
    pub fn get(&self, action: &str) -> Option<u64> {
        self.0.get(action).copied()
    }

    /// Number of distinct actions in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no action was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(action, count)` pairs in recording order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Consumes the snapshot, returning the underlying counters.
    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, u64> {
        self.0
    }
}

impl From<IndexMap<String, u64>> for ActionSnapshot {
    fn from(counters: IndexMap<String, u64>) -> Self {
        Self(counters)
    }
}

impl FromIterator<(String, u64)> for ActionSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HostEnvironment Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Operations on the host framework's ambient state.
///
/// All methods take `&self`; implementations use interior mutability so a
/// single host can be shared by several features through an `Arc`.
///
/// # Example
///
/// ```
/// use batchwise_host::{ActionSnapshot, HostEnvironment};
///
/// /// A host with nothing to clean.
/// struct NullHost;
///
/// impl HostEnvironment for NullHost {
///     fn backup_actions(&self) -> ActionSnapshot { ActionSnapshot::new() }
///     fn restore_actions(&self, _snapshot: ActionSnapshot) {}
///     fn clear_query_log(&self) {}
///     fn reset_object_cache_bookkeeping(&self) {}
///     fn flush_object_cache(&self) {}
///     fn using_external_object_cache(&self) -> bool { false }
///     fn set_cache_addition_suspended(&self, _suspended: bool) {}
///     fn filter_callback_ids(&self, _hook: &str, _priority: i32) -> Vec<String> { Vec::new() }
///     fn remove_filter_callback(&self, _hook: &str, _priority: i32, _id: &str) -> bool { false }
/// }
/// ```
pub trait HostEnvironment: Send + Sync + 'static {
    /// Copies the current action counters.
    fn backup_actions(&self) -> ActionSnapshot;

    /// Replaces the action counters with `snapshot`.
    fn restore_actions(&self, snapshot: ActionSnapshot);

    /// Empties the accumulated query log.
    fn clear_query_log(&self);

    /// Resets the object cache's bookkeeping: group operations, statistics,
    /// debug data and the in-process value map.
    fn reset_object_cache_bookkeeping(&self);

    /// Calls the cache backend's flush entry point.
    fn flush_object_cache(&self);

    /// Whether an external (persistent) object cache backend is active.
    fn using_external_object_cache(&self) -> bool;

    /// Pushes buffered writes to a remote cache backend. Backends without a
    /// write buffer keep the default, which does nothing.
    fn sync_remote_cache(&self) {}

    /// Suspends or resumes additions to the object cache.
    fn set_cache_addition_suspended(&self, suspended: bool);

    /// Lists the ids of callbacks registered on `hook` at `priority`.
    fn filter_callback_ids(&self, hook: &str, priority: i32) -> Vec<String>;

    /// Removes one callback registration. Returns whether it existed.
    fn remove_filter_callback(&self, hook: &str, priority: i32, id: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_preserves_recording_order() {
        let snapshot: ActionSnapshot = [("init".to_owned(), 1), ("save_post".to_owned(), 4)]
            .into_iter()
            .collect();

        let pairs: Vec<_> = snapshot.iter().collect();
        assert_eq!(pairs, vec![("init", 1), ("save_post", 4)]);
        assert_eq!(snapshot.get("save_post"), Some(4));
        assert_eq!(snapshot.get("missing"), None);
    }

    #[test]
    fn snapshot_serializes_as_plain_map() {
        let snapshot: ActionSnapshot = [("init".to_owned(), 2)].into_iter().collect();

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"init":2}"#);

        let back: ActionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
