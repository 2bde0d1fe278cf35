//! Object cache features and the cache toggles.
//!
//! Two mutually exclusive strategies keep the host's object cache from
//! growing across pages:
//!
//! - [`CacheCleaner`] empties the cache at every page boundary (the default)
//! - [`CacheSuspender`] stops additions for the whole run and resumes them at
//!   the end
//!
//! [`CacheToggles`] switches an unlocked iterator between the two.

use core::fmt;
use std::sync::Arc;

use batchwise_hooks::{AfterEachChunk, Feature, HandlerResult, OnFinish, OnStart};
use batchwise_host::{
    HostEnvironment, clear_object_cache, resume_cache_addition, suspend_cache_addition,
};
use batchwise_iter::{IterError, PaginatingIterator};

// ─────────────────────────────────────────────────────────────────────────────
// CacheCleaner
// ─────────────────────────────────────────────────────────────────────────────

/// Clears the object cache after every page.
pub struct CacheCleaner {
    host: Arc<dyn HostEnvironment>,
}

impl CacheCleaner {
    /// Stable feature name.
    pub const NAME: &'static str = "cache_cleaner";

    /// Creates the feature for `host`.
    #[must_use]
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self { host }
    }
}

impl AfterEachChunk for CacheCleaner {
    fn after_each_chunk(&self) -> HandlerResult {
        clear_object_cache(self.host.as_ref());
        Ok(())
    }
}

impl Feature for CacheCleaner {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn as_after_each_chunk(&self) -> Option<&dyn AfterEachChunk> {
        Some(self)
    }
}

impl fmt::Debug for CacheCleaner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheCleaner").finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CacheSuspender
// ─────────────────────────────────────────────────────────────────────────────

/// Suspends object cache additions for the duration of an iteration.
///
/// Values cached before the run stay readable; nothing new is added until
/// [`OnFinish`] resumes additions.
pub struct CacheSuspender {
    host: Arc<dyn HostEnvironment>,
}

impl CacheSuspender {
    /// Stable feature name.
    pub const NAME: &'static str = "cache_suspender";

    /// Creates the feature for `host`.
    #[must_use]
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self { host }
    }
}

impl OnStart for CacheSuspender {
    fn on_start(&self) -> HandlerResult {
        suspend_cache_addition(self.host.as_ref());
        Ok(())
    }
}

impl OnFinish for CacheSuspender {
    fn on_finish(&self) -> HandlerResult {
        resume_cache_addition(self.host.as_ref());
        Ok(())
    }
}

impl Feature for CacheSuspender {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn as_on_start(&self) -> Option<&dyn OnStart> {
        Some(self)
    }

    fn as_on_finish(&self) -> Option<&dyn OnFinish> {
        Some(self)
    }
}

impl fmt::Debug for CacheSuspender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSuspender").finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Toggles
// ─────────────────────────────────────────────────────────────────────────────

/// Switches an iterator between cache clearing and cache suspension.
///
/// At most one of [`CacheCleaner`] and [`CacheSuspender`] is registered after
/// either call.
///
/// ```
/// use std::sync::Arc;
/// use batchwise_features::{Batcher, CacheSuspender, CacheToggles};
/// use batchwise_host::HostEnvironment;
/// # use batchwise_host::ActionSnapshot;
/// # struct NullHost;
/// # impl HostEnvironment for NullHost {
/// #     fn backup_actions(&self) -> ActionSnapshot { ActionSnapshot::new() }
/// #     fn restore_actions(&self, _snapshot: ActionSnapshot) {}
/// #     fn clear_query_log(&self) {}
/// #     fn reset_object_cache_bookkeeping(&self) {}
/// #     fn flush_object_cache(&self) {}
/// #     fn using_external_object_cache(&self) -> bool { false }
/// #     fn set_cache_addition_suspended(&self, _suspended: bool) {}
/// #     fn filter_callback_ids(&self, _hook: &str, _priority: i32) -> Vec<String> { Vec::new() }
/// #     fn remove_filter_callback(&self, _hook: &str, _priority: i32, _id: &str) -> bool { false }
/// # }
///
/// let host: Arc<dyn HostEnvironment> = Arc::new(NullHost);
/// let mut orders = Batcher::new(host.clone())
///     .callback(|page, _| if page == 1 { vec![7] } else { Vec::new() })?;
/// orders.use_cache_suspending(host)?;
///
/// assert!(orders.hooks().contains_feature(CacheSuspender::NAME));
/// # Ok::<(), batchwise_iter::IterError>(())
/// ```
pub trait CacheToggles {
    /// Replaces [`CacheCleaner`] with [`CacheSuspender`].
    ///
    /// # Errors
    ///
    /// Returns [`IterError::LockedConfiguration`] after iteration has started.
    fn use_cache_suspending(&mut self, host: Arc<dyn HostEnvironment>) -> Result<&mut Self, IterError>;

    /// Replaces [`CacheSuspender`] with [`CacheCleaner`].
    ///
    /// # Errors
    ///
    /// Returns [`IterError::LockedConfiguration`] after iteration has started.
    fn use_cache_clearing(&mut self, host: Arc<dyn HostEnvironment>) -> Result<&mut Self, IterError>;
}

impl<T> CacheToggles for PaginatingIterator<T> {
    fn use_cache_suspending(&mut self, host: Arc<dyn HostEnvironment>) -> Result<&mut Self, IterError> {
        self.remove_feature(CacheCleaner::NAME)?
            .add_feature(Arc::new(CacheSuspender::new(host)))
    }

    fn use_cache_clearing(&mut self, host: Arc<dyn HostEnvironment>) -> Result<&mut Self, IterError> {
        self.remove_feature(CacheSuspender::NAME)?
            .add_feature(Arc::new(CacheCleaner::new(host)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchwise_host::InMemoryHost;

    fn host() -> Arc<InMemoryHost> {
        Arc::new(InMemoryHost::new())
    }

    #[test]
    fn cleaner_empties_cache_after_chunk() {
        let host = host();
        host.cache_add("posts", "1", "hello");
        let cleaner = CacheCleaner::new(host.clone());

        cleaner.after_each_chunk().unwrap();

        assert_eq!(host.cache_len(), 0);
        assert_eq!(host.flush_count(), 1);
    }

    #[test]
    fn suspender_toggles_additions() {
        let host = host();
        let suspender = CacheSuspender::new(host.clone());

        suspender.on_start().unwrap();
        assert!(host.is_cache_addition_suspended());
        assert!(!host.cache_add("posts", "1", "hello"));

        suspender.on_finish().unwrap();
        assert!(!host.is_cache_addition_suspended());
        assert!(host.cache_add("posts", "1", "hello"));
    }

    #[test]
    fn capabilities_are_advertised() {
        let host = host();
        let cleaner = CacheCleaner::new(host.clone());
        let suspender = CacheSuspender::new(host);

        assert!(cleaner.as_after_each_chunk().is_some());
        assert!(cleaner.as_on_start().is_none());
        assert!(suspender.as_on_start().is_some());
        assert!(suspender.as_after_each_chunk().is_none());
        assert!(suspender.as_on_finish().is_some());
    }

    #[test]
    fn toggles_are_mutually_exclusive() {
        let host = host();
        let mut iter = PaginatingIterator::<u32>::new()
            .with_fetcher(|_, _| Vec::new())
            .unwrap();

        iter.use_cache_clearing(host.clone()).unwrap();
        assert!(iter.hooks().contains_feature(CacheCleaner::NAME));

        iter.use_cache_suspending(host.clone()).unwrap();
        assert!(iter.hooks().contains_feature(CacheSuspender::NAME));
        assert!(!iter.hooks().contains_feature(CacheCleaner::NAME));

        let handlers = iter.inspect_state().handlers;
        assert_eq!(handlers.on_start, vec![CacheSuspender::NAME]);
        assert_eq!(handlers.on_finish, vec![CacheSuspender::NAME]);
        assert!(handlers.after_each_chunk.is_empty());

        iter.use_cache_clearing(host).unwrap();
        assert!(iter.hooks().contains_feature(CacheCleaner::NAME));
        assert!(!iter.hooks().contains_feature(CacheSuspender::NAME));
    }

    #[test]
    fn toggles_fail_after_start() {
        let host = host();
        let mut iter = PaginatingIterator::<u32>::new()
            .with_fetcher(|_, _| Vec::new())
            .unwrap();
        iter.start().unwrap();

        assert!(matches!(
            iter.use_cache_suspending(host),
            Err(IterError::LockedConfiguration { .. })
        ));
    }
}
