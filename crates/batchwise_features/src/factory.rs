//! Iterator factory.
//!
//! [`Batcher`] builds paginating iterators that come with the standard
//! memory-reclaiming features already registered, in this order:
//!
//! | Feature | on-start | after-each-chunk | on-finish |
//! |---------|----------|------------------|-----------|
//! | [`CacheCleaner`] | | clear object cache | |
//! | [`LazyloadCycleBreaker`] | | remove lazyload callbacks | |
//! | [`QueryLogCleaner`] | | clear query log | |
//! | [`ActionsRestorer`] | back up counters | restore counters | restore, drop backup |
//!
//! Within an event, handlers run in that registration order.

use std::sync::Arc;

use batchwise_hooks::{BoxError, Feature};
use batchwise_host::HostEnvironment;
use batchwise_iter::{IterError, PaginatingIterator};

use crate::actions::ActionsRestorer;
use crate::cache::CacheCleaner;
use crate::housekeeping::{LazyloadCycleBreaker, QueryLogCleaner};
use crate::query::{QueryArgs, QueryBackend, QueryKind};

/// Factory for iterators bound to one host.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use batchwise_features::{Batcher, QueryArgs, QueryBackend, QueryKind};
/// use batchwise_hooks::BoxError;
/// # use batchwise_host::{ActionSnapshot, HostEnvironment};
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
/// struct Catalog;
///
/// impl QueryBackend<u64> for Catalog {
///     fn query(&self, _kind: QueryKind, args: &QueryArgs) -> Result<Vec<u64>, BoxError> {
///         let page = args.get("paged").and_then(|paged| paged.as_u64()).ok_or("no page")?;
///         Ok(if page <= 2 { vec![page * 10, page * 10 + 1] } else { Vec::new() })
///     }
/// }
///
/// let batcher = Batcher::new(Arc::new(NullHost));
/// let posts = batcher.posts(Catalog, QueryArgs::new().with("post_type", "product"))?;
///
/// let ids: Vec<u64> = posts.into_iter().collect::<Result<_, _>>()?;
/// assert_eq!(ids, vec![10, 11, 20, 21]);
/// # Ok::<(), batchwise_iter::IterError>(())
/// ```
#[derive(Clone)]
pub struct Batcher {
    host: Arc<dyn HostEnvironment>,
}

impl Batcher {
    /// Creates a factory whose features operate on `host`.
    #[must_use]
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self { host }
    }

    /// The host the standard features operate on.
    #[must_use]
    pub fn host(&self) -> &Arc<dyn HostEnvironment> {
        &self.host
    }

    /// The standard feature set, in registration order.
    #[must_use]
    pub fn standard_features(&self) -> Vec<Arc<dyn Feature>> {
        let features: [Arc<dyn Feature>; 4] = [
            Arc::new(CacheCleaner::new(Arc::clone(&self.host))),
            Arc::new(LazyloadCycleBreaker::new(Arc::clone(&self.host))),
            Arc::new(QueryLogCleaner::new(Arc::clone(&self.host))),
            Arc::new(ActionsRestorer::new(Arc::clone(&self.host))),
        ];
        features.into()
    }

    /// Builds an iterator over an infallible fetcher.
    ///
    /// # Errors
    ///
    /// Only fails if a standard feature cannot be registered.
    pub fn callback<T, F>(&self, fetcher: F) -> Result<PaginatingIterator<T>, IterError>
    where
        F: FnMut(usize, usize) -> Vec<T> + 'static,
    {
        self.with_standard_features(PaginatingIterator::new().with_fetcher(fetcher)?)
    }

    /// Builds an iterator over a fallible fetcher.
    ///
    /// # Errors
    ///
    /// Only fails if a standard feature cannot be registered.
    pub fn try_callback<T, F, E>(&self, fetcher: F) -> Result<PaginatingIterator<T>, IterError>
    where
        F: FnMut(usize, usize) -> Result<Vec<T>, E> + 'static,
        E: Into<BoxError>,
    {
        self.with_standard_features(PaginatingIterator::new().with_try_fetcher(fetcher)?)
    }

    /// Iterates posts ordered by `ID` ascending unless `args` say otherwise.
    ///
    /// # Errors
    ///
    /// Only fails if a standard feature cannot be registered.
    pub fn posts<T, B>(&self, backend: B, args: QueryArgs) -> Result<PaginatingIterator<T>, IterError>
    where
        B: QueryBackend<T>,
    {
        self.query(QueryKind::Posts, backend, args)
    }

    /// Iterates users ordered by `ID` ascending unless `args` say otherwise.
    ///
    /// # Errors
    ///
    /// Only fails if a standard feature cannot be registered.
    pub fn users<T, B>(&self, backend: B, args: QueryArgs) -> Result<PaginatingIterator<T>, IterError>
    where
        B: QueryBackend<T>,
    {
        self.query(QueryKind::Users, backend, args)
    }

    /// Iterates terms ordered by `term_id` ascending unless `args` say
    /// otherwise. Pages are requested by offset.
    ///
    /// # Errors
    ///
    /// Only fails if a standard feature cannot be registered.
    pub fn terms<T, B>(&self, backend: B, args: QueryArgs) -> Result<PaginatingIterator<T>, IterError>
    where
        B: QueryBackend<T>,
    {
        self.query(QueryKind::Terms, backend, args)
    }

    /// Iterates comments ordered by `comment_ID` ascending unless `args` say
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Only fails if a standard feature cannot be registered.
    pub fn comments<T, B>(
        &self,
        backend: B,
        args: QueryArgs,
    ) -> Result<PaginatingIterator<T>, IterError>
    where
        B: QueryBackend<T>,
    {
        self.query(QueryKind::Comments, backend, args)
    }

    /// Builds an iterator running `kind` queries against `backend`.
    ///
    /// # Errors
    ///
    /// Only fails if a standard feature cannot be registered.
    pub fn query<T, B>(
        &self,
        kind: QueryKind,
        backend: B,
        args: QueryArgs,
    ) -> Result<PaginatingIterator<T>, IterError>
    where
        B: QueryBackend<T>,
    {
        tracing::debug!(%kind, args = args.len(), "building query iterator");
        self.try_callback(move |page, page_size| {
            backend.query(kind, &kind.build_args(&args, page, page_size))
        })
    }

    fn with_standard_features<T>(
        &self,
        mut iter: PaginatingIterator<T>,
    ) -> Result<PaginatingIterator<T>, IterError> {
        for feature in self.standard_features() {
            iter.add_feature(feature)?;
        }
        Ok(iter)
    }
}

impl core::fmt::Debug for Batcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Batcher").finish_non_exhaustive()
    }
}
