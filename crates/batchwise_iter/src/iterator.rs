//! The paginating iterator.
//!
//! [`PaginatingIterator`] walks a paged data source one item at a time,
//! fetching the next page only when the current one is used up. Registered
//! features run at three points: before the first fetch, at every page
//! boundary, and when iteration terminates.
//!
//! # Protocol
//!
//! ```text
//! start() ──► on_start ──► advance()
//!                             │
//!            ┌────────────────┴─────────────────┐
//!            │ chunk exhausted?                 │
//!            │   page_number += 1               │
//!            │   after_each_chunk (not page 1)  │
//!            │   fetch(page_number, page_size)  │
//!            └────────────────┬─────────────────┘
//!                             │ empty page or limit reached
//!                             ▼
//!              after_each_chunk ──► on_finish ──► finished
//! ```
//!
//! The iterator is single-use. Once `start()` has run, every configuration
//! method and a second `start()` fail with [`IterError::LockedConfiguration`].
//!
//! # Example
//!
//! ```
//! use batchwise_iter::PaginatingIterator;
//!
//! let mut iter = PaginatingIterator::new()
//!     .with_fetcher(|page, size| {
//!         let start = (page - 1) * size + 1;
//!         (start..start + size).collect::<Vec<usize>>()
//!     })?
//!     .with_page_size(3)?
//!     .with_limit(10)?;
//!
//! iter.start()?;
//! let mut seen = Vec::new();
//! while let Some(item) = iter.peek_current() {
//!     seen.push(*item);
//!     iter.advance()?;
//! }
//!
//! assert_eq!(seen, (1..=10).collect::<Vec<_>>());
//! assert_eq!(iter.position_key(), 10);
//! # Ok::<(), batchwise_iter::IterError>(())
//! ```

use core::fmt;
use std::sync::Arc;

use batchwise_hooks::{BoxError, Feature, HookRegistry, LifecycleEvent};

use crate::config::{DEFAULT_PAGE_SIZE, IteratorConfig};
use crate::error::IterError;
use crate::state::{HandlerNames, IteratorState};

type BoxedFetcher<T> = Box<dyn FnMut(usize, usize) -> Result<Vec<T>, BoxError>>;

/// A lazily paginating, single-use sequence.
///
/// See the [module documentation](self) for the iteration protocol.
pub struct PaginatingIterator<T> {
    fetcher: Option<BoxedFetcher<T>>,
    chunk: Vec<T>,
    chunk_position: usize,
    total_position: usize,
    page_number: usize,
    page_size: usize,
    limit: usize,
    started: bool,
    finished: bool,
    locked: bool,
    hooks: HookRegistry,
}

impl<T> Default for PaginatingIterator<T> {
    fn default() -> Self {
        Self {
            fetcher: None,
            chunk: Vec::new(),
            chunk_position: 0,
            total_position: 0,
            page_number: 0,
            page_size: DEFAULT_PAGE_SIZE,
            limit: 0,
            started: false,
            finished: false,
            locked: false,
            hooks: HookRegistry::new(),
        }
    }
}

impl<T> PaginatingIterator<T> {
    /// Creates an unconfigured iterator with the default page size and no limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────────

    fn ensure_unlocked(&self, operation: &'static str) -> Result<(), IterError> {
        if self.locked {
            return Err(IterError::LockedConfiguration { operation });
        }
        Ok(())
    }

    /// Sets an infallible fetcher.
    ///
    /// The fetcher receives `(page_number, page_size)` with `page_number`
    /// starting at 1, and returns an empty page once the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`IterError::LockedConfiguration`] after iteration has started.
    pub fn set_fetcher<F>(&mut self, mut fetcher: F) -> Result<&mut Self, IterError>
    where
        F: FnMut(usize, usize) -> Vec<T> + 'static,
    {
        self.ensure_unlocked("set fetcher")?;
        let boxed: BoxedFetcher<T> = Box::new(move |page, size| -> Result<Vec<T>, BoxError> {
            Ok(fetcher(page, size))
        });
        self.fetcher = Some(boxed);
        Ok(self)
    }

    /// Sets a fetcher that may fail. A failure aborts the current advance and
    /// surfaces as [`IterError::Fetch`].
    ///
    /// # Errors
    ///
    /// Returns [`IterError::LockedConfiguration`] after iteration has started.
    pub fn set_try_fetcher<F, E>(&mut self, mut fetcher: F) -> Result<&mut Self, IterError>
    where
        F: FnMut(usize, usize) -> Result<Vec<T>, E> + 'static,
        E: Into<BoxError>,
    {
        self.ensure_unlocked("set fetcher")?;
        let boxed: BoxedFetcher<T> = Box::new(move |page, size| -> Result<Vec<T>, BoxError> {
            fetcher(page, size).map_err(Into::into)
        });
        self.fetcher = Some(boxed);
        Ok(self)
    }

    /// Sets the number of items requested per fetch.
    ///
    /// # Errors
    ///
    /// Returns [`IterError::LockedConfiguration`] after iteration has started,
    /// or [`IterError::InvalidPageSize`] for zero.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<&mut Self, IterError> {
        self.ensure_unlocked("set page size")?;
        if page_size == 0 {
            return Err(IterError::InvalidPageSize);
        }
        self.page_size = page_size;
        Ok(self)
    }

    /// Caps the number of items yielded. `0` removes the cap.
    ///
    /// # Errors
    ///
    /// Returns [`IterError::LockedConfiguration`] after iteration has started.
    pub fn set_limit(&mut self, limit: usize) -> Result<&mut Self, IterError> {
        self.ensure_unlocked("set limit")?;
        self.limit = limit;
        Ok(self)
    }

    /// Applies page size and limit from `config`.
    ///
    /// # Errors
    ///
    /// See [`set_page_size`](Self::set_page_size) and [`set_limit`](Self::set_limit).
    pub fn configure(&mut self, config: &IteratorConfig) -> Result<&mut Self, IterError> {
        self.set_page_size(config.page_size)?;
        self.set_limit(config.limit)
    }

    /// Registers a feature. A feature whose name is already registered is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`IterError::LockedConfiguration`] after iteration has started,
    /// or [`IterError::Registration`] if the feature handles no event.
    pub fn add_feature(&mut self, feature: Arc<dyn Feature>) -> Result<&mut Self, IterError> {
        self.ensure_unlocked("add feature")?;
        self.hooks.register(feature)?;
        Ok(self)
    }

    /// Removes a feature by name. Unknown names are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`IterError::LockedConfiguration`] after iteration has started.
    pub fn remove_feature(&mut self, name: &str) -> Result<&mut Self, IterError> {
        self.ensure_unlocked("remove feature")?;
        self.hooks.unregister(name);
        Ok(self)
    }

    /// Builder form of [`set_fetcher`](Self::set_fetcher).
    ///
    /// # Errors
    ///
    /// See [`set_fetcher`](Self::set_fetcher).
    pub fn with_fetcher<F>(mut self, fetcher: F) -> Result<Self, IterError>
    where
        F: FnMut(usize, usize) -> Vec<T> + 'static,
    {
        self.set_fetcher(fetcher)?;
        Ok(self)
    }

    /// Builder form of [`set_try_fetcher`](Self::set_try_fetcher).
    ///
    /// # Errors
    ///
    /// See [`set_try_fetcher`](Self::set_try_fetcher).
    pub fn with_try_fetcher<F, E>(mut self, fetcher: F) -> Result<Self, IterError>
    where
        F: FnMut(usize, usize) -> Result<Vec<T>, E> + 'static,
        E: Into<BoxError>,
    {
        self.set_try_fetcher(fetcher)?;
        Ok(self)
    }

    /// Builder form of [`set_page_size`](Self::set_page_size).
    ///
    /// # Errors
    ///
    /// See [`set_page_size`](Self::set_page_size).
    pub fn with_page_size(mut self, page_size: usize) -> Result<Self, IterError> {
        self.set_page_size(page_size)?;
        Ok(self)
    }

    /// Builder form of [`set_limit`](Self::set_limit).
    ///
    /// # Errors
    ///
    /// See [`set_limit`](Self::set_limit).
    pub fn with_limit(mut self, limit: usize) -> Result<Self, IterError> {
        self.set_limit(limit)?;
        Ok(self)
    }

    /// Builder form of [`configure`](Self::configure).
    ///
    /// # Errors
    ///
    /// See [`configure`](Self::configure).
    pub fn with_config(mut self, config: &IteratorConfig) -> Result<Self, IterError> {
        self.configure(config)?;
        Ok(self)
    }

    /// Builder form of [`add_feature`](Self::add_feature).
    ///
    /// # Errors
    ///
    /// See [`add_feature`](Self::add_feature).
    pub fn with_feature(mut self, feature: Arc<dyn Feature>) -> Result<Self, IterError> {
        self.add_feature(feature)?;
        Ok(self)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sequence protocol
    // ─────────────────────────────────────────────────────────────────────────

    /// Locks the configuration, fires on-start and positions the iterator on
    /// the first item.
    ///
    /// # Errors
    ///
    /// Returns [`IterError::LockedConfiguration`] when called a second time;
    /// otherwise any error from [`advance`](Self::advance) or an on-start
    /// handler.
    pub fn start(&mut self) -> Result<(), IterError> {
        if self.locked {
            return Err(IterError::LockedConfiguration { operation: "start" });
        }
        self.locked = true;

        tracing::debug!(
            page_size = self.page_size,
            limit = self.limit,
            features = self.hooks.len(),
            "starting iteration"
        );

        self.hooks.fire(LifecycleEvent::OnStart)?;
        self.advance()
    }

    /// Moves to the next item, fetching a new page when the current one is
    /// used up. Does nothing once the iterator has finished.
    ///
    /// # Errors
    ///
    /// - [`IterError::NotStarted`] before [`start`](Self::start)
    /// - [`IterError::MissingFetcher`] if a page is needed and no fetcher is set
    /// - [`IterError::Fetch`] if the fetcher fails
    /// - [`IterError::Hook`] if a lifecycle handler fails
    ///
    /// A failure at a page boundary leaves the page transition pending: the
    /// next call repeats the after-each-chunk handlers and the fetch for the
    /// same page without moving the position again.
    pub fn advance(&mut self) -> Result<(), IterError> {
        if !self.locked {
            return Err(IterError::NotStarted);
        }
        if self.finished {
            return Ok(());
        }

        let retrying = self.started && !self.has_item_at_position();
        if retrying {
            tracing::debug!(page = self.page_number, "retrying page transition");
        } else if self.started {
            self.chunk_position += 1;
            self.total_position += 1;
        } else {
            self.started = true;
        }

        if self.limit_reached() {
            tracing::debug!(limit = self.limit, "item limit reached");
            return self.finish();
        }

        if !self.has_item_at_position() {
            if !retrying {
                self.page_number += 1;
            }

            // The previous chunk is still alive here; this is the point where
            // memory can be reclaimed before it is replaced.
            if self.total_position >= 1 {
                self.hooks.fire(LifecycleEvent::AfterEachChunk)?;
            }

            self.chunk = self.fetch_chunk()?;
            self.chunk_position = 0;
        }

        if !self.has_item_at_position() {
            return self.finish();
        }

        Ok(())
    }

    /// Returns `true` while there is a current item.
    ///
    /// This is `false` before [`start`](Self::start), after exhaustion, and
    /// while a failed page transition is pending.
    #[must_use]
    pub fn has_current(&self) -> bool {
        self.peek_current().is_some()
    }

    /// Returns the current item, or `None` before start and after exhaustion.
    #[must_use]
    pub fn peek_current(&self) -> Option<&T> {
        if self.started && !self.finished {
            self.chunk.get(self.chunk_position)
        } else {
            None
        }
    }

    /// Zero-based position of the current item. After exhaustion this is the
    /// number of items yielded.
    #[must_use]
    pub fn position_key(&self) -> usize {
        self.total_position
    }

    /// Whether configuration is locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whether iteration has terminated.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Read access to the registered features.
    #[must_use]
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn has_item_at_position(&self) -> bool {
        self.chunk_position < self.chunk.len()
    }

    fn limit_reached(&self) -> bool {
        self.limit > 0 && self.total_position >= self.limit
    }

    fn fetch_chunk(&mut self) -> Result<Vec<T>, IterError> {
        let page = self.page_number;
        let page_size = self.page_size;
        let fetcher = self.fetcher.as_mut().ok_or(IterError::MissingFetcher)?;

        tracing::debug!(page, page_size, "fetching page");
        let chunk = fetcher(page, page_size).map_err(|source| IterError::Fetch { page, source })?;
        tracing::trace!(page, items = chunk.len(), "page fetched");

        Ok(chunk)
    }

    fn finish(&mut self) -> Result<(), IterError> {
        self.finished = true;

        tracing::info!(
            items = self.total_position,
            pages = self.page_number,
            "iteration finished"
        );

        self.hooks.fire(LifecycleEvent::AfterEachChunk)?;
        self.hooks.fire(LifecycleEvent::OnFinish)?;
        Ok(())
    }
}

impl<T: Clone> PaginatingIterator<T> {
    /// Returns a snapshot of every field, for diagnostics and tests.
    ///
    /// Unlike iterating, this exposes positions, flags and the registered
    /// features without advancing anything.
    #[must_use]
    pub fn inspect_state(&self) -> IteratorState<T> {
        IteratorState {
            chunk: self.chunk.clone(),
            chunk_position: self.chunk_position,
            total_position: self.total_position,
            started: self.started,
            finished: self.finished,
            page_number: self.page_number,
            page_size: self.page_size,
            limit: self.limit,
            locked: self.locked,
            features: self.hooks.feature_names(),
            handlers: HandlerNames {
                on_start: self.hooks.handler_names(LifecycleEvent::OnStart),
                after_each_chunk: self.hooks.handler_names(LifecycleEvent::AfterEachChunk),
                on_finish: self.hooks.handler_names(LifecycleEvent::OnFinish),
            },
        }
    }
}

impl<T> fmt::Debug for PaginatingIterator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatingIterator")
            .field("has_fetcher", &self.fetcher.is_some())
            .field("chunk_len", &self.chunk.len())
            .field("chunk_position", &self.chunk_position)
            .field("total_position", &self.total_position)
            .field("page_number", &self.page_number)
            .field("page_size", &self.page_size)
            .field("limit", &self.limit)
            .field("started", &self.started)
            .field("finished", &self.finished)
            .field("locked", &self.locked)
            .field("hooks", &self.hooks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchwise_hooks::FnFeature;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn paged_range(page: usize, size: usize) -> Vec<usize> {
        let start = size * (page - 1) + 1;
        (start..start + size).collect()
    }

    #[test]
    fn fresh_state_matches_defaults() {
        let iter = PaginatingIterator::<usize>::new()
            .with_fetcher(paged_range)
            .unwrap()
            .with_page_size(3)
            .unwrap()
            .with_limit(10)
            .unwrap();

        let state = iter.inspect_state();

        assert_eq!(
            state,
            IteratorState {
                chunk: Vec::new(),
                chunk_position: 0,
                total_position: 0,
                started: false,
                finished: false,
                page_number: 0,
                page_size: 3,
                limit: 10,
                locked: false,
                features: Vec::new(),
                handlers: HandlerNames::default(),
            }
        );
    }

    #[test]
    fn start_positions_on_first_item() {
        let mut iter = PaginatingIterator::new().with_fetcher(paged_range).unwrap();
        iter.set_page_size(4).unwrap();

        iter.start().unwrap();

        assert!(iter.has_current());
        assert_eq!(iter.peek_current(), Some(&1));
        assert_eq!(iter.position_key(), 0);
        let state = iter.inspect_state();
        assert_eq!(state.page_number, 1);
        assert_eq!(state.chunk, vec![1, 2, 3, 4]);
        assert!(state.locked);
        assert!(state.started);
    }

    #[test]
    fn second_start_is_rejected() {
        let mut iter = PaginatingIterator::new().with_fetcher(paged_range).unwrap();
        iter.start().unwrap();

        let err = iter.start().unwrap_err();
        assert!(matches!(
            err,
            IterError::LockedConfiguration { operation: "start" }
        ));
    }

    #[test]
    fn advance_before_start_is_rejected() {
        let mut iter = PaginatingIterator::new().with_fetcher(paged_range).unwrap();
        assert!(matches!(iter.advance(), Err(IterError::NotStarted)));
        assert!(!iter.is_locked());
    }

    #[test]
    fn missing_fetcher_fails_on_start() {
        let mut iter = PaginatingIterator::<u8>::new();
        assert!(matches!(iter.start(), Err(IterError::MissingFetcher)));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut iter = PaginatingIterator::<u8>::new();
        assert!(matches!(
            iter.set_page_size(0),
            Err(IterError::InvalidPageSize)
        ));
        assert_eq!(iter.inspect_state().page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn empty_source_finishes_immediately() {
        let finishes = Arc::new(AtomicUsize::new(0));
        let finishes_clone = Arc::clone(&finishes);

        let mut iter = PaginatingIterator::<u8>::new()
            .with_fetcher(|_, _| Vec::new())
            .unwrap()
            .with_feature(Arc::new(FnFeature::new("finish").on_finish(move || {
                finishes_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })))
            .unwrap();

        iter.start().unwrap();

        assert!(!iter.has_current());
        assert_eq!(iter.peek_current(), None);
        assert_eq!(iter.position_key(), 0);
        assert_eq!(finishes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn advance_after_finish_is_noop() {
        let mut iter = PaginatingIterator::<u8>::new()
            .with_fetcher(|_, _| Vec::new())
            .unwrap();
        iter.start().unwrap();

        iter.advance().unwrap();
        iter.advance().unwrap();

        assert_eq!(iter.position_key(), 0);
        assert_eq!(iter.inspect_state().page_number, 1);
    }

    #[test]
    fn short_page_is_data_not_exhaustion() {
        let mut iter = PaginatingIterator::new().with_fetcher(|page, _| match page {
            1 => vec!["a", "b"],
            2 => vec!["c"],
            _ => Vec::new(),
        })
        .unwrap();
        iter.set_page_size(2).unwrap();

        iter.start().unwrap();
        let mut seen = Vec::new();
        while let Some(item) = iter.peek_current() {
            seen.push(*item);
            iter.advance().unwrap();
        }

        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(iter.inspect_state().page_number, 3);
    }

    #[test]
    fn fetch_error_carries_page_number() {
        let mut iter = PaginatingIterator::<u8>::new().with_try_fetcher(|page, _| {
            if page == 2 {
                Err("connection reset")
            } else {
                Ok(vec![1])
            }
        })
        .unwrap();
        iter.set_page_size(1).unwrap();
        iter.start().unwrap();

        let err = iter.advance().unwrap_err();

        match err {
            IterError::Fetch { page, source } => {
                assert_eq!(page, 2);
                assert_eq!(source.to_string(), "connection reset");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn fetcher_builder_is_rejected_after_start() {
        let mut iter = PaginatingIterator::new().with_fetcher(paged_range).unwrap();
        iter.start().unwrap();

        let err = iter.with_fetcher(|_, _| vec![999]).unwrap_err();
        assert!(matches!(
            err,
            IterError::LockedConfiguration {
                operation: "set fetcher"
            }
        ));
    }

    #[test]
    fn try_fetcher_builder_is_rejected_after_start() {
        let mut iter = PaginatingIterator::new().with_fetcher(paged_range).unwrap();
        iter.start().unwrap();

        let result = iter.with_try_fetcher(|_, _| Ok::<_, BoxError>(vec![999]));
        assert!(matches!(
            result,
            Err(IterError::LockedConfiguration { .. })
        ));
    }

    #[test]
    fn failed_chunk_hook_leaves_transition_pending() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let mut iter = PaginatingIterator::new()
            .with_fetcher(paged_range)
            .unwrap()
            .with_page_size(2)
            .unwrap()
            .with_limit(6)
            .unwrap()
            .with_feature(Arc::new(FnFeature::new("flaky").after_each_chunk(move || {
                if calls_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("disk full".into())
                } else {
                    Ok(())
                }
            })))
            .unwrap();

        iter.start().unwrap();
        iter.advance().unwrap();
        assert_eq!(iter.peek_current(), Some(&2));

        assert!(matches!(iter.advance(), Err(IterError::Hook(_))));
        assert!(!iter.has_current());
        assert_eq!(iter.peek_current(), None);
        assert_eq!(iter.position_key(), 2);
        assert_eq!(iter.inspect_state().page_number, 2);

        iter.advance().unwrap();
        assert_eq!(iter.peek_current(), Some(&3));
        assert_eq!(iter.position_key(), 2);
        assert_eq!(iter.inspect_state().page_number, 2);

        let mut rest = vec![3];
        iter.advance().unwrap();
        while let Some(item) = iter.peek_current() {
            rest.push(*item);
            iter.advance().unwrap();
        }
        assert_eq!(rest, vec![3, 4, 5, 6]);
        assert_eq!(iter.position_key(), 6);
    }

    #[test]
    fn failed_fetch_is_retried_for_the_same_page() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let mut iter = PaginatingIterator::<usize>::new()
            .with_try_fetcher(move |page, size| {
                if page == 2 && attempts_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err("timeout");
                }
                Ok(if page <= 2 { paged_range(page, size) } else { Vec::new() })
            })
            .unwrap()
            .with_page_size(1)
            .unwrap();

        iter.start().unwrap();
        assert!(matches!(
            iter.advance(),
            Err(IterError::Fetch { page: 2, .. })
        ));
        assert!(!iter.has_current());

        iter.advance().unwrap();
        assert_eq!(iter.peek_current(), Some(&2));
        assert_eq!(iter.position_key(), 1);
    }

    #[test]
    fn features_cannot_change_after_start() {
        let mut iter = PaginatingIterator::new().with_fetcher(paged_range).unwrap();
        iter.start().unwrap();

        let add = iter.add_feature(Arc::new(FnFeature::new("late").on_start(|| Ok(()))));
        assert!(matches!(
            add,
            Err(IterError::LockedConfiguration { .. })
        ));
        assert!(matches!(
            iter.remove_feature("late"),
            Err(IterError::LockedConfiguration { .. })
        ));
    }
}
