//! Features: named bundles of lifecycle handlers.
//!
//! A [`Feature`] implements any subset of the three capability traits
//! [`OnStart`], [`AfterEachChunk`] and [`OnFinish`], and advertises which ones
//! through the `as_*` accessors. The registry only ever asks a feature for its
//! capabilities; it never looks at the concrete type.
//!
//! # Example
//!
//! ```
//! use batchwise_hooks::{AfterEachChunk, Feature, HandlerResult};
//!
//! struct Flush;
//!
//! impl AfterEachChunk for Flush {
//!     fn after_each_chunk(&self) -> HandlerResult {
//!         // drop caches here
//!         Ok(())
//!     }
//! }
//!
//! impl Feature for Flush {
//!     fn name(&self) -> &str {
//!         "flush"
//!     }
//!
//!     fn as_after_each_chunk(&self) -> Option<&dyn AfterEachChunk> {
//!         Some(self)
//!     }
//! }
//! ```

use crate::event::LifecycleEvent;

/// Boxed error type returned by handlers and fetchers.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Result of running a single handler.
pub type HandlerResult = Result<(), BoxError>;

// ─────────────────────────────────────────────────────────────────────────────
// Capability Traits
// ─────────────────────────────────────────────────────────────────────────────

/// Capability: run once before the first page is fetched.
pub trait OnStart {
    /// Handles [`LifecycleEvent::OnStart`].
    fn on_start(&self) -> HandlerResult;
}

/// Capability: run at every page boundary and once at termination.
pub trait AfterEachChunk {
    /// Handles [`LifecycleEvent::AfterEachChunk`].
    fn after_each_chunk(&self) -> HandlerResult;
}

/// Capability: run once when the iteration reaches its terminal state.
pub trait OnFinish {
    /// Handles [`LifecycleEvent::OnFinish`].
    fn on_finish(&self) -> HandlerResult;
}

// ─────────────────────────────────────────────────────────────────────────────
// Feature
// ─────────────────────────────────────────────────────────────────────────────

/// A named bundle of lifecycle handlers, registered and removed as a unit.
///
/// The name is the de-duplication key inside a registry, so two instances
/// sharing a name are treated as the same feature.
pub trait Feature: Send + Sync + 'static {
    /// Stable name of the feature.
    fn name(&self) -> &str;

    /// Returns the on-start capability, if implemented.
    fn as_on_start(&self) -> Option<&dyn OnStart> {
        None
    }

    /// Returns the after-each-chunk capability, if implemented.
    fn as_after_each_chunk(&self) -> Option<&dyn AfterEachChunk> {
        None
    }

    /// Returns the on-finish capability, if implemented.
    fn as_on_finish(&self) -> Option<&dyn OnFinish> {
        None
    }

    /// Whether this feature implements the capability for `event`.
    fn handles(&self, event: LifecycleEvent) -> bool {
        match event {
            LifecycleEvent::OnStart => self.as_on_start().is_some(),
            LifecycleEvent::AfterEachChunk => self.as_after_each_chunk().is_some(),
            LifecycleEvent::OnFinish => self.as_on_finish().is_some(),
        }
    }

    /// Dispatches `event` to the matching capability. Events the feature does
    /// not handle are ignored.
    fn handle(&self, event: LifecycleEvent) -> HandlerResult {
        match event {
            LifecycleEvent::OnStart => match self.as_on_start() {
                Some(handler) => handler.on_start(),
                None => Ok(()),
            },
            LifecycleEvent::AfterEachChunk => match self.as_after_each_chunk() {
                Some(handler) => handler.after_each_chunk(),
                None => Ok(()),
            },
            LifecycleEvent::OnFinish => match self.as_on_finish() {
                Some(handler) => handler.on_finish(),
                None => Ok(()),
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FnFeature
// ─────────────────────────────────────────────────────────────────────────────

type BoxedHandler = Box<dyn Fn() -> HandlerResult + Send + Sync>;

/// A feature assembled from closures.
///
/// Each closure supplied becomes one capability; capabilities left unset are
/// not advertised.
///
/// ```
/// use batchwise_hooks::{Feature, FnFeature, LifecycleEvent};
///
/// let feature = FnFeature::new("logger")
///     .on_start(|| Ok(()))
///     .on_finish(|| Ok(()));
///
/// assert!(feature.handles(LifecycleEvent::OnStart));
/// assert!(!feature.handles(LifecycleEvent::AfterEachChunk));
/// ```
pub struct FnFeature {
    name: String,
    on_start: Option<BoxedHandler>,
    after_each_chunk: Option<BoxedHandler>,
    on_finish: Option<BoxedHandler>,
}

impl FnFeature {
    /// Creates a feature with the given name and no capabilities.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_start: None,
            after_each_chunk: None,
            on_finish: None,
        }
    }

    /// Sets the on-start handler.
    #[must_use]
    pub fn on_start(mut self, handler: impl Fn() -> HandlerResult + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(handler));
        self
    }

    /// Sets the after-each-chunk handler.
    #[must_use]
    pub fn after_each_chunk(
        mut self,
        handler: impl Fn() -> HandlerResult + Send + Sync + 'static,
    ) -> Self {
        self.after_each_chunk = Some(Box::new(handler));
        self
    }

    /// Sets the on-finish handler.
    #[must_use]
    pub fn on_finish(
        mut self,
        handler: impl Fn() -> HandlerResult + Send + Sync + 'static,
    ) -> Self {
        self.on_finish = Some(Box::new(handler));
        self
    }
}

impl core::fmt::Debug for FnFeature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnFeature")
            .field("name", &self.name)
            .field("on_start", &self.on_start.is_some())
            .field("after_each_chunk", &self.after_each_chunk.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

impl OnStart for FnFeature {
    fn on_start(&self) -> HandlerResult {
        self.on_start.as_ref().map_or(Ok(()), |handler| handler())
    }
}

impl AfterEachChunk for FnFeature {
    fn after_each_chunk(&self) -> HandlerResult {
        self.after_each_chunk.as_ref().map_or(Ok(()), |handler| handler())
    }
}

impl OnFinish for FnFeature {
    fn on_finish(&self) -> HandlerResult {
        self.on_finish.as_ref().map_or(Ok(()), |handler| handler())
    }
}

impl Feature for FnFeature {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_on_start(&self) -> Option<&dyn OnStart> {
        self.on_start.as_ref().map(|_| self as &dyn OnStart)
    }

    fn as_after_each_chunk(&self) -> Option<&dyn AfterEachChunk> {
        self.after_each_chunk
            .as_ref()
            .map(|_| self as &dyn AfterEachChunk)
    }

    fn as_on_finish(&self) -> Option<&dyn OnFinish> {
        self.on_finish.as_ref().map(|_| self as &dyn OnFinish)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Silent;

    impl Feature for Silent {
        fn name(&self) -> &str {
            "silent"
        }
    }

    #[test]
    fn default_feature_handles_nothing() {
        for event in LifecycleEvent::ALL {
            assert!(!Silent.handles(event));
            assert!(Silent.handle(event).is_ok());
        }
    }

    #[test]
    fn fn_feature_advertises_only_set_handlers() {
        let feature = FnFeature::new("partial").after_each_chunk(|| Ok(()));

        assert!(!feature.handles(LifecycleEvent::OnStart));
        assert!(feature.handles(LifecycleEvent::AfterEachChunk));
        assert!(!feature.handles(LifecycleEvent::OnFinish));
    }

    #[test]
    fn handle_dispatches_to_matching_closure() {
        let starts = Arc::new(AtomicUsize::new(0));
        let finishes = Arc::new(AtomicUsize::new(0));
        let starts_clone = Arc::clone(&starts);
        let finishes_clone = Arc::clone(&finishes);

        let feature = FnFeature::new("counter")
            .on_start(move || {
                starts_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .on_finish(move || {
                finishes_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        feature.handle(LifecycleEvent::OnStart).unwrap();
        feature.handle(LifecycleEvent::AfterEachChunk).unwrap();
        feature.handle(LifecycleEvent::OnStart).unwrap();

        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert_eq!(finishes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handler_error_is_returned() {
        let feature = FnFeature::new("broken").on_finish(|| Err("boom".into()));

        let err = feature.handle(LifecycleEvent::OnFinish).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
