//! Hook registry mapping lifecycle events to features.
//!
//! The [`HookRegistry`] owns the set of registered [`Feature`]s and, for each
//! [`LifecycleEvent`], an ordered map of the features that handle it.
//!
//! # Ordering and Identity
//!
//! - Features are keyed by [`Feature::name`]. Registering a name that is
//!   already present is a no-op: the first registration wins.
//! - Handlers fire in registration order.
//! - A feature implementing several capabilities appears once in each of the
//!   matching event maps, and is removed from all of them by
//!   [`unregister`](HookRegistry::unregister).
//!
//! # Failure
//!
//! [`fire`](HookRegistry::fire) is fail-fast: the first handler returning an
//! error stops the firing and the error is returned as a [`HookError`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use batchwise_hooks::{FnFeature, HookRegistry, LifecycleEvent};
//!
//! let mut hooks = HookRegistry::new();
//! hooks.register(Arc::new(FnFeature::new("tracker").on_start(|| Ok(()))))?;
//!
//! assert_eq!(hooks.handler_count(LifecycleEvent::OnStart), 1);
//! hooks.fire(LifecycleEvent::OnStart)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::event::LifecycleEvent;
use crate::feature::{BoxError, Feature};

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur while registering a feature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The feature implements none of the lifecycle capabilities.
    #[error("feature '{feature}' does not handle any lifecycle event")]
    NoHandledEvents {
        /// Name of the rejected feature.
        feature: String,
    },
}

/// A handler failed while an event was being fired.
#[derive(Debug, thiserror::Error)]
#[error("feature '{feature}' failed during {event}")]
pub struct HookError {
    /// The event being fired.
    pub event: LifecycleEvent,
    /// Name of the feature whose handler failed.
    pub feature: String,
    /// The handler's error.
    #[source]
    pub source: BoxError,
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRegistry
// ─────────────────────────────────────────────────────────────────────────────

type HandlerMap = IndexMap<String, Arc<dyn Feature>>;

/// Registry of features and the per-event handler maps derived from them.
#[derive(Default)]
pub struct HookRegistry {
    /// All registered features, in registration order.
    features: HandlerMap,
    /// One handler map per event, indexed by [`LifecycleEvent::index`].
    handlers: [HandlerMap; 3],
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a feature under every event whose capability it implements.
    ///
    /// Registering a name that is already present leaves the registry
    /// unchanged and returns `Ok(false)`. A newly registered feature returns
    /// `Ok(true)`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::NoHandledEvents`] if the feature
    /// implements none of the three capabilities.
    pub fn register(&mut self, feature: Arc<dyn Feature>) -> Result<bool, RegistrationError> {
        let name = feature.name().to_owned();

        if self.features.contains_key(&name) {
            tracing::trace!(feature = %name, "feature already registered");
            return Ok(false);
        }

        let events: Vec<LifecycleEvent> = LifecycleEvent::ALL
            .into_iter()
            .filter(|event| feature.handles(*event))
            .collect();

        if events.is_empty() {
            return Err(RegistrationError::NoHandledEvents { feature: name });
        }

        for event in &events {
            self.handlers[event.index()].insert(name.clone(), Arc::clone(&feature));
        }

        tracing::debug!(feature = %name, events = ?events, "feature registered");
        self.features.insert(name, feature);
        Ok(true)
    }

    /// Removes a feature from the registry and from every handler map.
    ///
    /// Returns whether a feature with that name was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        if self.features.shift_remove(name).is_none() {
            return false;
        }

        for handlers in &mut self.handlers {
            handlers.shift_remove(name);
        }

        tracing::debug!(feature = %name, "feature unregistered");
        true
    }

    /// Invokes every handler registered for `event`, in registration order.
    ///
    /// Returns the number of handlers invoked.
    ///
    /// # Errors
    ///
    /// Stops at the first failing handler and returns its error wrapped in a
    /// [`HookError`]. Handlers after it do not run.
    pub fn fire(&self, event: LifecycleEvent) -> Result<usize, HookError> {
        let handlers = &self.handlers[event.index()];

        if handlers.is_empty() {
            return Ok(0);
        }

        tracing::debug!(%event, handlers = handlers.len(), "firing lifecycle event");

        for (name, feature) in handlers {
            tracing::trace!(%event, feature = %name, "invoking handler");

            if let Err(source) = feature.handle(event) {
                tracing::warn!(%event, feature = %name, error = %source, "handler failed");
                return Err(HookError {
                    event,
                    feature: name.clone(),
                    source,
                });
            }
        }

        Ok(handlers.len())
    }

    /// Returns the number of handlers registered for `event`.
    #[must_use]
    pub fn handler_count(&self, event: LifecycleEvent) -> usize {
        self.handlers[event.index()].len()
    }

    /// Returns the names of the handlers for `event`, in firing order.
    #[must_use]
    pub fn handler_names(&self, event: LifecycleEvent) -> Vec<String> {
        self.handlers[event.index()].keys().cloned().collect()
    }

    /// Returns the names of all registered features, in registration order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.features.keys().cloned().collect()
    }

    /// Checks whether a feature with the given name is registered.
    #[must_use]
    pub fn contains_feature(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    /// Returns the number of registered features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if no feature is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        map.entry(&"features", &self.feature_names());
        for event in LifecycleEvent::ALL {
            map.entry(&event.name(), &self.handler_names(event));
        }
        map.finish()
    }
}
