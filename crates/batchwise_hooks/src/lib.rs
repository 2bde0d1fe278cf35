//! Lifecycle hooks for paginating iterators.
//!
//! This crate provides the hook system that lets features run maintenance work
//! at fixed points of a batched iteration.
//!
//! # Architecture
//!
//! - **Events** ([`event`]): the three [`LifecycleEvent`]s
//! - **Features** ([`feature`]): capability traits and the [`Feature`] bundle
//! - **Registry** ([`registry`]): registration and fail-fast invocation
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use batchwise_hooks::{FnFeature, HookRegistry, LifecycleEvent};
//!
//! let mut hooks = HookRegistry::new();
//! hooks.register(Arc::new(
//!     FnFeature::new("tracker")
//!         .on_start(|| Ok(()))
//!         .on_finish(|| Ok(())),
//! ))?;
//!
//! assert_eq!(hooks.handler_names(LifecycleEvent::OnFinish), vec!["tracker"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod event;
pub mod feature;
pub mod registry;

pub use event::LifecycleEvent;
pub use feature::{AfterEachChunk, BoxError, Feature, FnFeature, HandlerResult, OnFinish, OnStart};
pub use registry::{HookError, HookRegistry, RegistrationError};
