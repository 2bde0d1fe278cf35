//! Diagnostic snapshots of iterator state.

use serde::Serialize;

/// Names of the features registered for each lifecycle event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HandlerNames {
    /// Features handling [`LifecycleEvent::OnStart`](batchwise_hooks::LifecycleEvent::OnStart).
    pub on_start: Vec<String>,
    /// Features handling [`LifecycleEvent::AfterEachChunk`](batchwise_hooks::LifecycleEvent::AfterEachChunk).
    pub after_each_chunk: Vec<String>,
    /// Features handling [`LifecycleEvent::OnFinish`](batchwise_hooks::LifecycleEvent::OnFinish).
    pub on_finish: Vec<String>,
}

/// A copy of every field of a [`PaginatingIterator`](crate::PaginatingIterator).
///
/// Produced by [`inspect_state`](crate::PaginatingIterator::inspect_state).
/// Field names are stable and serialize as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IteratorState<T> {
    /// The current chunk.
    pub chunk: Vec<T>,
    /// Index of the current item within `chunk`.
    pub chunk_position: usize,
    /// Number of items yielded before the current one.
    pub total_position: usize,
    /// Whether the first advance has happened.
    pub started: bool,
    /// Whether iteration has terminated.
    pub finished: bool,
    /// Number of pages fetched.
    pub page_number: usize,
    /// Items requested per fetch.
    pub page_size: usize,
    /// Item limit, `0` when unlimited.
    pub limit: usize,
    /// Whether configuration is locked.
    pub locked: bool,
    /// Registered feature names, in registration order.
    pub features: Vec<String>,
    /// Handler names per event.
    pub handlers: HandlerNames,
}
