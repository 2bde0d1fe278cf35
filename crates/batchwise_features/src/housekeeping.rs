//! Per-page housekeeping features.

use core::fmt;
use std::sync::Arc;

use batchwise_hooks::{AfterEachChunk, Feature, HandlerResult};
use batchwise_host::{HostEnvironment, break_lazyload_cycles, clear_query_log};

/// Empties the host's query log after every page.
pub struct QueryLogCleaner {
    host: Arc<dyn HostEnvironment>,
}

impl QueryLogCleaner {
    /// Stable feature name.
    pub const NAME: &'static str = "query_log_cleaner";

    /// Creates the feature for `host`.
    #[must_use]
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self { host }
    }
}

impl AfterEachChunk for QueryLogCleaner {
    fn after_each_chunk(&self) -> HandlerResult {
        clear_query_log(self.host.as_ref());
        Ok(())
    }
}

impl Feature for QueryLogCleaner {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn as_after_each_chunk(&self) -> Option<&dyn AfterEachChunk> {
        Some(self)
    }
}

impl fmt::Debug for QueryLogCleaner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryLogCleaner").finish_non_exhaustive()
    }
}

/// Removes lazy-load term metadata callbacks after every page.
///
/// Post queries register a fresh lazy-loading callback per query, each holding
/// a reference to the query's results. Left in place they keep every page
/// alive until the run ends.
pub struct LazyloadCycleBreaker {
    host: Arc<dyn HostEnvironment>,
}

impl LazyloadCycleBreaker {
    /// Stable feature name.
    pub const NAME: &'static str = "lazyload_cycle_breaker";

    /// Creates the feature for `host`.
    #[must_use]
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self { host }
    }
}

impl AfterEachChunk for LazyloadCycleBreaker {
    fn after_each_chunk(&self) -> HandlerResult {
        break_lazyload_cycles(self.host.as_ref());
        Ok(())
    }
}

impl Feature for LazyloadCycleBreaker {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn as_after_each_chunk(&self) -> Option<&dyn AfterEachChunk> {
        Some(self)
    }
}

impl fmt::Debug for LazyloadCycleBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyloadCycleBreaker").finish_non_exhaustive()
    }
}
