//! Action counter restoration.

use core::fmt;
use std::sync::Arc;

use batchwise_hooks::{AfterEachChunk, Feature, HandlerResult, OnFinish, OnStart};
use batchwise_host::{ActionSnapshot, HostEnvironment, backup_actions, restore_actions};
use parking_lot::Mutex;

/// Keeps the host's action counters at their pre-iteration values.
///
/// The counters are copied on start, written back after every page, and
/// written back once more on finish before the copy is dropped. Only one
/// backup is held, so a single instance must not drive nested iterations.
pub struct ActionsRestorer {
    host: Arc<dyn HostEnvironment>,
    backup: Mutex<Option<ActionSnapshot>>,
}

impl ActionsRestorer {
    /// Stable feature name.
    pub const NAME: &'static str = "actions_restorer";

    /// Creates the feature for `host`.
    #[must_use]
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self {
            host,
            backup: Mutex::new(None),
        }
    }

    /// Whether a backup is currently held.
    #[must_use]
    pub fn has_backup(&self) -> bool {
        self.backup.lock().is_some()
    }
}

impl OnStart for ActionsRestorer {
    fn on_start(&self) -> HandlerResult {
        *self.backup.lock() = Some(backup_actions(self.host.as_ref()));
        Ok(())
    }
}

impl AfterEachChunk for ActionsRestorer {
    fn after_each_chunk(&self) -> HandlerResult {
        if let Some(snapshot) = self.backup.lock().as_ref() {
            restore_actions(self.host.as_ref(), snapshot);
        }
        Ok(())
    }
}

impl OnFinish for ActionsRestorer {
    fn on_finish(&self) -> HandlerResult {
        if let Some(snapshot) = self.backup.lock().take() {
            restore_actions(self.host.as_ref(), &snapshot);
        }
        Ok(())
    }
}

impl Feature for ActionsRestorer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn as_on_start(&self) -> Option<&dyn OnStart> {
        Some(self)
    }

    fn as_after_each_chunk(&self) -> Option<&dyn AfterEachChunk> {
        Some(self)
    }

    fn as_on_finish(&self) -> Option<&dyn OnFinish> {
        Some(self)
    }
}

impl fmt::Debug for ActionsRestorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionsRestorer")
            .field("has_backup", &self.has_backup())
            .finish_non_exhaustive()
    }
}
