//! Lifecycle events fired by a paginating iterator.
//!
//! There are exactly three events. Each one names a point in the iteration
//! where registered features get a chance to run maintenance work:
//!
//! | Event | Fired |
//! |-------|-------|
//! | [`LifecycleEvent::OnStart`] | once, before the first page is fetched |
//! | [`LifecycleEvent::AfterEachChunk`] | before every page after the first, and once at termination |
//! | [`LifecycleEvent::OnFinish`] | once, right after the final `AfterEachChunk` |

use core::fmt;

use serde::{Deserialize, Serialize};

/// One of the three points in an iteration where hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Iteration is about to begin. No page has been fetched yet.
    OnStart,
    /// A page boundary. The previous chunk is still alive and about to be replaced.
    AfterEachChunk,
    /// Iteration has reached its terminal state.
    OnFinish,
}

impl LifecycleEvent {
    /// All events, in the order their handler maps are reported.
    pub const ALL: [LifecycleEvent; 3] = [
        LifecycleEvent::OnStart,
        LifecycleEvent::AfterEachChunk,
        LifecycleEvent::OnFinish,
    ];

    /// Returns the stable snake-case name of the event.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            LifecycleEvent::OnStart => "on_start",
            LifecycleEvent::AfterEachChunk => "after_each_chunk",
            LifecycleEvent::OnFinish => "on_finish",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            LifecycleEvent::OnStart => 0,
            LifecycleEvent::AfterEachChunk => 1,
            LifecycleEvent::OnFinish => 2,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_snake_case() {
        let names: Vec<_> = LifecycleEvent::ALL.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["on_start", "after_each_chunk", "on_finish"]);
    }

    #[test]
    fn index_matches_position_in_all() {
        for (position, event) in LifecycleEvent::ALL.iter().enumerate() {
            assert_eq!(event.index(), position);
        }
    }

    #[test]
    fn serializes_to_its_name() {
        let json = serde_json::to_string(&LifecycleEvent::AfterEachChunk).unwrap();
        assert_eq!(json, "\"after_each_chunk\"");
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(LifecycleEvent::OnFinish.to_string(), "on_finish");
    }
}
