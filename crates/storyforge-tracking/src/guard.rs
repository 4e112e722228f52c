//! Liveness tracking for in-flight async work.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Well-known guard lanes.
///
/// Lanes are kind-level, not per-parent: starting a load for a new parent on
/// the same lane supersedes the previous parent's in-flight load, which is
/// what makes fast parent switches safe.
pub mod lanes {
    /// Project fetches.
    pub const PROJECT: &str = "load:project";
    /// Chapter list loads.
    pub const CHAPTERS: &str = "load:chapters";
    /// Scene list loads.
    pub const SCENES: &str = "load:scenes";
    /// Character list loads.
    pub const CHARACTERS: &str = "load:characters";
    /// Scene-draft generation.
    pub const GENERATE: &str = "generate";
    /// Chapter splitting.
    pub const SPLIT: &str = "split";
}

/// Proof that a particular request is the newest one on its lane.
///
/// Obtained from [`TaskGuard::start`] before issuing a remote call; checked
/// with [`TaskGuard::is_current`] after the call resolves. A token that is
/// no longer current marks the resolution as stale: the caller must drop it
/// without touching application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskToken {
    lane: String,
    generation: u64,
}

impl TaskToken {
    /// The lane this token belongs to.
    #[must_use]
    pub fn lane(&self) -> &str {
        &self.lane
    }
}

/// Per-lane generation counters for superseding stale async work.
///
/// Starting a new task on a lane invalidates all previously issued tokens
/// for that lane, so responses are applied in request-issue order rather
/// than arrival order. The guard never touches any store; it is pure
/// bookkeeping.
#[derive(Debug, Default)]
pub struct TaskGuard {
    generations: Mutex<HashMap<String, u64>>,
}

impl TaskGuard {
    /// Creates an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new task on `lane`, invalidating every earlier token for
    /// that lane.
    pub fn start(&self, lane: &str) -> TaskToken {
        let mut generations = self.lock();
        let generation = generations.entry(lane.to_string()).or_insert(0);
        *generation += 1;
        TaskToken {
            lane: lane.to_string(),
            generation: *generation,
        }
    }

    /// Whether `token` still represents the newest task on its lane.
    #[must_use]
    pub fn is_current(&self, token: &TaskToken) -> bool {
        let generations = self.lock();
        generations.get(&token.lane) == Some(&token.generation)
    }

    /// Invalidates all outstanding tokens for `lane`. The underlying remote
    /// call is not aborted; its eventual resolution becomes a no-op.
    pub fn cancel(&self, lane: &str) {
        let mut generations = self.lock();
        *generations.entry(lane.to_string()).or_insert(0) += 1;
    }

    /// Teardown: invalidates every outstanding token on every lane.
    pub fn cancel_all(&self) {
        let mut generations = self.lock();
        for generation in generations.values_mut() {
            *generation += 1;
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        // No code path panics while holding the lock, so a poisoned mutex
        // still contains consistent counters.
        self.generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
