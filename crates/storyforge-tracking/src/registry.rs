//! Process-wide busy/error records, one per operation key.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use storyforge_core::error::OrchestrationError;

use crate::key::OpKey;

/// Busy/error state for one operation key. Created on first use of the key
/// and kept for the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationRecord {
    /// Whether an operation under this key is currently in flight.
    pub busy: bool,
    /// The error from the most recent completed operation, if it failed.
    pub last_error: Option<OrchestrationError>,
}

#[derive(Debug, Default)]
struct Slot {
    record: OperationRecord,
    /// Bumped on every successful begin; identifies one attempt.
    epoch: u64,
}

/// Map from operation key to busy/error state.
///
/// `try_begin` is the single serialization point for mutations: it fails
/// fast with `AlreadyInProgress` instead of letting two operations race on
/// the same key. `is_any_busy` is the global flag the rendering layer uses
/// to disable cross-cutting actions while anything is in flight.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    records: Mutex<HashMap<OpKey, Slot>>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` busy, or fails fast if it already is. The returned epoch
    /// identifies this attempt for [`OperationRegistry::end_if_current`];
    /// callers that always end unconditionally may ignore it.
    ///
    /// # Errors
    ///
    /// Returns `OrchestrationError::AlreadyInProgress` carrying the key when
    /// an operation under `key` is already in flight.
    pub fn try_begin(&self, key: &OpKey) -> Result<u64, OrchestrationError> {
        let mut records = self.lock();
        let slot = records.entry(key.clone()).or_default();
        if slot.record.busy {
            debug!(key = %key, "rejecting concurrent operation");
            return Err(OrchestrationError::AlreadyInProgress(key.to_string()));
        }
        slot.record.busy = true;
        slot.epoch += 1;
        Ok(slot.epoch)
    }

    /// Marks `key` idle, recording the outcome. A `None` error clears any
    /// previous `last_error` for the key.
    pub fn end(&self, key: &OpKey, error: Option<OrchestrationError>) {
        let mut records = self.lock();
        let slot = records.entry(key.clone()).or_default();
        slot.record.busy = false;
        slot.record.last_error = error;
    }

    /// Like [`OperationRegistry::end`], but only when `epoch` still
    /// identifies the in-flight attempt. A key that was already ended, or
    /// re-begun by a newer attempt, is left untouched. Returns whether the
    /// key was released.
    pub fn end_if_current(
        &self,
        key: &OpKey,
        epoch: u64,
        error: Option<OrchestrationError>,
    ) -> bool {
        let mut records = self.lock();
        match records.get_mut(key) {
            Some(slot) if slot.record.busy && slot.epoch == epoch => {
                slot.record.busy = false;
                slot.record.last_error = error;
                true
            }
            _ => false,
        }
    }

    /// Whether an operation under `key` is in flight.
    #[must_use]
    pub fn is_busy(&self, key: &OpKey) -> bool {
        self.lock().get(key).is_some_and(|s| s.record.busy)
    }

    /// Whether any tracked operation is in flight.
    #[must_use]
    pub fn is_any_busy(&self) -> bool {
        self.lock().values().any(|s| s.record.busy)
    }

    /// Whether any of the given keys has an operation in flight.
    #[must_use]
    pub fn is_any_busy_of(&self, keys: &[OpKey]) -> bool {
        let records = self.lock();
        keys.iter()
            .any(|key| records.get(key).is_some_and(|s| s.record.busy))
    }

    /// The error from the most recent completed operation under `key`.
    #[must_use]
    pub fn last_error(&self, key: &OpKey) -> Option<OrchestrationError> {
        self.lock()
            .get(key)
            .and_then(|s| s.record.last_error.clone())
    }

    /// Clears the recorded error for `key`, if any.
    pub fn clear_error(&self, key: &OpKey) {
        if let Some(slot) = self.lock().get_mut(key) {
            slot.record.last_error = None;
        }
    }

    /// Snapshot of the record for `key`, if the key has ever been used.
    #[must_use]
    pub fn record(&self, key: &OpKey) -> Option<OperationRecord> {
        self.lock().get(key).map(|s| s.record.clone())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<OpKey, Slot>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_try_begin_marks_key_busy() {
        let registry = OperationRegistry::new();
        let key = OpKey::chapter(Uuid::new_v4());

        assert!(registry.try_begin(&key).is_ok());
        assert!(registry.is_busy(&key));
        assert!(registry.is_any_busy());
    }

    #[test]
    fn test_second_begin_on_busy_key_fails_fast() {
        let registry = OperationRegistry::new();
        let key = OpKey::chapter(Uuid::new_v4());
        registry.try_begin(&key).unwrap();

        let err = registry.try_begin(&key).unwrap_err();
        assert_eq!(
            err,
            OrchestrationError::AlreadyInProgress(key.to_string())
        );
    }

    #[test]
    fn test_end_clears_busy_and_records_error() {
        let registry = OperationRegistry::new();
        let key = OpKey::scene(Uuid::new_v4());
        registry.try_begin(&key).unwrap();

        registry.end(&key, Some(OrchestrationError::Remote("boom".into())));

        assert!(!registry.is_busy(&key));
        assert!(!registry.is_any_busy());
        assert_eq!(
            registry.last_error(&key),
            Some(OrchestrationError::Remote("boom".into()))
        );
    }

    #[test]
    fn test_successful_end_clears_previous_error() {
        let registry = OperationRegistry::new();
        let key = OpKey::scene(Uuid::new_v4());
        registry.end(&key, Some(OrchestrationError::Remote("boom".into())));

        registry.try_begin(&key).unwrap();
        registry.end(&key, None);

        assert_eq!(registry.last_error(&key), None);
    }

    #[test]
    fn test_distinct_keys_do_not_block_each_other() {
        let registry = OperationRegistry::new();
        let a = OpKey::chapter(Uuid::new_v4());
        let b = OpKey::chapter(Uuid::new_v4());

        registry.try_begin(&a).unwrap();
        assert!(registry.try_begin(&b).is_ok());
        assert!(registry.is_any_busy_of(&[a.clone()]));
        assert!(registry.is_any_busy_of(&[b]));
    }

    #[test]
    fn test_clear_error_removes_recorded_error() {
        let registry = OperationRegistry::new();
        let key = OpKey::character(Uuid::new_v4());
        registry.end(&key, Some(OrchestrationError::Validation("bad".into())));

        registry.clear_error(&key);

        assert_eq!(registry.last_error(&key), None);
    }

    #[test]
    fn test_end_if_current_releases_own_attempt() {
        let registry = OperationRegistry::new();
        let key = OpKey::generate(Uuid::new_v4());
        let epoch = registry.try_begin(&key).unwrap();

        assert!(registry.end_if_current(&key, epoch, None));
        assert!(!registry.is_busy(&key));
    }

    #[test]
    fn test_end_if_current_ignores_already_ended_key() {
        let registry = OperationRegistry::new();
        let key = OpKey::generate(Uuid::new_v4());
        let epoch = registry.try_begin(&key).unwrap();
        registry.end(&key, None);

        assert!(!registry.end_if_current(&key, epoch, None));
    }

    #[test]
    fn test_end_if_current_does_not_release_a_successor_attempt() {
        // First attempt ends, a second begins; the first attempt's late
        // release must leave the second attempt's busy flag alone.
        let registry = OperationRegistry::new();
        let key = OpKey::split(Uuid::new_v4());
        let first = registry.try_begin(&key).unwrap();
        registry.end(&key, None);
        let second = registry.try_begin(&key).unwrap();

        assert!(!registry.end_if_current(&key, first, None));
        assert!(registry.is_busy(&key));
        assert!(registry.end_if_current(&key, second, None));
        assert!(!registry.is_busy(&key));
    }

    #[test]
    fn test_record_is_none_for_untouched_key() {
        let registry = OperationRegistry::new();
        assert!(registry.record(&OpKey::rebuild(Uuid::new_v4())).is_none());
    }
}
