// In crates/engine/src/snapshot_cache.rs

use core_types::{IndicatorSnapshot, InstrumentId, SnapshotField};
use std::collections::HashMap;
use std::sync::RwLock;

/// Last-known-good indicator values per instrument.
///
/// Fallback is per field: a write carrying a missing or non-finite value is
/// ignored and the previous value stays, so a field that was once valid
/// never reverts to absent. Each method is a single mutation under the lock.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    snapshots: RwLock<HashMap<InstrumentId, IndicatorSnapshot>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the instrument's snapshot, empty when unknown.
    pub fn get(&self, instrument_id: &InstrumentId) -> IndicatorSnapshot {
        let snapshots = self.snapshots.read().unwrap_or_else(|e| e.into_inner());
        snapshots.get(instrument_id).cloned().unwrap_or_default()
    }

    /// Stores `value` only if it is a finite number. Returns whether it was stored.
    pub fn set_if_valid(&self, instrument_id: &InstrumentId, field: SnapshotField, value: Option<f64>) -> bool {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return false;
        };
        let mut snapshots = self.snapshots.write().unwrap_or_else(|e| e.into_inner());
        *snapshots.entry(instrument_id.clone()).or_default().slot_mut(field) = Some(value);
        true
    }

    /// Applies a batch of field updates under one lock acquisition, each with
    /// `set_if_valid` semantics. Returns how many fields were stored.
    pub fn apply(&self, instrument_id: &InstrumentId, updates: &[(SnapshotField, Option<f64>)]) -> usize {
        let mut snapshots = self.snapshots.write().unwrap_or_else(|e| e.into_inner());
        let snapshot = snapshots.entry(instrument_id.clone()).or_default();

        let mut stored = 0;
        for (field, value) in updates {
            if let Some(value) = value.filter(|v| v.is_finite()) {
                *snapshot.slot_mut(*field) = Some(value);
                stored += 1;
            }
        }
        stored
    }

    /// Replaces the trailing RSI history. Empty or non-finite histories are ignored.
    pub fn set_rsi_history(&self, instrument_id: &InstrumentId, history: Vec<f64>) -> bool {
        if history.is_empty() || history.iter().any(|v| !v.is_finite()) {
            return false;
        }
        let mut snapshots = self.snapshots.write().unwrap_or_else(|e| e.into_inner());
        snapshots.entry(instrument_id.clone()).or_default().rsi_history = history;
        true
    }

    /// Advances the snapshot's timestamp. Older timestamps are ignored.
    pub fn touch(&self, instrument_id: &InstrumentId, timestamp: i64) {
        let mut snapshots = self.snapshots.write().unwrap_or_else(|e| e.into_inner());
        let snapshot = snapshots.entry(instrument_id.clone()).or_default();
        if snapshot.timestamp.is_none_or(|current| timestamp > current) {
            snapshot.timestamp = Some(timestamp);
        }
    }

    /// The instrument's snapshot, or `None` if nothing was ever cached for it.
    pub fn find(&self, instrument_id: &InstrumentId) -> Option<IndicatorSnapshot> {
        self.snapshots.read().unwrap_or_else(|e| e.into_inner()).get(instrument_id).cloned()
    }

    pub fn clear(&self) {
        self.snapshots.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Instruments with a cached snapshot, sorted.
    pub fn instruments(&self) -> Vec<InstrumentId> {
        let snapshots = self.snapshots.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<InstrumentId> = snapshots.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Every cached snapshot, sorted by instrument.
    pub fn all(&self) -> Vec<(InstrumentId, IndicatorSnapshot)> {
        let snapshots = self.snapshots.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<_> = snapshots.iter().map(|(id, s)| (id.clone(), s.clone())).collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}
