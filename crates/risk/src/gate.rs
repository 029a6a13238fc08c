// In crates/risk/src/gate.rs

use crate::types::{CooldownEntry, GateSettings};
use crate::{Error, Result};
use core_types::{InstrumentId, Side};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-instrument cooldown plus a process-wide single-flight lock.
///
/// Per instrument the gate is `IDLE -> LOCKED (cooldown) -> IDLE`; expiry is
/// evaluated lazily on each check. Independently, at most one order
/// submission may be in progress across all instruments. Rejected signals
/// are not queued.
#[derive(Debug)]
pub struct DecisionGate {
    cooldown_ms: i64,
    cooldowns: Mutex<HashMap<InstrumentId, CooldownEntry>>,
    in_flight: Arc<AsyncMutex<()>>,
}

/// Proof that a decision was accepted. Holds the single-flight lock until dropped.
#[derive(Debug)]
pub struct GatePermit {
    instrument_id: InstrumentId,
    side: Side,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        tracing::debug!(instrument = %self.instrument_id, side = %self.side, "Single-flight lock released.");
    }
}

impl DecisionGate {
    pub fn new(settings: GateSettings) -> Self {
        Self {
            cooldown_ms: (settings.cooldown_secs as i64).saturating_mul(1000),
            cooldowns: Mutex::new(HashMap::new()),
            in_flight: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Tries to accept a fired signal at `now_ms` (epoch millis).
    ///
    /// The single-flight lock is taken first without waiting; the cooldown is
    /// then checked and, on success, restarted in the same critical section.
    /// A lock-busy rejection leaves the cooldown untouched.
    pub fn try_acquire(&self, instrument_id: &InstrumentId, side: Side, now_ms: i64) -> Result<GatePermit> {
        let guard = self
            .in_flight
            .clone()
            .try_lock_owned()
            .map_err(|_| Error::OrderInFlight)?;

        let mut cooldowns = self.cooldowns.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = cooldowns.get(instrument_id) {
            let elapsed = now_ms - entry.last_order_timestamp;
            if elapsed < self.cooldown_ms {
                return Err(Error::CooldownActive {
                    instrument: instrument_id.clone(),
                    remaining_ms: self.cooldown_ms - elapsed,
                });
            }
        }

        cooldowns.insert(
            instrument_id.clone(),
            CooldownEntry {
                instrument_id: instrument_id.clone(),
                last_order_timestamp: now_ms,
                last_order_type: side,
            },
        );
        drop(cooldowns);

        tracing::debug!(instrument = %instrument_id, %side, "Decision accepted; single-flight lock held.");
        Ok(GatePermit {
            instrument_id: instrument_id.clone(),
            side,
            _guard: guard,
        })
    }

    /// Milliseconds left in the instrument's cooldown, `None` when idle.
    pub fn cooldown_remaining(&self, instrument_id: &InstrumentId, now_ms: i64) -> Option<i64> {
        let cooldowns = self.cooldowns.lock().unwrap_or_else(|e| e.into_inner());
        let entry = cooldowns.get(instrument_id)?;
        let remaining = self.cooldown_ms - (now_ms - entry.last_order_timestamp);
        (remaining > 0).then_some(remaining)
    }

    pub fn cooldowns(&self) -> Vec<CooldownEntry> {
        let cooldowns = self.cooldowns.lock().unwrap_or_else(|e| e.into_inner());
        cooldowns.values().cloned().collect()
    }

    pub fn is_order_in_flight(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const MINUTE: i64 = 60_000;

    fn gate(cooldown_secs: u64) -> DecisionGate {
        DecisionGate::new(GateSettings { cooldown_secs })
    }

    #[test]
    fn second_signal_within_cooldown_is_rejected() {
        let gate = gate(300);
        let id = InstrumentId::from("NSE:TCS");

        let permit = gate.try_acquire(&id, Side::Buy, 1_000_000).unwrap();
        drop(permit);

        let second = gate.try_acquire(&id, Side::Buy, 1_010_000);
        assert!(matches!(second, Err(Error::CooldownActive { remaining_ms: 290_000, .. })));
    }

    #[test]
    fn cooldown_applies_to_either_side() {
        let gate = gate(300);
        let id = InstrumentId::from("NSE:TCS");
        drop(gate.try_acquire(&id, Side::Buy, 0).unwrap());
        assert!(gate.try_acquire(&id, Side::Sell, MINUTE).is_err());
    }

    #[test]
    fn cooldown_expires_lazily() {
        let gate = gate(300);
        let id = InstrumentId::from("NSE:TCS");
        drop(gate.try_acquire(&id, Side::Buy, 0).unwrap());

        assert_eq!(gate.cooldown_remaining(&id, 4 * MINUTE), Some(MINUTE));
        assert_eq!(gate.cooldown_remaining(&id, 5 * MINUTE), None);

        drop(gate.try_acquire(&id, Side::Sell, 5 * MINUTE).unwrap());

        let entry = gate.cooldowns().pop().unwrap();
        assert_eq!(entry.last_order_timestamp, 5 * MINUTE);
        assert_eq!(entry.last_order_type, Side::Sell);
    }

    #[test]
    fn busy_lock_rejects_other_instruments_without_starting_their_cooldown() {
        let gate = gate(300);
        let a = InstrumentId::from("NSE:TCS");
        let b = InstrumentId::from("NSE:WIPRO");

        let permit = gate.try_acquire(&a, Side::Buy, 0).unwrap();
        assert!(gate.is_order_in_flight());
        assert_eq!(gate.try_acquire(&b, Side::Buy, 0).unwrap_err(), Error::OrderInFlight);
        assert_eq!(gate.cooldown_remaining(&b, 0), None);

        drop(permit);
        assert!(!gate.is_order_in_flight());
        assert!(gate.try_acquire(&b, Side::Buy, 1).is_ok());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn submissions_never_overlap() {
        let gate = Arc::new(gate(300));
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for name in ["NSE:TCS", "NSE:WIPRO", "NSE:INFY", "NSE:HCLTECH"] {
            let gate = gate.clone();
            let active = active.clone();
            let max_active = max_active.clone();
            let accepted = accepted.clone();
            handles.push(tokio::spawn(async move {
                let Ok(permit) = gate.try_acquire(&InstrumentId::from(name), Side::Buy, 0) else {
                    return;
                };
                accepted.fetch_add(1, Ordering::SeqCst);
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                drop(permit);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        assert!(accepted.load(Ordering::SeqCst) >= 1);
    }
}
