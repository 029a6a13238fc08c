// In crates/engine/src/lib.rs

pub mod aggregator;
pub mod compute;
pub mod dispatcher;
pub mod fresh;
pub mod snapshot_cache;
pub mod sources;

use crate::aggregator::InstrumentState;
use crate::compute::IndicatorUpdate;
use anyhow::Result;
use api_client::CandleSource;
use app_config::{EngineSettings, Settings};
use core_types::{IndicatorSnapshot, InstrumentId, TradeDecision};
use events::{OrderOutcome, SnapshotUpdate, WsMessage};
use execution::OrderSubmitter;
use risk::DecisionGate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use strategies::SignalEvaluator;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

pub use aggregator::IngestOutcome;
pub use snapshot_cache::SnapshotCache;
pub use sources::MemoryCandleSource;

/// Owns every piece of per-process trading state.
///
/// The instrument map is only mutated by the dispatcher (`on_tick`) and by
/// explicit resets; the snapshot cache is shared with the fresh refresher
/// and read by the relay server. Accepted decisions are submitted on spawned
/// tasks so tick ingestion never waits on order I/O.
pub struct Engine {
    settings: EngineSettings,
    instruments: Mutex<HashMap<InstrumentId, InstrumentState>>,
    cache: Arc<SnapshotCache>,
    evaluator: Box<dyn SignalEvaluator>,
    gate: Arc<DecisionGate>,
    submitter: Arc<dyn OrderSubmitter>,
    candles: Arc<dyn CandleSource>,
    ws_tx: broadcast::Sender<WsMessage>,
    submissions: Mutex<JoinSet<()>>,
}

impl Engine {
    /// RSI history is widened to the evaluator's lookback when configured
    /// shorter, so lookback predicates can ever pass.
    pub fn new(
        mut settings: EngineSettings,
        evaluator: Box<dyn SignalEvaluator>,
        gate: DecisionGate,
        submitter: Arc<dyn OrderSubmitter>,
        candles: Arc<dyn CandleSource>,
        ws_tx: broadcast::Sender<WsMessage>,
    ) -> Self {
        let lookback = evaluator.rsi_lookback();
        if lookback > settings.rsi_history_len {
            tracing::warn!(
                configured = settings.rsi_history_len,
                lookback,
                "RSI history shorter than the evaluator's lookback; widening it."
            );
            settings.rsi_history_len = lookback;
        }
        Self {
            settings,
            instruments: Mutex::new(HashMap::new()),
            cache: Arc::new(SnapshotCache::new()),
            evaluator,
            gate: Arc::new(gate),
            submitter,
            candles,
            ws_tx,
            submissions: Mutex::new(JoinSet::new()),
        }
    }

    /// Builds the evaluator and gate named in the settings.
    pub fn from_settings(
        settings: &Settings,
        submitter: Arc<dyn OrderSubmitter>,
        candles: Arc<dyn CandleSource>,
        ws_tx: broadcast::Sender<WsMessage>,
    ) -> Result<Self> {
        let evaluator = strategies::create_evaluator(&settings.signals)?;
        let gate = DecisionGate::new(settings.gate.clone());
        tracing::info!(
            evaluator = evaluator.name(),
            submitter = submitter.name(),
            cooldown_secs = settings.gate.cooldown_secs,
            "Engine configured."
        );
        Ok(Self::new(settings.engine.clone(), evaluator, gate, submitter, candles, ws_tx))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn cache(&self) -> Arc<SnapshotCache> {
        self.cache.clone()
    }

    pub fn gate(&self) -> &DecisionGate {
        &self.gate
    }

    pub fn snapshot(&self, instrument_id: &InstrumentId) -> IndicatorSnapshot {
        self.cache.get(instrument_id)
    }

    /// Subscribed (or ticked) instruments, sorted.
    pub fn instruments(&self) -> Vec<InstrumentId> {
        let mut ids: Vec<InstrumentId> = self.lock_instruments().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Replaces the instrument list, resetting every candle history and the cache.
    pub fn replace_instruments(&self, ids: &[InstrumentId]) {
        let fresh: HashMap<InstrumentId, InstrumentState> = ids
            .iter()
            .map(|id| (id.clone(), self.new_state()))
            .collect();
        *self.lock_instruments() = fresh;
        self.cache.clear();
        tracing::info!(count = ids.len(), "Instrument list replaced; state reset.");
    }

    /// Drops every cached snapshot and candle history, keeping the subscriptions.
    pub fn clear_cache(&self) {
        let mut instruments = self.lock_instruments();
        for state in instruments.values_mut() {
            *state = self.new_state();
        }
        drop(instruments);
        self.cache.clear();
        tracing::info!("Snapshot cache and candle history cleared.");
    }

    /// Instruments with no accepted tick within `stale_after_secs` of `now_ms`.
    pub fn stale_instruments(&self, now_ms: i64) -> Vec<InstrumentId> {
        let instruments = self.lock_instruments();
        let mut stale: Vec<InstrumentId> = instruments
            .iter()
            .filter(|(_, state)| self.is_stale(state.last_tick_timestamp(), now_ms))
            .map(|(id, _)| id.clone())
            .collect();
        stale.sort();
        stale
    }

    /// Evaluates the cached snapshot and, if a side fires, offers it to the gate.
    ///
    /// Always broadcasts the snapshot with its condition breakdown. Returns
    /// the decision when the gate accepted it; the order is then submitted on
    /// a spawned task holding the gate's permit.
    pub fn evaluate(&self, instrument_id: &InstrumentId, now_ms: i64) -> Option<TradeDecision> {
        let snapshot = self.cache.get(instrument_id);
        let evaluation = self.evaluator.evaluate(&snapshot);

        let _ = self.ws_tx.send(WsMessage::IndicatorSnapshot(SnapshotUpdate {
            instrument_id: instrument_id.clone(),
            snapshot: snapshot.clone(),
            buy_signal: evaluation.buy,
            sell_signal: evaluation.sell,
            buy_conditions: evaluation.buy_conditions.clone(),
            sell_conditions: evaluation.sell_conditions.clone(),
            timestamp: now_ms,
        }));

        let side = evaluation.fired()?;
        let price = snapshot.ltp?;

        let last_tick = self.lock_instruments().get(instrument_id).and_then(|s| s.last_tick_timestamp());
        if self.is_stale(last_tick, now_ms) {
            tracing::debug!(instrument = %instrument_id, %side, "Signal ignored: no recent ticks.");
            return None;
        }

        let permit = match self.gate.try_acquire(instrument_id, side, now_ms) {
            Ok(permit) => permit,
            Err(e) => {
                tracing::debug!(instrument = %instrument_id, %side, reason = %e, "Signal rejected by gate.");
                return None;
            }
        };

        let decision = TradeDecision {
            instrument_id: instrument_id.clone(),
            side,
            price,
            reason_code: self.evaluator.name().to_string(),
            reasons: evaluation.reasons(side),
            timestamp: now_ms,
        };
        tracing::info!(instrument = %instrument_id, %side, price, "Trade decision accepted.");
        let _ = self.ws_tx.send(WsMessage::TradeDecision(decision.clone()));

        let submitter = self.submitter.clone();
        let ws_tx = self.ws_tx.clone();
        let order = decision.clone();
        self.spawn_submission(async move {
            let result = match order.to_order_request() {
                Ok(request) => submitter.submit(&request).await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            drop(permit);

            let outcome = match result {
                Ok(filled) => OrderOutcome {
                    instrument_id: order.instrument_id,
                    side: order.side,
                    order_id: Some(filled.order_id),
                    error: None,
                    timestamp: order.timestamp,
                },
                Err(error) => {
                    tracing::error!(instrument = %order.instrument_id, side = %order.side, error = %error, "Order submission failed.");
                    OrderOutcome {
                        instrument_id: order.instrument_id,
                        side: order.side,
                        order_id: None,
                        error: Some(error),
                        timestamp: order.timestamp,
                    }
                }
            };
            let _ = ws_tx.send(WsMessage::OrderResult(outcome));
        });

        Some(decision)
    }

    /// Waits for every in-flight order submission to finish.
    pub async fn drain_submissions(&self) {
        let mut submissions = std::mem::take(&mut *self.submissions.lock().unwrap_or_else(|e| e.into_inner()));
        while let Some(joined) = submissions.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Order submission task panicked.");
            }
        }
    }

    fn spawn_submission<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut submissions = self.submissions.lock().unwrap_or_else(|e| e.into_inner());
        while submissions.try_join_next().is_some() {}
        submissions.spawn(task);
    }

    fn apply_update(&self, instrument_id: &InstrumentId, update: IndicatorUpdate) {
        self.cache.apply(instrument_id, &update.fields);
        if let Some(history) = update.rsi_history {
            self.cache.set_rsi_history(instrument_id, history);
        }
    }

    fn is_stale(&self, last_tick: Option<i64>, now_ms: i64) -> bool {
        let limit = (self.settings.stale_after_secs as i64).saturating_mul(1000);
        last_tick.is_none_or(|ts| now_ms - ts > limit)
    }

    fn new_state(&self) -> InstrumentState {
        InstrumentState::new(self.settings.interval, self.settings.max_history)
    }

    fn lock_instruments(&self) -> MutexGuard<'_, HashMap<InstrumentId, InstrumentState>> {
        self.instruments.lock().unwrap_or_else(|e| e.into_inner())
    }
}
