#![allow(dead_code)]

use api_client::CandleSource;
use app_config::EngineSettings;
use async_trait::async_trait;
use core_types::{Candle, IndicatorSnapshot, InstrumentId, Interval, OrderRequest, OrderResult, Tick};
use engine::Engine;
use events::WsMessage;
use execution::OrderSubmitter;
use risk::{DecisionGate, GateSettings};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use strategies::{ConditionSet, Evaluation, SignalEvaluator};
use tokio::sync::broadcast;

/// Minute-aligned epoch millis: 2023-11-14T22:14:00Z.
pub const T: i64 = 1_700_000_040_000;
pub const MINUTE: i64 = 60_000;

pub fn tick(id: &str, ts: i64, price: f64, cum_volume: f64) -> Tick {
    Tick {
        instrument_id: InstrumentId::from(id),
        last_price: price,
        cumulative_volume: cum_volume,
        timestamp: ts,
        day_open: None,
        prev_close: None,
    }
}

/// Fires BUY on every snapshot that has a last traded price.
pub struct AlwaysBuy;

impl SignalEvaluator for AlwaysBuy {
    fn name(&self) -> &'static str {
        "always_buy"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Evaluation {
        let mut buy = ConditionSet::new();
        buy.push("has_price", snapshot.ltp.is_some());
        let mut sell = ConditionSet::new();
        sell.push("never", false);
        Evaluation::from_conditions(buy, sell)
    }
}

/// Records how many submissions overlap.
#[derive(Default)]
pub struct RecordingSubmitter {
    pub delay: Duration,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub calls: AtomicUsize,
}

impl RecordingSubmitter {
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay, ..Default::default() }
    }
}

#[async_trait]
impl OrderSubmitter for RecordingSubmitter {
    fn name(&self) -> &'static str {
        "RecordingSubmitter"
    }

    async fn submit(&self, order: &OrderRequest) -> execution::Result<OrderResult> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        Ok(OrderResult {
            order_id: format!("TEST-{call}"),
            instrument_id: order.instrument_id.clone(),
            side: order.side,
            price: order.price,
        })
    }
}

/// A historical source that always fails.
pub struct FailingSource;

#[async_trait]
impl CandleSource for FailingSource {
    async fn fetch_candles(&self, _: &InstrumentId, _: Interval, _: i64, _: i64) -> api_client::Result<Vec<Candle>> {
        Err(api_client::Error::ApiError { code: -1, msg: "unavailable".into() })
    }
}

pub fn settings() -> EngineSettings {
    EngineSettings {
        session_utc_offset_minutes: 0,
        ..EngineSettings::default()
    }
}

pub fn engine_with(
    evaluator: Box<dyn SignalEvaluator>,
    submitter: Arc<dyn OrderSubmitter>,
    candles: Arc<dyn CandleSource>,
) -> (Engine, broadcast::Receiver<WsMessage>) {
    let (ws_tx, ws_rx) = broadcast::channel(1024);
    let engine = Engine::new(
        settings(),
        evaluator,
        DecisionGate::new(GateSettings { cooldown_secs: 300 }),
        submitter,
        candles,
        ws_tx,
    );
    (engine, ws_rx)
}

/// Drains whatever is buffered on the broadcast receiver.
pub fn drain(rx: &mut broadcast::Receiver<WsMessage>) -> Vec<WsMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

pub fn decisions(messages: &[WsMessage]) -> usize {
    messages.iter().filter(|m| matches!(m, WsMessage::TradeDecision(_))).count()
}
