// In crates/engine/src/sources.rs

use crate::aggregator::InstrumentState;
use api_client::{CandleSource, Result};
use async_trait::async_trait;
use core_types::{Candle, InstrumentId, Interval, Tick};
use std::collections::HashMap;
use std::sync::RwLock;

/// An in-process candle store answering historical fetches.
///
/// Used by `replay`, where "history" is whatever the replayed ticks have
/// produced so far, and by tests. Only candles fully closed by `to` are
/// returned, so a fetch never sees the future.
#[derive(Debug)]
pub struct MemoryCandleSource {
    base_interval: Interval,
    candles: RwLock<HashMap<InstrumentId, Vec<Candle>>>,
}

impl MemoryCandleSource {
    pub fn new(base_interval: Interval) -> Self {
        Self {
            base_interval,
            candles: RwLock::new(HashMap::new()),
        }
    }

    /// Aggregates a tick sequence into base-interval candles per instrument.
    pub fn from_ticks<'a>(base_interval: Interval, ticks: impl IntoIterator<Item = &'a Tick>) -> Self {
        let mut states: HashMap<InstrumentId, InstrumentState> = HashMap::new();
        for tick in ticks {
            states
                .entry(tick.instrument_id.clone())
                .or_insert_with(|| InstrumentState::new(base_interval, usize::MAX))
                .ingest(tick);
        }

        let source = Self::new(base_interval);
        for (id, state) in states {
            source.insert(id, state.candles_with_open());
        }
        source
    }

    /// Replaces the stored candles for one instrument.
    pub fn insert(&self, instrument_id: InstrumentId, mut candles: Vec<Candle>) {
        candles.sort_by_key(|c| c.open_time);
        self.candles
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(instrument_id, candles);
    }
}

#[async_trait]
impl CandleSource for MemoryCandleSource {
    async fn fetch_candles(
        &self,
        instrument: &InstrumentId,
        interval: Interval,
        from: i64,
        to: i64,
    ) -> Result<Vec<Candle>> {
        let base_ms = self.base_interval.as_millis();
        let window: Vec<Candle> = {
            let candles = self.candles.read().unwrap_or_else(|e| e.into_inner());
            candles
                .get(instrument)
                .map(|all| {
                    all.iter()
                        .filter(|c| c.open_time >= from && c.open_time + base_ms <= to)
                        .copied()
                        .collect()
                })
                .unwrap_or_default()
        };

        if interval == self.base_interval {
            return Ok(window);
        }
        Ok(resample(&window, interval))
    }
}

/// Merges consecutive candles into wider buckets (first open, max high, min
/// low, last close, summed volume).
pub fn resample(candles: &[Candle], interval: Interval) -> Vec<Candle> {
    let mut out: Vec<Candle> = Vec::new();
    for candle in candles {
        let bucket = interval.bucket_start(candle.open_time);
        match out.last_mut() {
            Some(last) if last.open_time == bucket => {
                last.high = last.high.max(candle.high);
                last.low = last.low.min(candle.low);
                last.close = candle.close;
                last.volume += candle.volume;
            }
            _ => out.push(Candle { open_time: bucket, ..*candle }),
        }
    }
    out
}
