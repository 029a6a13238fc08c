// In crates/engine/src/aggregator.rs

use core_types::{Candle, Interval, Tick};
use std::collections::VecDeque;

/// What a single tick did to an instrument's candles.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// The instrument's first candle was opened.
    Opened,
    /// The open candle absorbed the tick.
    Updated,
    /// The tick started a newer bucket; the previous candle was sealed into history.
    Sealed(Candle),
    /// The tick belongs to a bucket older than the open candle and was ignored.
    Stale,
    Rejected(String),
}

/// Rolling candle state for one instrument.
///
/// Holds a bounded history of closed candles (oldest first), the single open
/// candle and the cumulative-volume baseline used to turn the feed's running
/// session volume into per-candle volume.
#[derive(Debug, Clone)]
pub struct InstrumentState {
    interval: Interval,
    max_history: usize,
    history: VecDeque<Candle>,
    open: Option<Candle>,
    volume_baseline: f64,
    last_tick_timestamp: Option<i64>,
}

impl InstrumentState {
    pub fn new(interval: Interval, max_history: usize) -> Self {
        Self {
            interval,
            max_history: max_history.max(1),
            history: VecDeque::with_capacity(max_history.clamp(1, 1024) + 1),
            open: None,
            volume_baseline: 0.0,
            last_tick_timestamp: None,
        }
    }

    pub fn ingest(&mut self, tick: &Tick) -> IngestOutcome {
        if let Err(e) = tick.validate() {
            return IngestOutcome::Rejected(e.to_string());
        }

        let bucket = self.interval.bucket_start(tick.timestamp);
        let price = tick.last_price;

        let outcome = match self.open.as_mut() {
            None => {
                self.open = Some(Candle::opened_at(bucket, price));
                self.volume_baseline = tick.cumulative_volume;
                IngestOutcome::Opened
            }
            Some(open) if bucket == open.open_time => {
                open.high = open.high.max(price);
                open.low = open.low.min(price);
                open.close = price;
                open.volume += (tick.cumulative_volume - self.volume_baseline).max(0.0);
                self.volume_baseline = self.volume_baseline.max(tick.cumulative_volume);
                IngestOutcome::Updated
            }
            Some(open) if bucket > open.open_time => {
                let sealed = std::mem::replace(open, Candle::opened_at(bucket, price));
                self.volume_baseline = tick.cumulative_volume;
                self.push_history(sealed);
                IngestOutcome::Sealed(sealed)
            }
            Some(_) => return IngestOutcome::Stale,
        };

        self.last_tick_timestamp = Some(tick.timestamp);
        outcome
    }

    /// Warms history with historical candles.
    ///
    /// Candles that fail validation, overlap existing history or are not
    /// strictly older than the open candle are skipped. Returns how many
    /// were accepted.
    pub fn seed(&mut self, candles: &[Candle]) -> usize {
        let mut sorted: Vec<Candle> = candles.iter().copied().filter(|c| c.validate().is_ok()).collect();
        sorted.sort_by_key(|c| c.open_time);

        let mut accepted = 0;
        for candle in sorted {
            let before_open = self.open.is_none_or(|open| candle.open_time < open.open_time);
            let after_history = self.history.back().is_none_or(|last| candle.open_time > last.open_time);
            if before_open && after_history {
                self.push_history(candle);
                accepted += 1;
            }
        }
        accepted
    }

    fn push_history(&mut self, candle: Candle) {
        self.history.push_back(candle);
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }

    pub fn history(&self) -> &VecDeque<Candle> {
        &self.history
    }

    pub fn open_candle(&self) -> Option<&Candle> {
        self.open.as_ref()
    }

    /// Closed candles followed by the open one, oldest first.
    pub fn candles_with_open(&self) -> Vec<Candle> {
        self.history.iter().chain(self.open.iter()).copied().collect()
    }

    pub fn last_tick_timestamp(&self) -> Option<i64> {
        self.last_tick_timestamp
    }
}
