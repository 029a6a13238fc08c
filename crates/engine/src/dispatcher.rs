// In crates/engine/src/dispatcher.rs

use crate::aggregator::IngestOutcome;
use crate::{Engine, compute};
use core_types::{SnapshotField, Tick};
use futures::{Stream, StreamExt};
use tokio::sync::watch;

impl Engine {
    /// Folds one tick into its instrument's candles.
    ///
    /// Accepted ticks refresh the last traded price and the pass-through
    /// session fields. A sealed candle triggers the live indicator recompute
    /// followed by evaluation at the tick's timestamp.
    pub fn on_tick(&self, tick: &Tick) -> IngestOutcome {
        let id = &tick.instrument_id;
        if let Err(e) = tick.validate() {
            tracing::warn!(instrument = %id, error = %e, "Rejected malformed tick.");
            return IngestOutcome::Rejected(e.to_string());
        }

        let (outcome, candles) = {
            let mut instruments = self.lock_instruments();
            let state = instruments.entry(id.clone()).or_insert_with(|| self.new_state());
            let outcome = state.ingest(tick);
            let candles = matches!(outcome, IngestOutcome::Sealed(_)).then(|| state.candles_with_open());
            (outcome, candles)
        };

        match &outcome {
            IngestOutcome::Rejected(reason) => {
                tracing::warn!(instrument = %id, reason = %reason, "Rejected tick.");
                return outcome;
            }
            IngestOutcome::Stale => {
                tracing::debug!(instrument = %id, timestamp = tick.timestamp, "Ignored stale tick.");
                return outcome;
            }
            IngestOutcome::Opened => tracing::debug!(instrument = %id, "First candle opened."),
            IngestOutcome::Sealed(candle) => {
                tracing::debug!(instrument = %id, open_time = candle.open_time, close = candle.close, "Candle sealed.")
            }
            IngestOutcome::Updated => {}
        }

        self.cache.apply(
            id,
            &[
                (SnapshotField::Ltp, Some(tick.last_price)),
                (SnapshotField::DayOpen, tick.day_open),
                (SnapshotField::PrevClose, tick.prev_close),
            ],
        );
        self.cache.touch(id, tick.timestamp);

        if let Some(candles) = candles {
            self.apply_update(id, compute::live_update(&candles, self.settings.rsi_history_len));
            self.evaluate(id, tick.timestamp);
        }
        outcome
    }

    /// Drives the engine until the tick stream ends or `shutdown` fires.
    ///
    /// A single dispatcher consumes ticks in arrival order while the fresh
    /// refresher runs on its own interval. Both stop before in-flight order
    /// submissions are awaited.
    pub async fn run<S>(&self, ticks: S, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()>
    where
        S: Stream<Item = Tick> + Send,
    {
        tracing::info!(instruments = self.instruments().len(), "Engine starting.");
        let (stop_tx, stop_rx) = watch::channel(false);

        let dispatcher = async {
            let mut ticks = std::pin::pin!(ticks);
            let mut processed: u64 = 0;
            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        tracing::info!("Shutdown requested; dispatcher stopping.");
                        break;
                    }
                    next = ticks.next() => match next {
                        Some(tick) => {
                            self.on_tick(&tick);
                            processed += 1;
                        }
                        None => {
                            tracing::warn!("Tick stream ended.");
                            break;
                        }
                    }
                }
            }
            tracing::info!(processed, "Dispatcher stopped.");
            let _ = stop_tx.send(true);
        };

        tokio::join!(dispatcher, self.run_refresher(stop_rx));

        self.drain_submissions().await;
        tracing::info!("Engine stopped.");
        Ok(())
    }
}
