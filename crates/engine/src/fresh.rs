// In crates/engine/src/fresh.rs

use crate::{Engine, compute};
use anyhow::Context;
use chrono::Utc;
use core_types::{Candle, InstrumentId};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};

impl Engine {
    /// The fetch window for `now_ms`: from the session start minus the
    /// configured lookback, up to now.
    pub fn fresh_window(&self, now_ms: i64) -> (i64, i64, i64) {
        let session_start = compute::session_start(now_ms, self.settings.session_utc_offset_minutes);
        let from = session_start - self.settings.fresh_lookback_minutes.saturating_mul(60_000);
        (session_start, from, now_ms)
    }

    async fn fetch_window(&self, instrument_id: &InstrumentId, now_ms: i64) -> anyhow::Result<(i64, Vec<Candle>)> {
        let (session_start, from, to) = self.fresh_window(now_ms);
        let candles = self
            .candles
            .fetch_candles(instrument_id, self.settings.interval, from, to)
            .await
            .with_context(|| format!("historical fetch failed for {instrument_id}"))?;
        Ok((session_start, candles))
    }

    /// Recomputes the historical indicators for one instrument and evaluates.
    pub async fn refresh_instrument(&self, instrument_id: &InstrumentId, now_ms: i64) -> anyhow::Result<()> {
        let (session_start, candles) = self.fetch_window(instrument_id, now_ms).await?;
        let update = compute::fresh_update(&candles, session_start, self.settings.adx_min_candles);
        tracing::debug!(instrument = %instrument_id, candles = candles.len(), "Fresh indicators recomputed.");

        self.apply_update(instrument_id, update);
        self.cache.touch(instrument_id, now_ms);
        self.evaluate(instrument_id, now_ms);
        Ok(())
    }

    /// One refresh cycle over every instrument. Failures are logged and the
    /// instrument is retried on the next cycle.
    pub async fn refresh_all(&self, now_ms: i64) {
        for id in self.instruments() {
            if let Err(e) = self.refresh_instrument(&id, now_ms).await {
                tracing::warn!(instrument = %id, error = %format!("{e:#}"), "Fresh refresh skipped.");
            }
        }
    }

    /// Seeds candle history and both indicator paths from the historical source.
    /// Returns the number of candles seeded across all instruments.
    pub async fn warm_up(&self, now_ms: i64) -> usize {
        let interval_ms = self.settings.interval.as_millis();
        let mut seeded = 0;

        for id in self.instruments() {
            let (session_start, candles) = match self.fetch_window(&id, now_ms).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    tracing::warn!(instrument = %id, error = %format!("{e:#}"), "Warm-up skipped.");
                    continue;
                }
            };
            let closed: Vec<Candle> = candles
                .iter()
                .copied()
                .filter(|c| c.open_time + interval_ms <= now_ms)
                .collect();

            let history = {
                let mut instruments = self.lock_instruments();
                let state = instruments.entry(id.clone()).or_insert_with(|| self.new_state());
                seeded += state.seed(&closed);
                state.candles_with_open()
            };

            self.apply_update(&id, compute::live_update(&history, self.settings.rsi_history_len));
            self.apply_update(&id, compute::fresh_update(&candles, session_start, self.settings.adx_min_candles));
            self.cache.touch(&id, now_ms);
            tracing::info!(instrument = %id, candles = history.len(), "Instrument warmed up.");
        }
        seeded
    }

    /// Runs `refresh_all` on the configured period until `stop` fires.
    pub async fn run_refresher(&self, mut stop: watch::Receiver<bool>) {
        let mut ticker = interval(Duration::from_secs(self.settings.refresh_period_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; warm-up already covered it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = stop.changed() => break,
                _ = ticker.tick() => self.refresh_all(Utc::now().timestamp_millis()).await,
            }
        }
        tracing::info!("Fresh refresher stopped.");
    }
}
