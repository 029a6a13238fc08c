// In crates/engine/src/compute.rs

use chrono::{DateTime, FixedOffset};
use core_types::{Candle, SnapshotField};

pub const EMA_FAST: usize = 9;
pub const EMA_SLOW: usize = 21;
pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const ADX_PERIOD: usize = 14;
pub const VWMA_FAST: usize = 10;
pub const VWMA_SLOW: usize = 20;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

const DAY_MS: i64 = 86_400_000;

/// Indicator values produced by one recompute, ready for the snapshot cache.
///
/// Fields that could not be computed are carried as `None` and masked by the
/// cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorUpdate {
    pub fields: Vec<(SnapshotField, Option<f64>)>,
    pub rsi_history: Option<Vec<f64>>,
}

impl IndicatorUpdate {
    pub fn get(&self, field: SnapshotField) -> Option<f64> {
        self.fields.iter().find(|(f, _)| *f == field).and_then(|(_, v)| *v)
    }
}

/// Tick-derived recompute: EMA(9/21), RSI(14) with trailing history, ATR(14).
///
/// `candles` are the closed candles followed by the open one.
pub fn live_update(candles: &[Candle], rsi_history_len: usize) -> IndicatorUpdate {
    let closes = indicators::closes(candles);
    let rsi = indicators::rsi(&closes, RSI_PERIOD, rsi_history_len);
    let atr = indicators::atr(candles, ATR_PERIOD);

    IndicatorUpdate {
        fields: vec![
            (SnapshotField::Ema9, indicators::ema(&closes, EMA_FAST)),
            (SnapshotField::Ema21, indicators::ema(&closes, EMA_SLOW)),
            (SnapshotField::Rsi, rsi.as_ref().map(|r| r.value)),
            (SnapshotField::Atr, atr.map(|a| a.atr)),
            (SnapshotField::AtrPercent, atr.and_then(|a| a.atr_percent)),
        ],
        rsi_history: rsi.map(|r| r.history).filter(|h| !h.is_empty()),
    }
}

/// Historical recompute: session VWAP, VWMA(10/20), ADX/+DI/-DI(14), MACD(12,26,9).
///
/// VWAP only uses candles opened at or after `session_start`; the other
/// indicators use the whole fetched window.
pub fn fresh_update(candles: &[Candle], session_start: i64, adx_min_candles: usize) -> IndicatorUpdate {
    let session_from = candles.partition_point(|c| c.open_time < session_start);
    let session = &candles[session_from..];

    let closes = indicators::closes(candles);
    let adx = indicators::adx(candles, ADX_PERIOD, adx_min_candles);
    let macd = indicators::macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);

    IndicatorUpdate {
        fields: vec![
            (SnapshotField::Vwap, indicators::vwap(session)),
            (SnapshotField::Vwma10, indicators::vwma(candles, VWMA_FAST)),
            (SnapshotField::Vwma20, indicators::vwma(candles, VWMA_SLOW)),
            (SnapshotField::Adx, adx.map(|a| a.adx)),
            (SnapshotField::PlusDi, adx.map(|a| a.plus_di)),
            (SnapshotField::MinusDi, adx.map(|a| a.minus_di)),
            (SnapshotField::Macd, macd.map(|m| m.macd)),
            (SnapshotField::MacdSignal, macd.map(|m| m.signal)),
            (SnapshotField::MacdHistogram, macd.map(|m| m.histogram)),
        ],
        rsi_history: None,
    }
}

/// Start of the trading day containing `now_ms`, in the session's UTC offset.
pub fn session_start(now_ms: i64, utc_offset_minutes: i32) -> i64 {
    let local_midnight = FixedOffset::east_opt(utc_offset_minutes * 60)
        .zip(DateTime::from_timestamp_millis(now_ms))
        .and_then(|(tz, now)| {
            now.with_timezone(&tz)
                .date_naive()
                .and_hms_opt(0, 0, 0)?
                .and_local_timezone(tz)
                .single()
        });

    match local_midnight {
        Some(midnight) => midnight.timestamp_millis(),
        // Out-of-range inputs fall back to the UTC day.
        None => now_ms - now_ms.rem_euclid(DAY_MS),
    }
}
