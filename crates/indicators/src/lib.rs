//! Technical indicators computed from candle history.
//!
//! Every indicator has an incremental form (a struct fed one bar at a time)
//! and a batch helper over a candle slice. Insufficient history is reported
//! as `None`, never as a zero or a NaN.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod volume;

use core_types::Candle;

pub use adx::{Adx, AdxOutput, adx};
pub use atr::{Atr, AtrOutput, atr, true_range};
pub use ema::{Ema, ema, ema_series};
pub use macd::{Macd, MacdOutput, macd};
pub use rsi::{Rsi, RsiOutput, rsi};
pub use volume::{VwapAccumulator, vwap, vwap_series, vwma};

/// Closing prices of a candle slice, oldest first.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// `Some(value)` only when the value is a finite number.
pub(crate) fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
pub(crate) mod test_support {
    use core_types::Candle;

    /// Builds one-minute candles from `(high, low, close)` triples with unit volume.
    pub fn hlc(bars: &[(f64, f64, f64)]) -> Vec<Candle> {
        bars.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| Candle {
                open_time: i as i64 * 60_000,
                open: close,
                high,
                low,
                close,
                volume: 1.0,
            })
            .collect()
    }

    /// A gently oscillating uptrend with enough structure to exercise every indicator.
    pub fn trending(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.5 + ((i as f64) * 0.7).sin() * 2.0;
                Candle {
                    open_time: i as i64 * 60_000,
                    open: base - 0.3,
                    high: base + 1.0,
                    low: base - 1.0,
                    close: base,
                    volume: 100.0 + (i % 7) as f64 * 10.0,
                }
            })
            .collect()
    }
}
