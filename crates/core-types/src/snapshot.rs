// In crates/core-types/src/snapshot.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// The latest known indicator values for one instrument.
///
/// Every scalar is optional: `None` means "never computed yet". Once a field
/// has held a finite value it is only ever replaced by another finite value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    /// RSI samples preceding `rsi`, oldest first.
    pub rsi_history: Vec<f64>,
    pub ema9: Option<f64>,
    pub ema21: Option<f64>,
    pub vwap: Option<f64>,
    pub vwma10: Option<f64>,
    pub vwma20: Option<f64>,
    pub adx: Option<f64>,
    #[serde(rename = "plusDI")]
    pub plus_di: Option<f64>,
    #[serde(rename = "minusDI")]
    pub minus_di: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub atr: Option<f64>,
    pub atr_percent: Option<f64>,
    pub ltp: Option<f64>,
    pub day_open: Option<f64>,
    pub prev_close: Option<f64>,
    /// Epoch millis of the last update to any field.
    pub timestamp: Option<i64>,
}

/// The individually cacheable scalar fields of an [`IndicatorSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotField {
    Rsi,
    Ema9,
    Ema21,
    Vwap,
    Vwma10,
    Vwma20,
    Adx,
    PlusDi,
    MinusDi,
    Macd,
    MacdSignal,
    MacdHistogram,
    Atr,
    AtrPercent,
    Ltp,
    DayOpen,
    PrevClose,
}

impl SnapshotField {
    pub const ALL: [SnapshotField; 17] = [
        SnapshotField::Rsi,
        SnapshotField::Ema9,
        SnapshotField::Ema21,
        SnapshotField::Vwap,
        SnapshotField::Vwma10,
        SnapshotField::Vwma20,
        SnapshotField::Adx,
        SnapshotField::PlusDi,
        SnapshotField::MinusDi,
        SnapshotField::Macd,
        SnapshotField::MacdSignal,
        SnapshotField::MacdHistogram,
        SnapshotField::Atr,
        SnapshotField::AtrPercent,
        SnapshotField::Ltp,
        SnapshotField::DayOpen,
        SnapshotField::PrevClose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotField::Rsi => "rsi",
            SnapshotField::Ema9 => "ema9",
            SnapshotField::Ema21 => "ema21",
            SnapshotField::Vwap => "vwap",
            SnapshotField::Vwma10 => "vwma10",
            SnapshotField::Vwma20 => "vwma20",
            SnapshotField::Adx => "adx",
            SnapshotField::PlusDi => "plusDI",
            SnapshotField::MinusDi => "minusDI",
            SnapshotField::Macd => "macd",
            SnapshotField::MacdSignal => "macdSignal",
            SnapshotField::MacdHistogram => "macdHistogram",
            SnapshotField::Atr => "atr",
            SnapshotField::AtrPercent => "atrPercent",
            SnapshotField::Ltp => "ltp",
            SnapshotField::DayOpen => "dayOpen",
            SnapshotField::PrevClose => "prevClose",
        }
    }
}

impl fmt::Display for SnapshotField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IndicatorSnapshot {
    pub fn get(&self, field: SnapshotField) -> Option<f64> {
        match field {
            SnapshotField::Rsi => self.rsi,
            SnapshotField::Ema9 => self.ema9,
            SnapshotField::Ema21 => self.ema21,
            SnapshotField::Vwap => self.vwap,
            SnapshotField::Vwma10 => self.vwma10,
            SnapshotField::Vwma20 => self.vwma20,
            SnapshotField::Adx => self.adx,
            SnapshotField::PlusDi => self.plus_di,
            SnapshotField::MinusDi => self.minus_di,
            SnapshotField::Macd => self.macd,
            SnapshotField::MacdSignal => self.macd_signal,
            SnapshotField::MacdHistogram => self.macd_histogram,
            SnapshotField::Atr => self.atr,
            SnapshotField::AtrPercent => self.atr_percent,
            SnapshotField::Ltp => self.ltp,
            SnapshotField::DayOpen => self.day_open,
            SnapshotField::PrevClose => self.prev_close,
        }
    }

    pub fn slot_mut(&mut self, field: SnapshotField) -> &mut Option<f64> {
        match field {
            SnapshotField::Rsi => &mut self.rsi,
            SnapshotField::Ema9 => &mut self.ema9,
            SnapshotField::Ema21 => &mut self.ema21,
            SnapshotField::Vwap => &mut self.vwap,
            SnapshotField::Vwma10 => &mut self.vwma10,
            SnapshotField::Vwma20 => &mut self.vwma20,
            SnapshotField::Adx => &mut self.adx,
            SnapshotField::PlusDi => &mut self.plus_di,
            SnapshotField::MinusDi => &mut self.minus_di,
            SnapshotField::Macd => &mut self.macd,
            SnapshotField::MacdSignal => &mut self.macd_signal,
            SnapshotField::MacdHistogram => &mut self.macd_histogram,
            SnapshotField::Atr => &mut self.atr,
            SnapshotField::AtrPercent => &mut self.atr_percent,
            SnapshotField::Ltp => &mut self.ltp,
            SnapshotField::DayOpen => &mut self.day_open,
            SnapshotField::PrevClose => &mut self.prev_close,
        }
    }
}
