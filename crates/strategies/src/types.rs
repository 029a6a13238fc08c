// In crates/strategies/src/types.rs

use serde::{Deserialize, Serialize};

/// Thresholds for the eleven-condition momentum breakout evaluator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MomentumBreakoutSettings {
    // BUY band: RSI must sit strictly inside (floor, ceiling)
    pub rsi_buy_floor: f64,
    pub rsi_buy_ceiling: f64,

    // SELL band, the mirror of the BUY band
    pub rsi_sell_floor: f64,
    pub rsi_sell_ceiling: f64,

    /// How many prior RSI samples must stay inside the band edge.
    pub rsi_lookback: usize,

    /// Minimum ATR as a percentage of the last price.
    pub atr_percent_floor: f64,

    /// Minimum ADX for a trend to count as established.
    pub adx_floor: f64,
}

impl Default for MomentumBreakoutSettings {
    fn default() -> Self {
        Self {
            rsi_buy_floor: 68.0,
            rsi_buy_ceiling: 80.0,
            rsi_sell_floor: 20.0,
            rsi_sell_ceiling: 32.0,
            rsi_lookback: 10,
            atr_percent_floor: 0.05,
            adx_floor: 20.0,
        }
    }
}

/// Thresholds for the lighter EMA trend-following evaluator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EmaTrendSettings {
    pub rsi_midline: f64,
    pub rsi_buy_ceiling: f64,
    pub rsi_sell_floor: f64,
    pub atr_percent_floor: f64,
    pub adx_floor: f64,
}

impl Default for EmaTrendSettings {
    fn default() -> Self {
        Self {
            rsi_midline: 50.0,
            rsi_buy_ceiling: 70.0,
            rsi_sell_floor: 30.0,
            atr_percent_floor: 0.03,
            adx_floor: 18.0,
        }
    }
}
