// In crates/strategies/src/ema_trend.rs

use crate::conditions::{above, below};
use crate::types::EmaTrendSettings;
use crate::{ConditionSet, Evaluation, SignalEvaluator};
use core_types::IndicatorSnapshot;

/// Trend-following variant: price riding above stacked EMAs with rising RSI.
///
/// Fires earlier in a move than the momentum breakout and anchors on VWMA(20)
/// as well as VWAP.
#[derive(Debug, Clone, Default)]
pub struct EmaTrend {
    settings: EmaTrendSettings,
}

impl EmaTrend {
    pub fn new(settings: EmaTrendSettings) -> Self {
        Self { settings }
    }
}

impl SignalEvaluator for EmaTrend {
    fn name(&self) -> &'static str {
        "ema_trend"
    }

    fn evaluate(&self, s: &IndicatorSnapshot) -> Evaluation {
        let cfg = &self.settings;
        let prior_rsi = s.rsi_history.last().copied();

        let mut buy = ConditionSet::new();
        buy.push("rsi_above_midline", above(s.rsi, Some(cfg.rsi_midline)))
            .push("rsi_below_ceiling", below(s.rsi, Some(cfg.rsi_buy_ceiling)))
            .push("rsi_rising", above(s.rsi, prior_rsi))
            .push("ltp_above_ema9", above(s.ltp, s.ema9))
            .push("ema9_above_ema21", above(s.ema9, s.ema21))
            .push("ema9_above_vwap", above(s.ema9, s.vwap))
            .push("ema9_above_vwma20", above(s.ema9, s.vwma20))
            .push("atr_percent_above_floor", above(s.atr_percent, Some(cfg.atr_percent_floor)))
            .push("adx_above_floor", above(s.adx, Some(cfg.adx_floor)))
            .push("plus_di_above_minus_di", above(s.plus_di, s.minus_di))
            .push("macd_histogram_positive", above(s.macd_histogram, Some(0.0)));

        let mut sell = ConditionSet::new();
        sell.push("rsi_below_midline", below(s.rsi, Some(cfg.rsi_midline)))
            .push("rsi_above_floor", above(s.rsi, Some(cfg.rsi_sell_floor)))
            .push("rsi_falling", below(s.rsi, prior_rsi))
            .push("ltp_below_ema9", below(s.ltp, s.ema9))
            .push("ema9_below_ema21", below(s.ema9, s.ema21))
            .push("ema9_below_vwap", below(s.ema9, s.vwap))
            .push("ema9_below_vwma20", below(s.ema9, s.vwma20))
            .push("atr_percent_above_floor", above(s.atr_percent, Some(cfg.atr_percent_floor)))
            .push("adx_above_floor", above(s.adx, Some(cfg.adx_floor)))
            .push("minus_di_above_plus_di", above(s.minus_di, s.plus_di))
            .push("macd_histogram_negative", below(s.macd_histogram, Some(0.0)));

        Evaluation::from_conditions(buy, sell)
    }
}
