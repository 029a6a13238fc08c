// In crates/strategies/src/momentum_breakout.rs

use crate::conditions::{above, below};
use crate::types::MomentumBreakoutSettings;
use crate::{ConditionSet, Evaluation, SignalEvaluator};
use core_types::IndicatorSnapshot;

/// Eleven-condition momentum breakout.
///
/// BUY needs RSI inside the upper momentum band without having already
/// overshot it, both EMAs above VWAP and stacked, enough volatility, an
/// established up-trend and a bullish MACD. SELL is the mirror image.
#[derive(Debug, Clone, Default)]
pub struct MomentumBreakout {
    settings: MomentumBreakoutSettings,
}

impl MomentumBreakout {
    pub fn new(settings: MomentumBreakoutSettings) -> Self {
        Self { settings }
    }

    /// The last `rsi_lookback` prior samples, or `None` if fewer exist.
    fn lookback<'a>(&self, snapshot: &'a IndicatorSnapshot) -> Option<&'a [f64]> {
        let history = &snapshot.rsi_history;
        let n = self.settings.rsi_lookback;
        (history.len() >= n).then(|| &history[history.len() - n..])
    }

    fn buy_conditions(&self, s: &IndicatorSnapshot) -> ConditionSet {
        let cfg = &self.settings;
        let not_extended = self
            .lookback(s)
            .is_some_and(|prior| prior.iter().all(|v| *v <= cfg.rsi_buy_ceiling));

        let mut set = ConditionSet::new();
        set.push("rsi_above_band_floor", above(s.rsi, Some(cfg.rsi_buy_floor)))
            .push("rsi_below_band_ceiling", below(s.rsi, Some(cfg.rsi_buy_ceiling)))
            .push("rsi_not_extended", s.rsi.is_some() && not_extended)
            .push("ema9_above_vwap", above(s.ema9, s.vwap))
            .push("ema21_above_vwap", above(s.ema21, s.vwap))
            .push("ema9_above_ema21", above(s.ema9, s.ema21))
            .push("atr_percent_above_floor", above(s.atr_percent, Some(cfg.atr_percent_floor)))
            .push("adx_above_floor", above(s.adx, Some(cfg.adx_floor)))
            .push("plus_di_above_minus_di", above(s.plus_di, s.minus_di))
            .push("macd_above_signal", above(s.macd, s.macd_signal))
            .push("macd_histogram_positive", above(s.macd_histogram, Some(0.0)));
        set
    }

    fn sell_conditions(&self, s: &IndicatorSnapshot) -> ConditionSet {
        let cfg = &self.settings;
        let not_extended = self
            .lookback(s)
            .is_some_and(|prior| prior.iter().all(|v| *v >= cfg.rsi_sell_floor));

        let mut set = ConditionSet::new();
        set.push("rsi_above_band_floor", above(s.rsi, Some(cfg.rsi_sell_floor)))
            .push("rsi_below_band_ceiling", below(s.rsi, Some(cfg.rsi_sell_ceiling)))
            .push("rsi_not_extended", s.rsi.is_some() && not_extended)
            .push("ema9_below_vwap", below(s.ema9, s.vwap))
            .push("ema21_below_vwap", below(s.ema21, s.vwap))
            .push("ema9_below_ema21", below(s.ema9, s.ema21))
            .push("atr_percent_above_floor", above(s.atr_percent, Some(cfg.atr_percent_floor)))
            .push("adx_above_floor", above(s.adx, Some(cfg.adx_floor)))
            .push("minus_di_above_plus_di", above(s.minus_di, s.plus_di))
            .push("macd_below_signal", below(s.macd, s.macd_signal))
            .push("macd_histogram_negative", below(s.macd_histogram, Some(0.0)));
        set
    }
}

impl SignalEvaluator for MomentumBreakout {
    fn name(&self) -> &'static str {
        "momentum_breakout"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Evaluation {
        Evaluation::from_conditions(self.buy_conditions(snapshot), self.sell_conditions(snapshot))
    }

    fn rsi_lookback(&self) -> usize {
        self.settings.rsi_lookback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bullish() -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: Some(72.0),
            rsi_history: vec![60.0, 62.0, 63.0, 65.0, 64.0, 66.0, 67.0, 69.0, 70.0, 71.0],
            ema9: Some(105.0),
            ema21: Some(103.0),
            vwap: Some(101.0),
            vwma10: Some(104.0),
            vwma20: Some(102.0),
            adx: Some(28.0),
            plus_di: Some(30.0),
            minus_di: Some(12.0),
            macd: Some(0.8),
            macd_signal: Some(0.5),
            macd_histogram: Some(0.3),
            atr: Some(0.6),
            atr_percent: Some(0.57),
            ltp: Some(105.2),
            ..Default::default()
        }
    }

    fn bearish() -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: Some(28.0),
            rsi_history: vec![40.0, 38.0, 37.0, 35.0, 36.0, 34.0, 33.0, 31.0, 30.0, 29.0],
            ema9: Some(95.0),
            ema21: Some(97.0),
            vwap: Some(99.0),
            adx: Some(28.0),
            plus_di: Some(10.0),
            minus_di: Some(31.0),
            macd: Some(-0.8),
            macd_signal: Some(-0.5),
            macd_histogram: Some(-0.3),
            atr_percent: Some(0.6),
            ..Default::default()
        }
    }

    #[test]
    fn bullish_snapshot_fires_buy_with_all_eleven_conditions() {
        let eval = MomentumBreakout::default().evaluate(&bullish());
        assert_eq!(eval.buy_conditions.len(), 11);
        assert!(eval.buy, "failed: {:?}", eval.buy_conditions.failed().collect::<Vec<_>>());
        assert!(!eval.sell);
    }

    #[test]
    fn bearish_snapshot_fires_sell() {
        let eval = MomentumBreakout::default().evaluate(&bearish());
        assert_eq!(eval.sell_conditions.len(), 11);
        assert!(eval.sell, "failed: {:?}", eval.sell_conditions.failed().collect::<Vec<_>>());
        assert!(!eval.buy);
    }

    #[test]
    fn already_extended_rsi_blocks_buy() {
        let mut snapshot = bullish();
        snapshot.rsi_history[4] = 83.0;
        let eval = MomentumBreakout::default().evaluate(&snapshot);
        assert!(!eval.buy);
        assert_eq!(eval.buy_conditions.get("rsi_not_extended"), Some(false));
        assert_eq!(eval.buy_conditions.failed().count(), 1);
    }

    #[test]
    fn short_rsi_history_is_not_a_pass() {
        let mut snapshot = bullish();
        snapshot.rsi_history.truncate(5);
        let eval = MomentumBreakout::default().evaluate(&snapshot);
        assert_eq!(eval.buy_conditions.get("rsi_not_extended"), Some(false));
        assert!(!eval.buy);
    }

    #[test]
    fn longer_lookback_needs_and_uses_a_longer_history() {
        let evaluator = MomentumBreakout::new(MomentumBreakoutSettings {
            rsi_lookback: 12,
            ..Default::default()
        });
        assert_eq!(evaluator.rsi_lookback(), 12);

        let mut snapshot = bullish();
        assert!(!evaluator.evaluate(&snapshot).buy);

        snapshot.rsi_history.splice(0..0, [58.0, 59.0]);
        let eval = evaluator.evaluate(&snapshot);
        assert!(eval.buy, "failed: {:?}", eval.buy_conditions.failed().collect::<Vec<_>>());

        snapshot.rsi_history[0] = 85.0;
        assert_eq!(evaluator.evaluate(&snapshot).buy_conditions.get("rsi_not_extended"), Some(false));
    }

    #[test]
    fn missing_fields_fail_only_their_own_conditions() {
        let mut snapshot = bullish();
        snapshot.vwap = None;
        snapshot.adx = None;
        let eval = MomentumBreakout::default().evaluate(&snapshot);
        assert!(!eval.buy);
        let failed: Vec<_> = eval.buy_conditions.failed().collect();
        assert_eq!(failed, vec!["ema9_above_vwap", "ema21_above_vwap", "adx_above_floor"]);
    }

    #[test]
    fn empty_snapshot_never_fires() {
        let eval = MomentumBreakout::default().evaluate(&IndicatorSnapshot::default());
        assert!(!eval.buy && !eval.sell);
        assert!(eval.buy_conditions.iter().all(|c| !c.passed));
        assert!(eval.sell_conditions.iter().all(|c| !c.passed));
    }

    #[test]
    fn rsi_outside_band_fails() {
        let mut snapshot = bullish();
        snapshot.rsi = Some(81.0);
        let eval = MomentumBreakout::default().evaluate(&snapshot);
        assert_eq!(eval.buy_conditions.get("rsi_below_band_ceiling"), Some(false));
        assert!(!eval.buy);
    }
}
