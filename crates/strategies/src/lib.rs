// In crates/strategies/src/lib.rs

use core_types::IndicatorSnapshot;

pub mod conditions;
pub mod ema_trend;
pub mod factory;
pub mod momentum_breakout;
pub mod types;

pub use conditions::{Condition, ConditionSet, Evaluation};
pub use factory::create_evaluator;

/// The universal interface for a signal evaluator.
///
/// An evaluator is a pure function of the latest indicator snapshot: it owns
/// no state, so one instance can be shared by every instrument.
pub trait SignalEvaluator: Send + Sync {
    /// The name of the evaluator, used as the decision's reason code.
    fn name(&self) -> &'static str;

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Evaluation;

    /// Prior RSI samples the evaluator inspects. The engine keeps at least
    /// this many in each snapshot's `rsi_history`.
    fn rsi_lookback(&self) -> usize {
        0
    }
}
