use crate::types::{EmaTrendSettings, MomentumBreakoutSettings};
use crate::{SignalEvaluator, ema_trend::EmaTrend, momentum_breakout::MomentumBreakout};
use anyhow::Result;
use core_types::EvaluatorConfig;

/// Builds the evaluator named in the configuration.
///
/// Parameters missing from the `params` table fall back to the evaluator's
/// defaults.
pub fn create_evaluator(config: &EvaluatorConfig) -> Result<Box<dyn SignalEvaluator>> {
    let evaluator: Box<dyn SignalEvaluator> = match config.name.as_str() {
        "momentum_breakout" => {
            let settings: MomentumBreakoutSettings = config.params.clone().try_into()?;
            Box::new(MomentumBreakout::new(settings))
        }
        "ema_trend" => {
            let settings: EmaTrendSettings = config.params.clone().try_into()?;
            Box::new(EmaTrend::new(settings))
        }
        unknown => anyhow::bail!("Attempted to create unknown signal evaluator: {}", unknown),
    };

    tracing::info!(evaluator = evaluator.name(), "Signal evaluator created.");
    Ok(evaluator)
}
