// In crates/core-types/src/lib.rs

pub mod error;
pub mod snapshot;
pub mod strategy;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use error::{Error, Result};
pub use snapshot::{IndicatorSnapshot, SnapshotField};
pub use strategy::EvaluatorConfig;
pub use types::{
    Candle, InstrumentId, Interval, OrderRequest, OrderResult, Side, Tick, TradeDecision,
};
