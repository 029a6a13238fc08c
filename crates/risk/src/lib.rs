// In crates/risk/src/lib.rs

pub mod error;
pub mod gate;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use gate::{DecisionGate, GatePermit};
pub use types::{CooldownEntry, GateSettings};
