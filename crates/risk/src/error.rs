// In crates/risk/src/error.rs

use core_types::InstrumentId;
use thiserror::Error;

/// Why the gate refused a fired signal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Cooldown active for {instrument}: {remaining_ms} ms remaining")]
    CooldownActive {
        instrument: InstrumentId,
        remaining_ms: i64,
    },

    #[error("Another order submission is in flight")]
    OrderInFlight,
}

pub type Result<T> = std::result::Result<T, Error>;
