// In crates/risk/src/types.rs

use core_types::{InstrumentId, Side};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct GateSettings {
    /// Minimum time between accepted decisions for one instrument.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

fn default_cooldown_secs() -> u64 {
    300
}

/// The last accepted decision for an instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownEntry {
    pub instrument_id: InstrumentId,
    pub last_order_timestamp: i64,
    pub last_order_type: Side,
}
