// In crates/execution/src/types.rs

use core_types::{InstrumentId, Side};
use rust_decimal::Decimal;
use serde::Serialize;

/// A simulated fill recorded by the paper submitter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperFill {
    pub order_id: String,
    pub instrument_id: InstrumentId,
    pub side: Side,
    /// The decision price the order was submitted at.
    pub requested_price: Decimal,
    /// The requested price moved against the order by the configured slippage.
    pub fill_price: Decimal,
}
