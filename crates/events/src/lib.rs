// --- Broadcast Message Structures ---

use chrono::{DateTime, Utc};
use core_types::{IndicatorSnapshot, InstrumentId, Side, TradeDecision};
use serde::Serialize;
use strategies::ConditionSet;

/// Represents a log message event to be sent to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct WsLogMessage {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
}

/// The latest indicator values for one instrument and what they imply.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotUpdate {
    pub instrument_id: InstrumentId,
    pub snapshot: IndicatorSnapshot,
    pub buy_signal: bool,
    pub sell_signal: bool,
    pub buy_conditions: ConditionSet,
    pub sell_conditions: ConditionSet,
    pub timestamp: i64,
}

/// What the order collaborator said about an accepted decision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOutcome {
    pub instrument_id: InstrumentId,
    pub side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
}

/// The top-level broadcast message enum.
/// The `type` tag sits alongside the payload's own fields in the JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    Log(WsLogMessage),
    IndicatorSnapshot(SnapshotUpdate),
    TradeDecision(TradeDecision),
    OrderResult(OrderOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_event_is_flat_and_tagged() {
        let msg = WsMessage::IndicatorSnapshot(SnapshotUpdate {
            instrument_id: InstrumentId::from("NSE:SBIN"),
            snapshot: IndicatorSnapshot { rsi: Some(55.0), ..Default::default() },
            buy_signal: false,
            sell_signal: false,
            buy_conditions: ConditionSet::new(),
            sell_conditions: ConditionSet::new(),
            timestamp: 42,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "indicator_snapshot");
        assert_eq!(value["instrumentId"], "NSE:SBIN");
        assert_eq!(value["snapshot"]["rsi"], 55.0);
        assert_eq!(value["buySignal"], false);
        assert_eq!(value["timestamp"], 42);
    }

    #[test]
    fn trade_decision_event_carries_reasons() {
        let msg = WsMessage::TradeDecision(TradeDecision {
            instrument_id: InstrumentId::from("NSE:SBIN"),
            side: Side::Sell,
            price: 612.4,
            reason_code: "momentum_breakout".into(),
            reasons: vec!["macd_below_signal".into()],
            timestamp: 7,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "trade_decision");
        assert_eq!(value["side"], "SELL");
        assert_eq!(value["reasons"][0], "macd_below_signal");
        assert_eq!(value["reasonCode"], "momentum_breakout");
    }
}
