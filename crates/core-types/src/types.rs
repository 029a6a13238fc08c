// In crates/core-types/src/types.rs

use crate::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies a tradable instrument (e.g. "NSE:RELIANCE" or "BTCUSDT").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(pub String);

impl InstrumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The direction of a trade decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candle widths understood by the historical-data collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "60m")]
    SixtyMinutes,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::SixtyMinutes => "60m",
        }
    }

    pub fn as_millis(&self) -> i64 {
        match self {
            Interval::OneMinute => 60_000,
            Interval::FiveMinutes => 300_000,
            Interval::FifteenMinutes => 900_000,
            Interval::SixtyMinutes => 3_600_000,
        }
    }

    /// Truncates an epoch-millis timestamp to the start of its bucket.
    pub fn bucket_start(&self, timestamp: i64) -> i64 {
        timestamp - timestamp.rem_euclid(self.as_millis())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1m" => Ok(Interval::OneMinute),
            "5m" => Ok(Interval::FiveMinutes),
            "15m" => Ok(Interval::FifteenMinutes),
            "60m" | "1h" => Ok(Interval::SixtyMinutes),
            other => Err(Error::UnknownInterval(other.to_string())),
        }
    }
}

/// A single real-time price/volume update, as delivered by the tick feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tick {
    pub instrument_id: InstrumentId,
    pub last_price: f64,
    /// Volume traded so far in the session, not the volume of this tick.
    #[serde(default)]
    pub cumulative_volume: f64,
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_close: Option<f64>,
}

impl Tick {
    /// Rejects ticks that cannot be folded into a candle.
    pub fn validate(&self) -> Result<()> {
        let reject = |reason: &str| Error::MalformedTick {
            instrument: self.instrument_id.0.clone(),
            reason: reason.to_string(),
        };

        if self.instrument_id.0.trim().is_empty() {
            return Err(reject("empty instrument id"));
        }
        if !self.last_price.is_finite() || self.last_price <= 0.0 {
            return Err(reject("price must be a positive finite number"));
        }
        if !self.cumulative_volume.is_finite() || self.cumulative_volume < 0.0 {
            return Err(reject("cumulative volume must be a non-negative finite number"));
        }
        if self.timestamp <= 0 {
            return Err(reject("timestamp must be positive epoch millis"));
        }
        Ok(())
    }
}

/// An OHLCV aggregate over one interval bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    /// Bucket start, epoch milliseconds.
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// A fresh candle whose OHLC all equal the first traded price.
    pub fn opened_at(open_time: i64, price: f64) -> Self {
        Self {
            open_time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
        }
    }

    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Checks `low <= min(open, close) <= max(open, close) <= high` and finiteness.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidCandle {
            open_time: self.open_time,
            reason: reason.to_string(),
        };

        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(invalid("non-finite field"));
        }
        if self.volume < 0.0 {
            return Err(invalid("negative volume"));
        }
        if self.low > self.open.min(self.close) || self.high < self.open.max(self.close) {
            return Err(invalid("open/close outside the high-low range"));
        }
        if self.low > self.high {
            return Err(invalid("low above high"));
        }
        Ok(())
    }
}

/// A decision that passed the gate and is on its way to the order collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDecision {
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub price: f64,
    pub reason_code: String,
    pub reasons: Vec<String>,
    pub timestamp: i64,
}

impl TradeDecision {
    pub fn to_order_request(&self) -> Result<OrderRequest> {
        let price = Decimal::from_f64(self.price)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or(Error::InvalidPrice(self.price))?;

        Ok(OrderRequest {
            instrument_id: self.instrument_id.clone(),
            side: self.side,
            price,
        })
    }
}

/// The payload handed to an order submitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub price: Decimal,
}

/// What the order collaborator reports back after a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResult {
    pub order_id: String,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(price: f64, volume: f64) -> Tick {
        Tick {
            instrument_id: InstrumentId::from("NSE:INFY"),
            last_price: price,
            cumulative_volume: volume,
            timestamp: 1_700_000_000_000,
            day_open: None,
            prev_close: None,
        }
    }

    #[test]
    fn bucket_start_truncates_to_interval() {
        let t = 1_700_000_059_999;
        assert_eq!(Interval::OneMinute.bucket_start(t), 1_700_000_040_000);
        assert_eq!(Interval::OneMinute.bucket_start(1_700_000_040_000), 1_700_000_040_000);
        assert_eq!(Interval::FiveMinutes.bucket_start(t) % 300_000, 0);
    }

    #[test]
    fn interval_parses_feed_names() {
        assert_eq!("15m".parse::<Interval>().unwrap(), Interval::FifteenMinutes);
        assert_eq!("1h".parse::<Interval>().unwrap(), Interval::SixtyMinutes);
        assert!("2m".parse::<Interval>().is_err());
    }

    #[test]
    fn tick_validation_rejects_bad_prices_and_volumes() {
        assert!(tick(100.0, 10.0).validate().is_ok());
        assert!(tick(0.0, 10.0).validate().is_err());
        assert!(tick(f64::NAN, 10.0).validate().is_err());
        assert!(tick(100.0, -1.0).validate().is_err());
    }

    #[test]
    fn tick_deserializes_from_feed_json() {
        let json = r#"{"instrumentId":"NSE:INFY","lastPrice":1510.5,"cumulativeVolume":12000,"timestamp":1700000000000,"prevClose":1498.0}"#;
        let parsed: Tick = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.instrument_id.as_str(), "NSE:INFY");
        assert_eq!(parsed.prev_close, Some(1498.0));
        assert_eq!(parsed.day_open, None);
    }

    #[test]
    fn candle_validation_enforces_ohlc_ordering() {
        let good = Candle { open_time: 0, open: 10.0, high: 12.0, low: 9.0, close: 11.0, volume: 5.0 };
        assert!(good.validate().is_ok());

        let bad = Candle { high: 10.5, ..good };
        assert!(bad.validate().is_err());

        let inverted = Candle { high: 8.0, low: 13.0, ..good };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn decision_converts_to_order_request() {
        let decision = TradeDecision {
            instrument_id: InstrumentId::from("NSE:INFY"),
            side: Side::Buy,
            price: 1510.25,
            reason_code: "momentum_breakout".into(),
            reasons: vec![],
            timestamp: 0,
        };
        let order = decision.to_order_request().unwrap();
        assert_eq!(order.price.to_string(), "1510.25");

        let broken = TradeDecision { price: f64::NAN, ..decision };
        assert!(broken.to_order_request().is_err());
    }
}
