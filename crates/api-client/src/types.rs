// In crates/api-client/src/types.rs

use reqwest::Client;
use serde::Deserialize;

/// The REST client for historical candles and order placement.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The persistent HTTP client, built with the configured request timeout.
    pub http_client: Client,
    pub api_key: String,
    pub secret_key: String,
    /// The base URL of the broker's REST API.
    pub base_url: String,
}

/// One row of the candles endpoint: `[openTime, open, high, low, close, volume]`.
///
/// Prices arrive either as JSON numbers or as decimal strings.
#[derive(Debug, Deserialize)]
pub struct RawCandle(
    pub i64,
    pub NumberOrString,
    pub NumberOrString,
    pub NumberOrString,
    pub NumberOrString,
    pub NumberOrString,
);

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrString::Number(n) => Some(*n),
            NumberOrString::String(s) => s.trim().parse().ok(),
        }
    }
}

/// The broker's acknowledgement of a new order.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderResponse {
    pub order_id: serde_json::Value,
    #[serde(default)]
    pub status: Option<String>,
}

impl NewOrderResponse {
    /// Order ids come back as numbers from some brokers and strings from others.
    pub fn order_id_string(&self) -> String {
        match &self.order_id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Subscription frame sent after the tick WebSocket connects.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest<'a> {
    pub action: &'static str,
    pub instruments: &'a [core_types::InstrumentId],
}
