// In crates/api-client/src/lib.rs

use app_config::FeedSettings;
use async_trait::async_trait;
use chrono::Utc;
use core_types::{Candle, InstrumentId, Interval, OrderRequest};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use std::time::Duration;

// Create a type alias for the HMAC-SHA256 implementation.
type HmacSha256 = Hmac<Sha256>;

pub mod error;
pub mod feed;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use feed::{TickFeed, parse_tick};
pub use types::*;

/// Historical candle provider used by the fresh indicator path and warm-up.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Candles for `instrument` whose open time lies in `[from, to]` (epoch millis),
    /// oldest first.
    async fn fetch_candles(
        &self,
        instrument: &InstrumentId,
        interval: Interval,
        from: i64,
        to: i64,
    ) -> Result<Vec<Candle>>;
}

impl ApiClient {
    /// Constructs a new ApiClient from the feed settings.
    pub fn new(settings: &FeedSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(ApiClient {
            http_client,
            api_key: settings.api_key.clone(),
            secret_key: settings.secret_key.clone(),
            base_url: settings.rest_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Hex-encoded HMAC-SHA256 of `payload` under the secret key.
    fn sign(&self, payload: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| Error::SigningError(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Appends `timestamp` and `signature` to a URL-encoded parameter string.
    fn create_signed_query(&self, params: &mut String) -> Result<()> {
        let timestamp = Utc::now().timestamp_millis();
        if !params.is_empty() {
            params.push('&');
        }
        params.push_str(&format!("timestamp={}", timestamp));

        let signature = self.sign(params)?;
        params.push_str(&format!("&signature={}", signature));
        Ok(())
    }

    /// Fetches historical candles.
    ///
    /// This corresponds to the `GET /api/v1/candles` endpoint. Rows that do
    /// not parse or fail candle validation are dropped with a warning.
    pub async fn get_historical_candles(
        &self,
        instrument: &InstrumentId,
        interval: Interval,
        from: i64,
        to: i64,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/api/v1/candles?instrumentId={}&interval={}&from={}&to={}",
            self.base_url, instrument, interval, from, to
        );

        let response_body = self
            .http_client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?
            .text()
            .await?;

        let raw_candles: Vec<RawCandle> = serde_json::from_str(&response_body).map_err(|e| {
            // If deserialization fails, it might be an error object.
            api_error(&response_body).unwrap_or(Error::DeserializationFailed(e))
        })?;

        let mut candles: Vec<Candle> = raw_candles
            .into_iter()
            .filter_map(|raw| {
                let candle = to_candle(&raw)?;
                match candle.validate() {
                    Ok(()) => Some(candle),
                    Err(e) => {
                        tracing::warn!(instrument = %instrument, error = %e, "Dropping invalid historical candle.");
                        None
                    }
                }
            })
            .filter(|c| c.open_time >= from && c.open_time <= to)
            .collect();
        candles.sort_by_key(|c| c.open_time);
        candles.dedup_by_key(|c| c.open_time);

        tracing::debug!(instrument = %instrument, count = candles.len(), "Historical candles fetched.");
        Ok(candles)
    }

    /// Places a limit order at the decision price.
    /// Corresponds to `POST /api/v1/order`.
    pub async fn place_order(&self, order: &OrderRequest) -> Result<NewOrderResponse> {
        let mut params = format!(
            "instrumentId={}&side={}&type=LIMIT&price={}",
            order.instrument_id, order.side, order.price
        );
        self.create_signed_query(&mut params)?;

        let url = format!("{}/api/v1/order", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(params)
            .send()
            .await?;

        let text = response.text().await?;
        if let Some(err) = api_error(&text) {
            return Err(err);
        }
        let order_response: NewOrderResponse = serde_json::from_str(&text)?;
        Ok(order_response)
    }
}

#[async_trait]
impl CandleSource for ApiClient {
    async fn fetch_candles(
        &self,
        instrument: &InstrumentId,
        interval: Interval,
        from: i64,
        to: i64,
    ) -> Result<Vec<Candle>> {
        self.get_historical_candles(instrument, interval, from, to).await
    }
}

fn to_candle(raw: &RawCandle) -> Option<Candle> {
    Some(Candle {
        open_time: raw.0,
        open: raw.1.as_f64()?,
        high: raw.2.as_f64()?,
        low: raw.3.as_f64()?,
        close: raw.4.as_f64()?,
        volume: raw.5.as_f64()?,
    })
}

/// Extracts `{ "code": .., "msg": .. }` error bodies. A zero code is success.
fn api_error(body: &str) -> Option<Error> {
    let value: Value = serde_json::from_str(body).ok()?;
    let code = value.get("code").and_then(Value::as_i64)?;
    if code == 0 {
        return None;
    }
    let msg = value.get("msg").and_then(Value::as_str).unwrap_or("Unknown error").to_string();
    Some(Error::ApiError { code, msg })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(secret: &str) -> ApiClient {
        ApiClient::new(&FeedSettings {
            ws_url: "ws://localhost/ticks".into(),
            rest_base_url: "http://localhost:9002/".into(),
            api_key: "key".into(),
            secret_key: secret.into(),
            request_timeout_secs: 10,
        })
        .unwrap()
    }

    #[test]
    fn signature_matches_known_vector() {
        // RFC 4231 test case 2.
        let client = client("Jefe");
        let signature = client.sign("what do ya want for nothing?").unwrap();
        assert_eq!(signature, "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843");
    }

    #[test]
    fn signed_query_appends_timestamp_then_signature() {
        let client = client("secret");
        let mut params = String::from("instrumentId=NSE:TCS&side=BUY");
        client.create_signed_query(&mut params).unwrap();

        let (unsigned, signature) = params.rsplit_once("&signature=").unwrap();
        assert!(unsigned.contains("&timestamp="));
        assert_eq!(signature, client.sign(unsigned).unwrap());
        assert_eq!(client.base_url, "http://localhost:9002");
    }

    #[test]
    fn raw_rows_accept_numbers_and_strings() {
        let rows: Vec<RawCandle> =
            serde_json::from_str(r#"[[60000, "100.5", 101, "99.5", 100.0, "1200"], [120000, "x", 1, 1, 1, 1]]"#)
                .unwrap();
        let first = to_candle(&rows[0]).unwrap();
        assert_eq!(first.open, 100.5);
        assert_eq!(first.high, 101.0);
        assert_eq!(first.volume, 1200.0);
        assert!(to_candle(&rows[1]).is_none());
    }

    #[test]
    fn error_bodies_are_recognised() {
        assert!(matches!(
            api_error(r#"{"code": -1121, "msg": "Invalid instrument."}"#),
            Some(Error::ApiError { code: -1121, .. })
        ));
        assert!(api_error(r#"{"code": 0}"#).is_none());
        assert!(api_error(r#"{"orderId": 42}"#).is_none());
    }

    #[test]
    fn numeric_order_ids_are_stringified() {
        let response: NewOrderResponse = serde_json::from_str(r#"{"orderId": 42, "status": "NEW"}"#).unwrap();
        assert_eq!(response.order_id_string(), "42");
    }
}
