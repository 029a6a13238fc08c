// In crates/api-client/src/feed.rs

use crate::types::SubscribeRequest;
use crate::{Error, Result};
use async_stream::stream;
use core_types::{InstrumentId, Tick};
use futures::Stream;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// A reconnecting WebSocket subscription to the broker's tick stream.
#[derive(Debug, Clone)]
pub struct TickFeed {
    url: String,
}

impl TickFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Subscribes to `instruments` and yields validated ticks.
    ///
    /// Frames that fail to parse or validate are dropped with a warning.
    /// Connection errors trigger a reconnect after a fixed delay; the stream
    /// itself never ends.
    pub fn subscribe(&self, instruments: &[InstrumentId]) -> Result<impl Stream<Item = Tick> + Send + 'static> {
        let url = self.url.clone();
        let count = instruments.len();
        let frame = serde_json::to_string(&SubscribeRequest { action: "subscribe", instruments })?;

        Ok(stream! {
            loop {
                tracing::info!(url = %url, "Connecting to tick stream...");
                let (ws_stream, _) = match connect_async(&url).await {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::error!(error = %e, "WebSocket connection failed. Retrying in 5s...");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                        continue;
                    }
                };
                tracing::info!(instruments = count, "Tick stream connected.");

                let (mut write, read) = ws_stream.split();
                if let Err(e) = write.send(Message::text(frame.clone())).await {
                    tracing::warn!(error = %e, "Subscription failed. Reconnecting...");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                    continue;
                }

                let mut read = read.fuse();
                while let Some(message) = read.next().await {
                    match message {
                        Ok(Message::Text(text)) => match parse_tick(text.as_str()) {
                            Ok(tick) => yield tick,
                            Err(e) => tracing::warn!(error = %e, "Dropping tick frame."),
                        },
                        Ok(Message::Close(_)) => {
                            tracing::warn!("Tick stream closed by server. Reconnecting...");
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "Error reading from tick stream. Reconnecting...");
                            break;
                        }
                    }
                }
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        })
    }
}

/// Parses and validates one tick JSON document.
pub fn parse_tick(text: &str) -> Result<Tick> {
    let tick: Tick = serde_json::from_str(text)?;
    tick.validate().map_err(Error::InvalidData)?;
    Ok(tick)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feed_frame() {
        let tick = parse_tick(
            r#"{"instrumentId":"NSE:TCS","lastPrice":3850.5,"cumulativeVolume":120000,"timestamp":1700000000000,"dayOpen":3820.0}"#,
        )
        .unwrap();
        assert_eq!(tick.instrument_id, InstrumentId::from("NSE:TCS"));
        assert_eq!(tick.day_open, Some(3820.0));
        assert_eq!(tick.prev_close, None);
    }

    #[test]
    fn rejects_malformed_and_invalid_frames() {
        assert!(matches!(parse_tick("not json"), Err(Error::DeserializationFailed(_))));
        assert!(matches!(
            parse_tick(r#"{"instrumentId":"NSE:TCS","lastPrice":-1,"timestamp":1700000000000}"#),
            Err(Error::InvalidData(_))
        ));
    }
}
