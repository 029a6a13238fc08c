// In app/src/tracing_layer.rs

use chrono::Utc;
use events::{WsLogMessage, WsMessage};
use std::fmt::Write;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::Targets;
use web_server::ReplayCache;

/// The event filter shared by the console and the broadcast layers.
///
/// Socket internals stay at WARN and HTTP request traces at INFO so that
/// debug logging does not flood relay clients.
pub fn log_targets(level: tracing::Level) -> Targets {
    Targets::new()
        .with_target("tungstenite", tracing::Level::WARN)
        .with_target("tokio_tungstenite", tracing::Level::WARN)
        .with_target("tower_http", tracing::Level::INFO.min(level))
        .with_default(level)
}

/// Mirrors log events onto the broadcast channel and the replay cache.
/// Attach it with `log_targets` so only the configured levels are forwarded.
pub struct WsBroadcastLayer {
    tx: broadcast::Sender<WsMessage>,
    cache: Arc<ReplayCache>,
}

impl WsBroadcastLayer {
    pub fn new(tx: broadcast::Sender<WsMessage>, cache: Arc<ReplayCache>) -> Self {
        Self { tx, cache }
    }
}

impl<S> Layer<S> for WsBroadcastLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = LogMessageVisitor::default();
        event.record(&mut visitor);
        let msg = WsMessage::Log(WsLogMessage {
            timestamp: Utc::now(),
            level: event.metadata().level().to_string(),
            message: visitor.finish(),
        });
        // Send to live clients
        let _ = self.tx.send(msg.clone());
        self.cache.push(msg);
    }
}

/// Renders the `message` field followed by the structured fields as `key=value`.
#[derive(Default)]
struct LogMessageVisitor {
    message: String,
    fields: String,
}

impl LogMessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl tracing::field::Visit for LogMessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}
