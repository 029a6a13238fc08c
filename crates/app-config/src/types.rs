// In crates/app-config/src/types.rs

use core_types::{EvaluatorConfig, InstrumentId, Interval};
use risk::GateSettings;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Candle aggregation and indicator cadence.
    #[serde(default)]
    pub engine: EngineSettings,
    /// Which signal evaluator to run and its thresholds.
    #[serde(default)]
    pub signals: EvaluatorConfig,
    /// Cooldown between accepted decisions.
    #[serde(default)]
    pub gate: GateSettings,
    /// Tick feed and historical-data endpoints.
    pub feed: FeedSettings,
    #[serde(default)]
    pub execution: ExecutionSettings,
    pub server: ServerSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EngineSettings {
    /// Candle width for the live path.
    pub interval: Interval,
    /// Closed candles kept per instrument.
    pub max_history: usize,
    /// Prior RSI samples kept for lookback predicates.
    pub rsi_history_len: usize,
    /// An instrument with no tick for this long is not traded.
    pub stale_after_secs: u64,
    /// Offset of the exchange session from UTC, used to find the trading day.
    pub session_utc_offset_minutes: i32,
    /// Cadence of the fresh (historical) recompute.
    pub refresh_period_secs: u64,
    /// Extra history fetched before the session start so ADX can warm up.
    pub fresh_lookback_minutes: i64,
    /// ADX is withheld until this many candles are available.
    pub adx_min_candles: usize,
    /// Seed candle history from the historical collaborator at startup.
    pub warmup: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            interval: Interval::OneMinute,
            max_history: 500,
            rsi_history_len: 10,
            stale_after_secs: 120,
            session_utc_offset_minutes: 330,
            refresh_period_secs: 60,
            fresh_lookback_minutes: 300,
            adx_min_candles: 200,
            warmup: true,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct FeedSettings {
    /// WebSocket URL streaming tick JSON.
    pub ws_url: String,
    /// REST base URL for historical candles and order placement.
    pub rest_base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Paper,
    Live,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ExecutionSettings {
    pub mode: ExecutionMode,
    /// Simulated slippage for paper fills (e.g., 0.0005 for 0.05%).
    pub slippage_percent: f64,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Paper,
            slippage_percent: 0.0005,
        }
    }
}

// --- Structs for instruments.toml ---

/// The instrument list the engine subscribes to.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct InstrumentsConfig {
    #[serde(default)]
    pub instruments: Vec<InstrumentConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct InstrumentConfig {
    pub id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl InstrumentsConfig {
    /// Enabled instruments, de-duplicated, in file order.
    pub fn enabled_ids(&self) -> Vec<InstrumentId> {
        let mut ids: Vec<InstrumentId> = Vec::new();
        for instrument in self.instruments.iter().filter(|i| i.enabled) {
            let id = InstrumentId::new(instrument.id.trim());
            if !id.as_str().is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

/// Helper functions for serde defaults
fn default_enabled() -> bool { true }
fn default_request_timeout_secs() -> u64 { 10 }
