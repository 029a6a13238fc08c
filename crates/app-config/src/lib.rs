// In crates/app-config/src/lib.rs

use config::{Config, Environment, File, FileFormat};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{
    AppSettings, EngineSettings, ExecutionMode, ExecutionSettings, FeedSettings, InstrumentConfig,
    InstrumentsConfig, ServerSettings, Settings,
};

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings() -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        .add_source(File::with_name("config/base"))
        .add_source(File::with_name(&format!("config/{}", environment)).required(false))
        // e.g. `APP__GATE__COOLDOWN_SECS=120`
        .add_source(Environment::with_prefix("APP").prefix_separator("__").separator("__"))
        .build()?;

    let settings: Settings = settings.try_deserialize()?;
    validate(&settings)?;
    Ok(settings)
}

/// Parses settings from a single TOML document, without file or env layering.
pub fn settings_from_toml(content: &str) -> Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::from_str(content, FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    validate(&settings)?;
    Ok(settings)
}

/// Loads the instrument list from `config/instruments.toml`.
pub fn load_instruments() -> Result<InstrumentsConfig> {
    load_instruments_from("config/instruments.toml")
}

pub fn load_instruments_from(path: &str) -> Result<InstrumentsConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: InstrumentsConfig = toml::from_str(&content)?;
    Ok(config)
}

fn validate(settings: &Settings) -> Result<()> {
    let engine = &settings.engine;
    if engine.max_history == 0 {
        return Err(Error::Invalid("engine.max_history must be positive".into()));
    }
    if engine.refresh_period_secs == 0 {
        return Err(Error::Invalid("engine.refresh_period_secs must be positive".into()));
    }
    if engine.fresh_lookback_minutes < 0 {
        return Err(Error::Invalid("engine.fresh_lookback_minutes cannot be negative".into()));
    }
    if !(-720..=840).contains(&engine.session_utc_offset_minutes) {
        return Err(Error::Invalid(format!(
            "engine.session_utc_offset_minutes out of range: {}",
            engine.session_utc_offset_minutes
        )));
    }
    if !(0.0..1.0).contains(&settings.execution.slippage_percent) {
        return Err(Error::Invalid("execution.slippage_percent must be in [0, 1)".into()));
    }
    Ok(())
}
