// In app/src/main.rs

use anyhow::{Context, Result};
use api_client::{ApiClient, CandleSource, TickFeed};
use app_config::{ExecutionMode, Settings};
use clap::{Parser, Subcommand};
use core_types::{InstrumentId, Tick};
use engine::{Engine, IngestOutcome, MemoryCandleSource};
use events::WsMessage;
use execution::{LiveSubmitter, OrderSubmitter, PaperSubmitter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing_subscriber::prelude::*;
use web_server::{AppState, ReplayCache};

use self::tracing_layer::{WsBroadcastLayer, log_targets};
mod tracing_layer;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Tick-to-candle indicator engine with signal evaluation and a decision gate.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Streams live ticks, refreshes historical indicators and serves the relay.
    Run,

    /// Feeds a JSON-lines tick file through the engine with paper fills.
    Replay {
        /// Path to the tick file, one tick JSON document per line.
        #[arg(short, long)]
        file: PathBuf,

        /// Overrides the configured cooldown between decisions.
        #[arg(long)]
        cooldown_secs: Option<u64>,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = app_config::load_settings().context("failed to load settings")?;

    // --- WebSocket and Tracing Setup ---
    let (ws_tx, _) = broadcast::channel::<WsMessage>(4096);
    let ws_cache = Arc::new(ReplayCache::default());
    let level = tracing::Level::from_str(&settings.app.log_level).unwrap_or(tracing::Level::INFO);
    let ws_layer = WsBroadcastLayer::new(ws_tx.clone(), ws_cache.clone()).with_filter(log_targets(level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(log_targets(level));
    tracing_subscriber::registry().with(fmt_layer).with(ws_layer).init();

    tracing::info!(environment = %settings.app.environment, "Starting tick engine");

    match cli.command {
        Commands::Run => run_app(settings, ws_tx, ws_cache).await?,
        Commands::Replay { file, cooldown_secs } => {
            handle_replay(settings, file, cooldown_secs, ws_tx).await?;
        }
    }

    tracing::info!("Tick engine has finished successfully.");
    Ok(())
}

// --- "Run" Subcommand Logic ---

/// Wires the live feed, the REST history source, the order submitter and the
/// relay server, then runs until Ctrl-C.
async fn run_app(settings: Settings, ws_tx: broadcast::Sender<WsMessage>, ws_cache: Arc<ReplayCache>) -> Result<()> {
    let instruments = app_config::load_instruments()
        .context("failed to load config/instruments.toml")?
        .enabled_ids();
    if instruments.is_empty() {
        anyhow::bail!("Cannot run: no enabled instruments in config/instruments.toml.");
    }

    let api_client = ApiClient::new(&settings.feed)?;
    let submitter: Arc<dyn OrderSubmitter> = match settings.execution.mode {
        ExecutionMode::Live => {
            tracing::warn!("LIVE TRADING IS ENABLED. REAL ORDERS WILL BE PLACED.");
            Arc::new(LiveSubmitter::new(api_client.clone()))
        }
        ExecutionMode::Paper => Arc::new(PaperSubmitter::new(settings.execution.slippage_percent)?),
    };
    let candles: Arc<dyn CandleSource> = Arc::new(api_client);

    let engine = Arc::new(Engine::from_settings(&settings, submitter, candles, ws_tx.clone())?);
    engine.replace_instruments(&instruments);
    if settings.engine.warmup {
        let seeded = engine.warm_up(chrono::Utc::now().timestamp_millis()).await;
        tracing::info!(seeded, "Warm-up complete.");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server_handle = if settings.server.enabled {
        let state = AppState {
            ws_tx: ws_tx.clone(),
            ws_cache: ws_cache.clone(),
            snapshots: engine.cache(),
        };
        web_server::spawn_cache_recorder(&ws_tx, ws_cache);
        let server_settings = settings.server.clone();
        let shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move { web_server::run(server_settings, state, shutdown).await }))
    } else {
        None
    };

    let ticks = TickFeed::new(settings.feed.ws_url.clone()).subscribe(&instruments)?;
    tracing::info!(count = instruments.len(), "Launching engine.");
    let mut engine_handle = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run(ticks, shutdown_rx).await })
    };

    let finished = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl-C received; shutting down.");
            None
        }
        result = &mut engine_handle => Some(result),
    };
    let _ = shutdown_tx.send(true);
    let engine_result = match finished {
        Some(result) => {
            tracing::error!(?result, "Engine task has terminated unexpectedly.");
            result
        }
        None => engine_handle.await,
    };
    engine_result??;

    if let Some(handle) = server_handle {
        handle.await??;
    }
    Ok(())
}

// --- "Replay" Subcommand Logic ---

/// Replays recorded ticks in file order.
///
/// Historical fetches are answered from candles built out of the same file,
/// cut off at the replay clock, so a refresh never sees later ticks. Every
/// non-log broadcast is printed to stdout as one JSON line.
async fn handle_replay(
    mut settings: Settings,
    file: PathBuf,
    cooldown_secs: Option<u64>,
    ws_tx: broadcast::Sender<WsMessage>,
) -> Result<()> {
    if let Some(cooldown_secs) = cooldown_secs {
        settings.gate.cooldown_secs = cooldown_secs;
    }

    let ticks = read_ticks(&file)?;
    let Some(first) = ticks.first() else {
        anyhow::bail!("No valid ticks in {}", file.display());
    };
    let first_timestamp = first.timestamp;

    let mut instruments: Vec<InstrumentId> = ticks.iter().map(|t| t.instrument_id.clone()).collect();
    instruments.sort();
    instruments.dedup();

    let candles = Arc::new(MemoryCandleSource::from_ticks(settings.engine.interval, &ticks));
    let paper = Arc::new(PaperSubmitter::new(settings.execution.slippage_percent)?);
    let mut rx = ws_tx.subscribe();
    let engine = Engine::from_settings(&settings, paper.clone(), candles, ws_tx)?;
    engine.replace_instruments(&instruments);
    if settings.engine.warmup {
        engine.warm_up(first_timestamp).await;
    }

    let period_ms = (settings.engine.refresh_period_secs as i64).saturating_mul(1000).max(1);
    let mut last_period = first_timestamp / period_ms;
    let mut sealed = 0usize;

    for tick in &ticks {
        let period = tick.timestamp / period_ms;
        if period > last_period {
            engine.refresh_all(tick.timestamp).await;
            last_period = period;
        }
        if let IngestOutcome::Sealed(_) = engine.on_tick(tick) {
            sealed += 1;
        }
        // Give the spawned submission a chance to report first.
        tokio::task::yield_now().await;
        print_events(&mut rx);
    }

    engine.drain_submissions().await;
    print_events(&mut rx);

    tracing::info!(
        ticks = ticks.len(),
        sealed,
        fills = paper.fills().len(),
        "Replay finished."
    );
    Ok(())
}

fn read_ticks(file: &Path) -> Result<Vec<Tick>> {
    let content = std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let mut ticks = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match api_client::parse_tick(line) {
            Ok(tick) => ticks.push(tick),
            Err(e) => tracing::warn!(line = line_no + 1, error = %e, "Skipping unreadable tick."),
        }
    }
    Ok(ticks)
}

fn print_events(rx: &mut broadcast::Receiver<WsMessage>) {
    loop {
        match rx.try_recv() {
            Ok(WsMessage::Log(_)) => {}
            Ok(msg) => match serde_json::to_string(&msg) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!(error = %e, "Failed to serialize event."),
            },
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Replay output lagged; events dropped.");
            }
            Err(_) => break,
        }
    }
}
