mod common;

use common::*;
use core_types::{Candle, InstrumentId, Interval, SnapshotField};
use engine::{IngestOutcome, MemoryCandleSource};
use events::WsMessage;
use execution::PaperSubmitter;
use std::sync::Arc;
use strategies::momentum_breakout::MomentumBreakout;
use strategies::types::MomentumBreakoutSettings;
use tokio::sync::watch;

fn momentum_engine(candles: Arc<MemoryCandleSource>) -> (engine::Engine, tokio::sync::broadcast::Receiver<WsMessage>) {
    engine_with(
        Box::new(MomentumBreakout::default()),
        Arc::new(PaperSubmitter::new(0.0).unwrap()),
        candles,
    )
}

#[tokio::test]
async fn ticks_a_minute_apart_leave_one_sealed_and_one_open_candle() {
    let (engine, _rx) = momentum_engine(Arc::new(MemoryCandleSource::new(Interval::OneMinute)));

    assert_eq!(engine.on_tick(&tick("NSE:TCS", T, 100.0, 0.0)), IngestOutcome::Opened);
    engine.on_tick(&tick("NSE:TCS", T + 20_000, 104.5, 10.0));
    engine.on_tick(&tick("NSE:TCS", T + 40_000, 96.0, 25.0));
    let outcome = engine.on_tick(&tick("NSE:TCS", T + 61_000, 99.0, 30.0));

    let IngestOutcome::Sealed(sealed) = outcome else {
        panic!("expected a sealed candle, got {outcome:?}");
    };
    assert_eq!(sealed.open_time, T);
    assert_eq!((sealed.high, sealed.low), (104.5, 96.0));
    assert_eq!(sealed.volume, 25.0);

    let snapshot = engine.snapshot(&InstrumentId::from("NSE:TCS"));
    assert_eq!(snapshot.ltp, Some(99.0));
    assert_eq!(snapshot.timestamp, Some(T + 61_000));
}

#[tokio::test]
async fn rising_candles_after_warm_up_stack_the_emas() {
    let id = InstrumentId::from("NSE:INFY");
    let source = Arc::new(MemoryCandleSource::new(Interval::OneMinute));
    let flat: Vec<Candle> = (1..=30)
        .map(|m| Candle { open_time: T - m * MINUTE, open: 100.0, high: 100.0, low: 100.0, close: 100.0, volume: 50.0 })
        .collect();
    source.insert(id.clone(), flat);

    let (engine, _rx) = momentum_engine(source);
    engine.replace_instruments(&[id.clone()]);
    assert_eq!(engine.warm_up(T).await, 30);

    // 15 rising one-minute candles with rising volume, then one tick to seal the last.
    for m in 0..=15 {
        let ts = T + m * MINUTE;
        let price = 100.0 + m as f64;
        engine.on_tick(&tick("NSE:INFY", ts + 1_000, price, 1_000.0 * (m as f64 + 1.0)));
        engine.on_tick(&tick("NSE:INFY", ts + 30_000, price + 0.5, 1_000.0 * (m as f64 + 1.0) + 100.0 * (m as f64 + 1.0)));
    }

    let snapshot = engine.snapshot(&id);
    let (ema9, ema21) = (snapshot.ema9.unwrap(), snapshot.ema21.unwrap());
    assert!(ema9 > ema21, "ema9 {ema9} should lead ema21 {ema21}");
    assert!(snapshot.rsi.unwrap() > 95.0);
    assert!(snapshot.rsi.unwrap() <= 100.0);
    assert_eq!(snapshot.rsi_history.len(), 10);
    assert!(snapshot.atr_percent.unwrap() > 0.0);
}

#[tokio::test]
async fn rsi_history_covers_a_lookback_longer_than_configured() {
    let id = InstrumentId::from("NSE:HDFC");
    let source = Arc::new(MemoryCandleSource::new(Interval::OneMinute));
    let candles: Vec<Candle> = (1..=40)
        .map(|m| {
            let close = 100.0 + (m % 4) as f64;
            Candle { open_time: T - m * MINUTE, open: close, high: close + 1.0, low: close - 1.0, close, volume: 50.0 }
        })
        .collect();
    source.insert(id.clone(), candles);

    let evaluator = MomentumBreakout::new(MomentumBreakoutSettings { rsi_lookback: 12, ..Default::default() });
    let (engine, _rx) = engine_with(Box::new(evaluator), Arc::new(PaperSubmitter::new(0.0).unwrap()), source);
    assert_eq!(settings().rsi_history_len, 10);
    assert_eq!(engine.settings().rsi_history_len, 12);

    engine.replace_instruments(&[id.clone()]);
    engine.warm_up(T).await;
    assert_eq!(engine.snapshot(&id).rsi_history.len(), 12);
}

#[tokio::test]
async fn zero_volume_never_produces_a_volume_weighted_value() {
    let id = InstrumentId::from("NSE:ITC");
    let ticks: Vec<_> = (0..30).map(|m| tick("NSE:ITC", T + m * MINUTE + 5_000, 400.0 + m as f64, 0.0)).collect();
    let source = Arc::new(MemoryCandleSource::from_ticks(Interval::OneMinute, &ticks));

    let (engine, _rx) = momentum_engine(source);
    for t in &ticks {
        engine.on_tick(t);
    }
    engine.refresh_all(T + 30 * MINUTE).await;

    let snapshot = engine.snapshot(&id);
    assert_eq!(snapshot.vwap, None);
    assert_eq!(snapshot.vwma10, None);
    assert_eq!(snapshot.vwma20, None);
    assert!(snapshot.ema9.is_some());
}

#[tokio::test]
async fn fresh_values_survive_failed_and_short_refreshes() {
    let id = InstrumentId::from("NSE:SBIN");
    // Two ticks a minute so every candle carries volume.
    let ticks: Vec<_> = (0..40)
        .flat_map(|m| {
            let price = 600.0 + (m % 5) as f64;
            [
                tick("NSE:SBIN", T + m * MINUTE + 5_000, price, 200.0 * m as f64),
                tick("NSE:SBIN", T + m * MINUTE + 35_000, price + 0.5, 200.0 * m as f64 + 100.0),
            ]
        })
        .collect();
    let now = T + 40 * MINUTE;

    let (engine, _rx) = momentum_engine(Arc::new(MemoryCandleSource::from_ticks(Interval::OneMinute, &ticks)));
    for t in &ticks {
        engine.on_tick(t);
    }
    engine.refresh_instrument(&id, now).await.unwrap();
    let before = engine.snapshot(&id);
    assert!(before.vwap.is_some());
    assert!(before.vwma20.is_some());
    assert!(before.macd.is_some());

    // A failing collaborator leaves every field as it was.
    let (failing, _rx) = engine_with(
        Box::new(MomentumBreakout::default()),
        Arc::new(PaperSubmitter::new(0.0).unwrap()),
        Arc::new(FailingSource),
    );
    failing.cache().apply(&id, &[(SnapshotField::Vwma20, before.vwma20), (SnapshotField::Macd, before.macd)]);
    assert!(failing.refresh_instrument(&id, now).await.is_err());
    assert_eq!(failing.snapshot(&id).vwma20, before.vwma20);
    assert_eq!(failing.snapshot(&id).macd, before.macd);

    // A window too short for MACD and VWMA(20) only overwrites what it can compute.
    let short = Arc::new(MemoryCandleSource::from_ticks(Interval::OneMinute, &ticks[..24]));
    let (engine_short, _rx) = momentum_engine(short);
    engine_short.cache().apply(&id, &[(SnapshotField::Vwma20, before.vwma20)]);
    engine_short.refresh_instrument(&id, now).await.unwrap();
    let after = engine_short.snapshot(&id);
    assert_eq!(after.vwma20, before.vwma20);
    assert!(after.vwma10.is_some());
    assert_eq!(after.macd, None);
}

#[tokio::test]
async fn run_processes_a_finite_feed_and_reports_orders() {
    let (engine, mut rx) = engine_with(
        Box::new(AlwaysBuy),
        Arc::new(PaperSubmitter::new(0.0).unwrap()),
        Arc::new(MemoryCandleSource::new(Interval::OneMinute)),
    );
    let ticks = vec![
        tick("NSE:TCS", T, 100.0, 0.0),
        tick("NSE:TCS", T + 30_000, 101.0, 10.0),
        tick("NSE:TCS", T + MINUTE, 102.0, 20.0),
    ];

    // Keep the sender alive: a dropped shutdown handle reads as a shutdown request.
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    engine.run(futures::stream::iter(ticks), shutdown_rx).await.unwrap();

    let messages = drain(&mut rx);
    assert_eq!(decisions(&messages), 1);
    let order = messages.iter().find_map(|m| match m {
        WsMessage::OrderResult(outcome) => Some(outcome.clone()),
        _ => None,
    });
    let order = order.expect("order result broadcast");
    assert_eq!(order.order_id.as_deref(), Some("PAPER-1"));
    assert!(order.error.is_none());
    assert!(!engine.gate().is_order_in_flight());
}

#[tokio::test]
async fn replacing_instruments_resets_state() {
    let (engine, _rx) = momentum_engine(Arc::new(MemoryCandleSource::new(Interval::OneMinute)));
    engine.on_tick(&tick("NSE:TCS", T, 100.0, 0.0));
    assert_eq!(engine.instruments(), vec![InstrumentId::from("NSE:TCS")]);

    engine.replace_instruments(&[InstrumentId::from("NSE:WIPRO"), InstrumentId::from("NSE:INFY")]);
    assert_eq!(engine.instruments(), vec![InstrumentId::from("NSE:INFY"), InstrumentId::from("NSE:WIPRO")]);
    assert!(engine.cache().instruments().is_empty());

    // Subscribed but silent instruments are stale.
    assert_eq!(engine.stale_instruments(T).len(), 2);
    engine.on_tick(&tick("NSE:INFY", T, 1500.0, 0.0));
    assert_eq!(engine.stale_instruments(T + 1_000), vec![InstrumentId::from("NSE:WIPRO")]);
    assert_eq!(engine.stale_instruments(T + 10 * MINUTE).len(), 2);

    engine.clear_cache();
    assert_eq!(engine.snapshot(&InstrumentId::from("NSE:INFY")).ltp, None);
    assert_eq!(engine.instruments().len(), 2);
}
