use crate::finite;
use core_types::Candle;

/// Running `Σ(typical·volume) / Σvolume`.
///
/// The caller decides the anchoring (usually one trading session); reset by
/// building a new accumulator.
#[derive(Debug, Clone, Default)]
pub struct VwapAccumulator {
    price_volume: f64,
    volume: f64,
}

impl VwapAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, candle: &Candle) -> Option<f64> {
        if candle.validate().is_ok() {
            self.price_volume += candle.typical_price() * candle.volume;
            self.volume += candle.volume;
        }
        self.value()
    }

    /// `None` while no volume has traded.
    pub fn value(&self) -> Option<f64> {
        if self.volume > 0.0 {
            finite(self.price_volume / self.volume)
        } else {
            None
        }
    }
}

/// Session VWAP over every candle in the slice.
pub fn vwap(candles: &[Candle]) -> Option<f64> {
    let mut acc = VwapAccumulator::new();
    candles.iter().for_each(|c| {
        acc.add(c);
    });
    acc.value()
}

/// The VWAP as it stood at the close of each candle.
pub fn vwap_series(candles: &[Candle]) -> Vec<Option<f64>> {
    let mut acc = VwapAccumulator::new();
    candles.iter().map(|c| acc.add(c)).collect()
}

/// Volume-weighted moving average of closes over the trailing `period` candles.
pub fn vwma(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }
    let window = &candles[candles.len() - period..];
    let (price_volume, volume) = window
        .iter()
        .fold((0.0, 0.0), |(pv, v), c| (pv + c.close * c.volume, v + c.volume));
    if volume > 0.0 {
        finite(price_volume / volume)
    } else {
        None
    }
}
