use crate::finite;
use core_types::Candle;

/// `max(high − low, |high − prev_close|, |low − prev_close|)`.
pub fn true_range(candle: &Candle, prev_close: Option<f64>) -> f64 {
    match prev_close {
        Some(pc) => (candle.high - candle.low)
            .max((candle.high - pc).abs())
            .max((candle.low - pc).abs()),
        None => candle.high - candle.low,
    }
}

/// Average True Range with Wilder smoothing.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    sum: f64,
    count: usize,
    value: Option<f64>,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_close: None,
            sum: 0.0,
            count: 0,
            value: None,
        }
    }

    pub fn update(&mut self, candle: &Candle) -> Option<f64> {
        if self.period == 0 || candle.validate().is_err() {
            return self.value;
        }

        // The first bar has no previous close, so it only primes the state.
        let Some(prev_close) = self.prev_close.replace(candle.close) else {
            return None;
        };
        let tr = true_range(candle, Some(prev_close));

        match self.value {
            Some(prev) => {
                let n = self.period as f64;
                self.value = finite((prev * (n - 1.0) + tr) / n);
            }
            None => {
                self.sum += tr;
                self.count += 1;
                if self.count >= self.period {
                    self.value = finite(self.sum / self.period as f64);
                }
            }
        }
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtrOutput {
    pub atr: f64,
    /// `atr / last_close · 100`; `None` when the last close is zero.
    pub atr_percent: Option<f64>,
}

pub fn atr(candles: &[Candle], period: usize) -> Option<AtrOutput> {
    let mut atr = Atr::new(period);
    let value = candles.iter().fold(None, |_, c| atr.update(c))?;
    let last_close = candles.last()?.close;
    let atr_percent = if last_close != 0.0 {
        finite(value / last_close * 100.0)
    } else {
        None
    };
    Some(AtrOutput { atr: value, atr_percent })
}
