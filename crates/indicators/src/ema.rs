use crate::finite;

/// Exponential Moving Average, seeded by a simple average.
///
/// The first `period` observations are averaged to produce the seed; after
/// that each observation is folded in with `ema = price·k + ema·(1−k)`,
/// `k = 2/(period+1)`. Nothing is emitted before the seed exists.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    k: f64,
    seed_sum: f64,
    count: usize,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            k: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            count: 0,
            value: None,
        }
    }

    /// Feed one observation, return the EMA once warm.
    pub fn update(&mut self, price: f64) -> Option<f64> {
        if self.period == 0 || !price.is_finite() {
            return self.value;
        }

        match self.value {
            Some(prev) => {
                self.value = finite(price * self.k + prev * (1.0 - self.k));
            }
            None => {
                self.seed_sum += price;
                self.count += 1;
                if self.count >= self.period {
                    self.value = finite(self.seed_sum / self.period as f64);
                }
            }
        }
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// EMA of the whole series, `None` when fewer than `period` values exist.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    let mut ema = Ema::new(period);
    values.iter().fold(None, |_, v| ema.update(*v))
}

/// Per-element EMA values aligned with `values`.
pub fn ema_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut ema = Ema::new(period);
    values.iter().map(|v| ema.update(*v)).collect()
}
