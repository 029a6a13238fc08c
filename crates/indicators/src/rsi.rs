use std::collections::VecDeque;

/// RSI (Relative Strength Index) with Wilder smoothing of average gain/loss.
///
/// The first `period` price changes are averaged to seed the gain and loss
/// averages; afterwards `avg = (avg·(n−1) + current) / n`.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<f64>,
    gain_sum: f64,
    loss_sum: f64,
    changes: usize,
    avg_gain: f64,
    avg_loss: f64,
    value: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_close: None,
            gain_sum: 0.0,
            loss_sum: 0.0,
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            value: None,
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        // Reject non-finite closes to keep the accumulators stable.
        if self.period == 0 || !close.is_finite() {
            return self.value;
        }

        let Some(prev) = self.prev_close.replace(close) else {
            return None;
        };

        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if self.changes < self.period {
            self.gain_sum += gain;
            self.loss_sum += loss;
            self.changes += 1;
            if self.changes < self.period {
                return None;
            }
            self.avg_gain = self.gain_sum / self.period as f64;
            self.avg_loss = self.loss_sum / self.period as f64;
        } else {
            let n = self.period as f64;
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }

        let rsi = if self.avg_loss == 0.0 {
            if self.avg_gain == 0.0 { 50.0 } else { 100.0 }
        } else {
            let rs = self.avg_gain / self.avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        };
        self.value = Some(rsi.clamp(0.0, 100.0));
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// The latest RSI plus the samples that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiOutput {
    pub value: f64,
    /// Up to `history_len` prior RSI values, oldest first, excluding `value`.
    pub history: Vec<f64>,
}

/// RSI over a close series with a bounded trailing history of prior values.
pub fn rsi(closes: &[f64], period: usize, history_len: usize) -> Option<RsiOutput> {
    let mut rsi = Rsi::new(period);
    let mut trail: VecDeque<f64> = VecDeque::with_capacity(history_len + 2);

    for close in closes {
        if let Some(v) = rsi.update(*close) {
            trail.push_back(v);
            if trail.len() > history_len + 1 {
                trail.pop_front();
            }
        }
    }

    let value = trail.pop_back()?;
    Some(RsiOutput {
        value,
        history: trail.into_iter().collect(),
    })
}
