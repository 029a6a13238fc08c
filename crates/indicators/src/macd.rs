use crate::ema::Ema;

/// MACD line, signal line and histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdOutput {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD = EMA(fast) − EMA(slow); signal = EMA(signal) of the MACD line.
///
/// Emits only once the slow EMA is warm and the signal EMA has been seeded
/// with `signal` MACD values, i.e. after `slow + signal − 1` closes.
#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
        }
    }

    pub fn update(&mut self, close: f64) -> Option<MacdOutput> {
        let fast = self.fast.update(close);
        let slow = self.slow.update(close);
        let macd = fast? - slow?;
        let signal = self.signal.update(macd)?;
        Some(MacdOutput {
            macd,
            signal,
            histogram: macd - signal,
        })
    }
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdOutput> {
    let mut macd = Macd::new(fast, slow, signal);
    closes.iter().fold(None, |_, c| macd.update(*c))
}
