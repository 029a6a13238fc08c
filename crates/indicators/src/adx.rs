use crate::atr::true_range;
use core_types::Candle;

/// ADX (Average Directional Index) with +DI/−DI, Wilder smoothing.
///
/// 1. +DM/−DM and TR from consecutive bars
/// 2. First `period` values summed, then `s = s − s/n + current`
/// 3. ±DI = smoothed ±DM / smoothed TR · 100
/// 4. DX = |+DI − −DI| / (+DI + −DI) · 100
/// 5. ADX = mean of the first `period` DX values, then Wilder-smoothed
#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    prev: Option<Candle>,
    smoothed_plus_dm: f64,
    smoothed_minus_dm: f64,
    smoothed_tr: f64,
    dm_count: usize,
    dx_sum: f64,
    dx_count: usize,
    adx: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdxOutput {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev: None,
            smoothed_plus_dm: 0.0,
            smoothed_minus_dm: 0.0,
            smoothed_tr: 0.0,
            dm_count: 0,
            dx_sum: 0.0,
            dx_count: 0,
            adx: None,
        }
    }

    pub fn update(&mut self, candle: &Candle) -> Option<AdxOutput> {
        // Reject malformed bars to avoid poisoning the Wilder accumulators.
        if self.period == 0 || candle.validate().is_err() {
            return self.output();
        }

        let Some(prev) = self.prev.replace(*candle) else {
            return None;
        };

        let up_move = candle.high - prev.high;
        let down_move = prev.low - candle.low;
        let plus_dm = if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 };
        let minus_dm = if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 };
        let tr = true_range(candle, Some(prev.close));

        let n = self.period as f64;
        if self.dm_count < self.period {
            self.smoothed_plus_dm += plus_dm;
            self.smoothed_minus_dm += minus_dm;
            self.smoothed_tr += tr;
            self.dm_count += 1;
            if self.dm_count < self.period {
                return None;
            }
        } else {
            self.smoothed_plus_dm = self.smoothed_plus_dm - self.smoothed_plus_dm / n + plus_dm;
            self.smoothed_minus_dm = self.smoothed_minus_dm - self.smoothed_minus_dm / n + minus_dm;
            self.smoothed_tr = self.smoothed_tr - self.smoothed_tr / n + tr;
        }

        let (_, _, dx) = self.directional_indices();
        match self.adx {
            Some(prev_adx) => self.adx = Some((prev_adx * (n - 1.0) + dx) / n),
            None => {
                self.dx_sum += dx;
                self.dx_count += 1;
                if self.dx_count >= self.period {
                    self.adx = Some(self.dx_sum / n);
                }
            }
        }
        self.output()
    }

    fn directional_indices(&self) -> (f64, f64, f64) {
        if self.smoothed_tr <= 0.0 {
            return (0.0, 0.0, 0.0);
        }
        let plus_di = self.smoothed_plus_dm / self.smoothed_tr * 100.0;
        let minus_di = self.smoothed_minus_dm / self.smoothed_tr * 100.0;
        let di_sum = plus_di + minus_di;
        let dx = if di_sum > 0.0 {
            (plus_di - minus_di).abs() / di_sum * 100.0
        } else {
            0.0
        };
        (plus_di, minus_di, dx)
    }

    fn output(&self) -> Option<AdxOutput> {
        let adx = self.adx?;
        let (plus_di, minus_di, _) = self.directional_indices();
        Some(AdxOutput { adx, plus_di, minus_di })
    }
}

/// ADX over a candle slice.
///
/// Returns `None` with fewer than `min_candles` bars: a short history gives a
/// noisy reading that is worse than no reading.
pub fn adx(candles: &[Candle], period: usize, min_candles: usize) -> Option<AdxOutput> {
    if candles.len() < min_candles.max(2 * period + 1) {
        return None;
    }
    let mut adx = Adx::new(period);
    candles.iter().fold(None, |_, c| adx.update(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hlc, trending};

    #[test]
    fn requires_minimum_history() {
        let candles = trending(199);
        assert!(adx(&candles, 14, 200).is_none());

        let candles = trending(200);
        assert!(adx(&candles, 14, 200).is_some());
    }

    #[test]
    fn uptrend_has_plus_di_dominant() {
        let out = adx(&trending(250), 14, 200).unwrap();
        assert!(out.plus_di > out.minus_di);
        assert!((0.0..=100.0).contains(&out.adx));
    }

    #[test]
    fn downtrend_has_minus_di_dominant() {
        let bars: Vec<(f64, f64, f64)> = (0..60)
            .map(|i| {
                let c = 500.0 - i as f64 * 2.0;
                (c + 1.0, c - 1.0, c)
            })
            .collect();
        let out = adx(&hlc(&bars), 14, 0).unwrap();
        assert!(out.minus_di > out.plus_di);
        assert!(out.adx > 50.0);
    }

    #[test]
    fn first_value_appears_after_two_periods() {
        let candles = trending(40);
        let mut adx = Adx::new(14);
        let first_ready = candles
            .iter()
            .position(|c| adx.update(c).is_some())
            .unwrap();
        // bar 0 primes, bars 1..=14 seed DM/TR, then 14 DX values
        assert_eq!(first_ready, 27);
    }

    #[test]
    fn flat_market_reports_zero_strength_without_nan() {
        let bars: Vec<(f64, f64, f64)> = (0..40).map(|_| (100.0, 100.0, 100.0)).collect();
        let out = adx(&hlc(&bars), 14, 0).unwrap();
        assert_eq!(out.adx, 0.0);
        assert_eq!(out.plus_di, 0.0);
        assert_eq!(out.minus_di, 0.0);
    }
}
