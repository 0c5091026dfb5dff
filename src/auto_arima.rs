//! Automatic order selection for non-seasonal ARIMA.
//!
//! - `d` is the smallest number of differences after which a KPSS level-stationarity
//!   test no longer rejects at the 5% level (capped at `max_d`).
//! - `p` and `q` come from an exhaustive search over the bounded grid in
//!   [`ForecastConfig`], minimizing AICc. Candidates that cannot be estimated are skipped.
//! - An intercept is included when `d < 2` (a drift term when `d == 1`).
//! - All candidates share one conditioning window, so AICc values are computed on
//!   the same observations and the choice does not depend on the units of the data.
//!
//! The search is deterministic: candidates are visited in `(p, q)` order and only a
//! strictly lower AICc replaces the current best.

use crate::arima::{Arima, ArimaOrder, FittedArima, difference};
use crate::config::ForecastConfig;
use crate::error::FitError;
use log::debug;

/// 5% critical value of the KPSS level-stationarity statistic.
pub const KPSS_CRITICAL_5PCT: f64 = 0.463;

/// Score of one candidate that could be estimated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub order: ArimaOrder,
    pub aicc: f64,
}

/// Outcome of a successful search.
#[derive(Debug, Clone)]
pub struct Selection {
    pub model: FittedArima,
    /// Every candidate that produced a finite AICc, in visiting order.
    pub candidates: Vec<Candidate>,
}

/// KPSS statistic for level stationarity, or `None` when the series has
/// (numerically) zero long-run variance or fewer than 3 points.
pub fn kpss_statistic(x: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 3 {
        return None;
    }
    let nf = n as f64;
    let mean = x.iter().sum::<f64>() / nf;
    let e: Vec<f64> = x.iter().map(|v| v - mean).collect();

    let mut partial = 0.0;
    let mut eta = 0.0;
    for v in &e {
        partial += v;
        eta += partial * partial;
    }
    eta /= nf * nf;

    let lags = (3.0 * nf.sqrt() / 13.0).trunc() as usize;
    let mut s2 = e.iter().map(|v| v * v).sum::<f64>() / nf;
    for l in 1..=lags.min(n - 1) {
        let w = 1.0 - l as f64 / (lags as f64 + 1.0);
        let cov: f64 = (l..n).map(|t| e[t] * e[t - l]).sum();
        s2 += 2.0 * w * cov / nf;
    }

    let scale = x.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    if s2 <= (scale * 1e-10).powi(2) {
        return None;
    }
    Some(eta / s2)
}

/// Number of differences needed for KPSS to stop rejecting stationarity.
pub fn ndiffs(x: &[f64], max_d: usize) -> usize {
    let mut d = 0;
    let mut current = x.to_vec();
    while d < max_d {
        match kpss_statistic(&current) {
            Some(stat) if stat > KPSS_CRITICAL_5PCT => {
                debug!("KPSS statistic {stat:.4} at d={d} rejects stationarity");
                current = difference(&current, 1);
                d += 1;
            }
            _ => break,
        }
    }
    d
}

/// Bounded AICc search.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoArima {
    config: ForecastConfig,
}

impl AutoArima {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Every `(p, d, q)` the search would visit for a given `d`.
    pub fn candidate_orders(&self, d: usize) -> Vec<ArimaOrder> {
        let c = &self.config;
        let mut out = Vec::new();
        for p in 0..=c.max_p {
            for q in 0..=c.max_q {
                if p + q <= c.max_order {
                    out.push(ArimaOrder::new(p, d, q));
                }
            }
        }
        out
    }

    /// Largest AR order that leaves enough differenced observations (`n`) for at
    /// least the pure AR candidate. Every candidate is conditioned on this many
    /// leading values so their AICc are computed on the same sample.
    pub fn conditioning_window(&self, n: usize, with_intercept: bool) -> usize {
        (0..=self.config.max_p)
            .rev()
            .find(|&p| n >= 2 * p + usize::from(with_intercept) + 3)
            .unwrap_or(0)
    }

    pub fn fit(&self, data: &[f64]) -> Result<Selection, FitError> {
        let d = ndiffs(data, self.config.max_d);
        let with_intercept = d < 2;
        let window = self.conditioning_window(data.len().saturating_sub(d), with_intercept);
        debug!("d={d}, conditioning on {window} leading values");

        let mut best: Option<FittedArima> = None;
        let mut best_aicc = f64::INFINITY;
        let mut candidates = Vec::new();
        let mut last_err = FitError::InsufficientData {
            required: 1,
            actual: data.len(),
        };

        for order in self.candidate_orders(d).into_iter().filter(|o| o.p <= window) {
            match Arima::new(order, with_intercept).fit_conditioned(data, window) {
                Ok(model) => {
                    let aicc = model.aicc();
                    if !aicc.is_finite() {
                        debug!("{order}: non-finite AICc, skipped");
                        continue;
                    }
                    debug!("{order}: AICc={aicc:.4}");
                    candidates.push(Candidate { order, aicc });
                    if aicc < best_aicc {
                        best_aicc = aicc;
                        best = Some(model);
                    }
                }
                Err(e) => {
                    debug!("{order}: {e}");
                    last_err = e;
                }
            }
        }

        match best {
            Some(model) => Ok(Selection { model, candidates }),
            None => Err(last_err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kpss_flags_trend_but_not_constant() {
        let trend = [100.0, 110.0, 120.0, 130.0, 140.0];
        let stat = kpss_statistic(&trend).unwrap();
        assert!((stat - 0.52).abs() < 1e-9, "stat = {stat}");
        assert!(kpss_statistic(&[10.0, 10.0, 10.0, 10.0]).is_none());
        assert_eq!(ndiffs(&trend, 2), 1);
    }

    #[test]
    fn periodic_series_needs_no_difference() {
        let cycle = [1.0, 0.0, -1.0, 0.0];
        let x: Vec<f64> = (0..32).map(|i| cycle[i % 4]).collect();
        assert_eq!(ndiffs(&x, 2), 0);
    }

    #[test]
    fn grid_respects_bounds() {
        let search = AutoArima::new(ForecastConfig::default());
        let orders = search.candidate_orders(1);
        assert_eq!(orders.first(), Some(&ArimaOrder::new(0, 1, 0)));
        assert!(orders.iter().all(|o| o.p + o.q <= 5 && o.d == 1));
        assert_eq!(orders.len(), 21);
    }

    #[test]
    fn linear_growth_selects_drift_model() {
        let x = [100.0, 110.0, 120.0, 130.0, 140.0];
        let sel = AutoArima::default().fit(&x).unwrap();
        assert_eq!(sel.model.order(), ArimaOrder::new(0, 1, 0));
        let f = sel.model.forecast(5);
        for (i, v) in f.iter().enumerate() {
            assert!((v - (150.0 + 10.0 * i as f64)).abs() < 1e-6);
        }
    }

    /// Random walk with drift `2 * scale` and uniform steps of width `scale`.
    fn drifting_walk(n: usize, seed: u64, scale: f64) -> Vec<f64> {
        let mut state = seed;
        let mut x = vec![50.0 * scale];
        for _ in 1..n {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let u = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            let prev = x[x.len() - 1];
            x.push(prev + 2.0 * scale + scale * u);
        }
        x
    }

    #[test]
    fn selection_does_not_depend_on_units() {
        let kilotons = drifting_walk(40, 2, 1000.0);
        let megatons: Vec<f64> = kilotons.iter().map(|v| v / 1000.0).collect();
        let big = AutoArima::default().fit(&kilotons).unwrap();
        let small = AutoArima::default().fit(&megatons).unwrap();
        assert_eq!(big.model.order(), ArimaOrder::new(0, 1, 0));
        assert_eq!(big.model.order(), small.model.order());
        assert_eq!(big.candidates.len(), small.candidates.len());
        let shift = big.candidates[0].aicc - small.candidates[0].aicc;
        for (b, s) in big.candidates.iter().zip(&small.candidates) {
            assert_eq!(b.order, s.order);
            assert!((b.aicc - s.aicc - shift).abs() < 1e-6, "{} vs {}", b.order, s.order);
        }
    }

    #[test]
    fn conditioning_window_shrinks_for_short_series() {
        let search = AutoArima::default();
        assert_eq!(search.conditioning_window(39, true), 5);
        assert_eq!(search.conditioning_window(8, true), 2);
        assert_eq!(search.conditioning_window(4, true), 0);
    }

    #[test]
    fn search_fails_on_tiny_input() {
        assert!(AutoArima::default().fit(&[1.0, 2.0]).is_err());
    }
}
