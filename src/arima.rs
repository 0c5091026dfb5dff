//! Non-seasonal ARIMA(p, d, q) models.
//!
//! The series is differenced `d` times, an ARMA(p, q) with optional intercept is
//! estimated on the result, and forecasts are integrated back to the original scale.
//!
//! Estimation uses the Hannan-Rissanen two-stage regression:
//! 1. a long autoregression supplies proxy innovations,
//! 2. the series is regressed on its own lags and the lagged proxies.
//!
//! The fitted coefficients are then scored by the conditional sum of squares (CSS),
//! which gives the Gaussian log-likelihood, AIC and AICc used for order selection.
//!
//! ```
//! use fertcast::arima::{Arima, ArimaOrder};
//!
//! let data: Vec<f64> = (0..10).map(|i| 100.0 + 10.0 * i as f64).collect();
//! let fit = Arima::new(ArimaOrder::new(0, 1, 0), true).fit(&data).unwrap();
//! let next = fit.forecast(2);
//! assert!((next[0] - 200.0).abs() < 1e-6);
//! assert!((next[1] - 210.0).abs() < 1e-6);
//! ```

use crate::error::FitError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Model order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Unfitted model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arima {
    order: ArimaOrder,
    with_intercept: bool,
}

/// A model estimated on a concrete series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedArima {
    order: ArimaOrder,
    with_intercept: bool,
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sigma2: f64,
    n_eff: usize,
    /// Last value of each differencing level `0..d`, used to integrate forecasts.
    tails: Vec<f64>,
    /// The `d`-times differenced series.
    working: Vec<f64>,
    residuals: Vec<f64>,
}

impl Arima {
    pub fn new(order: ArimaOrder, with_intercept: bool) -> Self {
        Self {
            order,
            with_intercept,
        }
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Number of estimated parameters, residual variance included.
    pub fn n_params(&self) -> usize {
        self.order.p + self.order.q + usize::from(self.with_intercept) + 1
    }

    pub fn fit(&self, data: &[f64]) -> Result<FittedArima, FitError> {
        self.fit_conditioned(data, self.order.p)
    }

    /// Like [`Arima::fit`], but the CSS only counts residuals from index `condition`
    /// of the differenced series on (never earlier than `p`). Models of the same `d`
    /// fitted with the same `condition` are scored on the same observations, so their
    /// likelihoods and AICc are comparable.
    pub fn fit_conditioned(
        &self,
        data: &[f64],
        condition: usize,
    ) -> Result<FittedArima, FitError> {
        let ArimaOrder { p, d, q } = self.order;
        if data.iter().any(|x| !x.is_finite()) {
            return Err(FitError::NonFinite("input series"));
        }
        if data.len() <= d {
            return Err(FitError::InsufficientData {
                required: d + 1,
                actual: data.len(),
            });
        }

        let mut tails = Vec::with_capacity(d);
        let mut working = data.to_vec();
        for _ in 0..d {
            tails.push(*working.last().ok_or(FitError::InsufficientData {
                required: d + 1,
                actual: data.len(),
            })?);
            working = difference(&working, 1);
        }

        let n = working.len();
        let k = self.n_params();
        let start = condition.max(p);
        let n_eff = n.saturating_sub(start);
        if n_eff < k + 2 {
            return Err(FitError::InsufficientData {
                required: start + k + 2,
                actual: n,
            });
        }

        let (intercept, ar, ma) = if q == 0 {
            self.estimate_ar(&working)?
        } else {
            self.estimate_arma(&working)?
        };

        if !is_stationary(&ar) {
            return Err(FitError::NonStationary);
        }
        let neg_ma: Vec<f64> = ma.iter().map(|t| -t).collect();
        if !is_stationary(&neg_ma) {
            return Err(FitError::NonInvertible);
        }

        let residuals = css_residuals(&working, intercept, &ar, &ma);
        let css: f64 = residuals[start..].iter().map(|e| e * e).sum();
        let scale = working.iter().fold(1.0_f64, |acc, x| acc.max(x.abs()));
        let floor = (scale * 1e-8).powi(2);
        let sigma2 = (css / n_eff as f64).max(floor);
        if !sigma2.is_finite() {
            return Err(FitError::NonFinite("residual variance"));
        }

        Ok(FittedArima {
            order: self.order,
            with_intercept: self.with_intercept,
            intercept,
            ar,
            ma,
            sigma2,
            n_eff,
            tails,
            working,
            residuals,
        })
    }

    /// Pure AR part by ordinary least squares.
    fn estimate_ar(&self, w: &[f64]) -> Result<(f64, Vec<f64>, Vec<f64>), FitError> {
        let p = self.order.p;
        if p == 0 {
            let c = if self.with_intercept { mean(w) } else { 0.0 };
            return Ok((c, Vec::new(), Vec::new()));
        }
        let mut xs = Vec::with_capacity(w.len() - p);
        let mut ys = Vec::with_capacity(w.len() - p);
        for t in p..w.len() {
            let mut row = Vec::with_capacity(p + 1);
            if self.with_intercept {
                row.push(1.0);
            }
            row.extend((1..=p).map(|i| w[t - i]));
            xs.push(row);
            ys.push(w[t]);
        }
        let beta = ols(&xs, &ys)?;
        Ok(self.split_coefficients(&beta))
    }

    /// Hannan-Rissanen: long AR for proxy innovations, then a joint regression.
    fn estimate_arma(&self, w: &[f64]) -> Result<(f64, Vec<f64>, Vec<f64>), FitError> {
        let ArimaOrder { p, q, .. } = self.order;
        let n = w.len();
        let m = ((n as f64).ln().ceil() as usize).max(p + q).max(1);
        if n < 2 * m + 2 {
            return Err(FitError::InsufficientData {
                required: 2 * m + 2,
                actual: n,
            });
        }

        let mut xs = Vec::with_capacity(n - m);
        let mut ys = Vec::with_capacity(n - m);
        for t in m..n {
            let mut row = Vec::with_capacity(m + 1);
            row.push(1.0);
            row.extend((1..=m).map(|i| w[t - i]));
            xs.push(row);
            ys.push(w[t]);
        }
        let long_ar = ols(&xs, &ys)?;
        let mut innovations = vec![0.0; n];
        for t in m..n {
            let fitted: f64 = long_ar[0]
                + (1..=m).map(|i| long_ar[i] * w[t - i]).sum::<f64>();
            innovations[t] = w[t] - fitted;
        }

        let start = (m + q).max(p);
        let cols = p + q + usize::from(self.with_intercept);
        if n <= start + cols {
            return Err(FitError::InsufficientData {
                required: start + cols + 1,
                actual: n,
            });
        }
        let mut xs = Vec::with_capacity(n - start);
        let mut ys = Vec::with_capacity(n - start);
        for t in start..n {
            let mut row = Vec::with_capacity(cols);
            if self.with_intercept {
                row.push(1.0);
            }
            row.extend((1..=p).map(|i| w[t - i]));
            row.extend((1..=q).map(|j| innovations[t - j]));
            xs.push(row);
            ys.push(w[t]);
        }
        let beta = ols(&xs, &ys)?;
        Ok(self.split_coefficients(&beta))
    }

    fn split_coefficients(&self, beta: &[f64]) -> (f64, Vec<f64>, Vec<f64>) {
        let ArimaOrder { p, q, .. } = self.order;
        let offset = usize::from(self.with_intercept);
        let c = if self.with_intercept { beta[0] } else { 0.0 };
        let ar = beta[offset..offset + p].to_vec();
        let ma = beta[offset + p..offset + p + q].to_vec();
        (c, ar, ma)
    }
}

impl FittedArima {
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Residual variance (CSS estimate, floored for exact fits).
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Observations that contributed to the CSS.
    pub fn n_obs(&self) -> usize {
        self.n_eff
    }

    pub fn n_params(&self) -> usize {
        self.ar.len() + self.ma.len() + usize::from(self.with_intercept) + 1
    }

    pub fn log_likelihood(&self) -> f64 {
        let n = self.n_eff as f64;
        -0.5 * n * ((2.0 * PI * self.sigma2).ln() + 1.0)
    }

    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.n_params() as f64
    }

    /// Small-sample corrected AIC. `fit` guarantees `n_obs > n_params + 1`.
    pub fn aicc(&self) -> f64 {
        let k = self.n_params() as f64;
        let n = self.n_eff as f64;
        self.aic() + 2.0 * k * (k + 1.0) / (n - k - 1.0)
    }

    /// Point forecasts for the next `steps` periods on the original scale.
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        if steps == 0 {
            return Vec::new();
        }
        let mut history = self.working.clone();
        let mut errors = self.residuals.clone();
        let mut out = Vec::with_capacity(steps);
        for _ in 0..steps {
            let mut f = self.intercept;
            for (i, phi) in self.ar.iter().enumerate() {
                if let Some(x) = history.len().checked_sub(i + 1).map(|idx| history[idx]) {
                    f += phi * x;
                }
            }
            for (j, theta) in self.ma.iter().enumerate() {
                if let Some(e) = errors.len().checked_sub(j + 1).map(|idx| errors[idx]) {
                    f += theta * e;
                }
            }
            out.push(f);
            history.push(f);
            errors.push(0.0);
        }
        for &last in self.tails.iter().rev() {
            out = integrate(&out, last);
        }
        out
    }
}

/// Apply `order` rounds of first differencing.
pub fn difference(data: &[f64], order: usize) -> Vec<f64> {
    let mut out = data.to_vec();
    for _ in 0..order {
        out = out.windows(2).map(|w| w[1] - w[0]).collect();
    }
    out
}

/// Undo one round of differencing starting from the last observed level.
pub fn integrate(diffs: &[f64], last: f64) -> Vec<f64> {
    let mut level = last;
    diffs
        .iter()
        .map(|d| {
            level += d;
            level
        })
        .collect()
}

/// True when `x_t = sum(coeffs[i] * x_{t-1-i}) + e_t` is stationary.
///
/// Runs the Levinson step-down recursion; the polynomial has all roots outside the
/// unit circle iff every reflection coefficient is strictly inside (-1, 1).
pub fn is_stationary(coeffs: &[f64]) -> bool {
    let mut a = coeffs.to_vec();
    while let Some(&r) = a.last() {
        if !r.is_finite() || r.abs() >= 1.0 {
            return false;
        }
        let k = a.len();
        let denom = 1.0 - r * r;
        a = (0..k - 1).map(|j| (a[j] + r * a[k - 2 - j]) / denom).collect();
    }
    true
}

fn css_residuals(w: &[f64], c: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let p = ar.len();
    let mut e = vec![0.0; w.len()];
    for t in p..w.len() {
        let mut pred = c;
        for (i, phi) in ar.iter().enumerate() {
            pred += phi * w[t - 1 - i];
        }
        for (j, theta) in ma.iter().enumerate() {
            if t > j {
                pred += theta * e[t - 1 - j];
            }
        }
        e[t] = w[t] - pred;
    }
    e
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

/// Least squares via the normal equations.
fn ols(xs: &[Vec<f64>], ys: &[f64]) -> Result<Vec<f64>, FitError> {
    let cols = xs.first().map_or(0, Vec::len);
    if cols == 0 {
        return Ok(Vec::new());
    }
    if xs.len() < cols {
        return Err(FitError::InsufficientData {
            required: cols,
            actual: xs.len(),
        });
    }
    let mut xtx = vec![vec![0.0; cols]; cols];
    let mut xty = vec![0.0; cols];
    for (row, y) in xs.iter().zip(ys) {
        for i in 0..cols {
            xty[i] += row[i] * y;
            for j in 0..cols {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    solve(xtx, xty)
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, FitError> {
    let n = b.len();
    let max_diag = (0..n).fold(0.0_f64, |acc, i| acc.max(a[i][i].abs()));
    let tol = max_diag.max(1.0) * 1e-10;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .ok_or(FitError::Singular)?;
        if a[pivot][col].abs() <= tol {
            return Err(FitError::Singular);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite("coefficients"));
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-noise in [-0.5, 0.5).
    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 11) as f64 / (1u64 << 53) as f64) - 0.5
            })
            .collect()
    }

    #[test]
    fn difference_and_integrate_are_inverse() {
        let data = [1.0, 4.0, 9.0, 16.0, 25.0];
        let d1 = difference(&data, 1);
        assert_eq!(d1, vec![3.0, 5.0, 7.0, 9.0]);
        assert_eq!(difference(&data, 2), vec![2.0, 2.0, 2.0]);
        assert_eq!(integrate(&d1[1..], data[0] + d1[0]), vec![9.0, 16.0, 25.0]);
    }

    #[test]
    fn stationarity_check() {
        assert!(is_stationary(&[]));
        assert!(is_stationary(&[0.5]));
        assert!(!is_stationary(&[1.2]));
        assert!(!is_stationary(&[-1.0]));
        assert!(is_stationary(&[1.5, -0.56]));
        assert!(!is_stationary(&[0.5, 0.6]));
    }

    #[test]
    fn random_walk_with_drift_extends_trend() {
        let data: Vec<f64> = (0..8).map(|i| 50.0 + 5.0 * i as f64).collect();
        let fit = Arima::new(ArimaOrder::new(0, 1, 0), true).fit(&data).unwrap();
        assert!((fit.intercept() - 5.0).abs() < 1e-9);
        let f = fit.forecast(3);
        assert!((f[0] - 90.0).abs() < 1e-6);
        assert!((f[2] - 100.0).abs() < 1e-6);
        assert!(fit.aicc().is_finite());
    }

    #[test]
    fn second_difference_integrates_twice() {
        let data: Vec<f64> = (0..10).map(|i| (i * i) as f64).collect();
        let fit = Arima::new(ArimaOrder::new(0, 2, 0), true).fit(&data).unwrap();
        let f = fit.forecast(2);
        assert!((f[0] - 100.0).abs() < 1e-6, "{f:?}");
        assert!((f[1] - 121.0).abs() < 1e-6, "{f:?}");
    }

    #[test]
    fn recovers_ar1_coefficient() {
        let e = noise(400, 7);
        let mut x = vec![0.0; e.len()];
        for t in 1..x.len() {
            x[t] = 0.6 * x[t - 1] + e[t];
        }
        let fit = Arima::new(ArimaOrder::new(1, 0, 0), true).fit(&x).unwrap();
        assert!((fit.ar_coefficients()[0] - 0.6).abs() < 0.1, "{:?}", fit.ar_coefficients());
    }

    #[test]
    fn recovers_ma1_sign() {
        let e = noise(400, 11);
        let mut x = vec![0.0; e.len()];
        for t in 1..x.len() {
            x[t] = e[t] + 0.5 * e[t - 1];
        }
        let fit = Arima::new(ArimaOrder::new(0, 0, 1), true).fit(&x).unwrap();
        let theta = fit.ma_coefficients()[0];
        assert!(theta > 0.25 && theta < 0.75, "theta = {theta}");
    }

    #[test]
    fn too_short_series_is_rejected() {
        let err = Arima::new(ArimaOrder::new(2, 1, 2), true)
            .fit(&[1.0, 2.0, 3.0])
            .unwrap_err();
        assert!(matches!(err, FitError::InsufficientData { .. }));
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let err = Arima::new(ArimaOrder::new(0, 0, 0), true)
            .fit(&[1.0, f64::NAN, 3.0, 4.0, 5.0])
            .unwrap_err();
        assert_eq!(err, FitError::NonFinite("input series"));
    }
}
