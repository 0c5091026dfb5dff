//! Historical + forecast tables for one annual series.
//!
//! [`forecast`] never fails: short series come back unchanged, and a series on which
//! no ARIMA candidate can be estimated gets a persistence forecast (last value
//! repeated). How the table was produced is reported in [`ForecastOutcome`].

use crate::arima::ArimaOrder;
use crate::auto_arima::AutoArima;
use crate::config::ForecastConfig;
use crate::models::{ForecastPoint, SeriesPoint, SeriesType};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// How a [`ForecastSeries`] was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForecastOutcome {
    /// An ARIMA model was selected and extrapolated.
    Fitted { order: ArimaOrder, aicc: f64 },
    /// Too few observations; only historical rows are returned.
    InsufficientData { required: usize, actual: usize },
    /// Every candidate failed; forecast rows repeat the last observed value.
    Fallback { reason: String },
}

impl ForecastOutcome {
    pub fn is_fitted(&self) -> bool {
        matches!(self, ForecastOutcome::Fitted { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    /// Historical rows followed by forecast rows, year ascending.
    pub points: Vec<ForecastPoint>,
    pub outcome: ForecastOutcome,
}

impl ForecastSeries {
    pub fn historical(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| p.kind == SeriesType::Historical)
    }

    pub fn forecasts(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| p.kind == SeriesType::Forecast)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Forecast `periods` years past the end of `series` with the default search.
pub fn forecast(series: &[SeriesPoint], periods: usize) -> ForecastSeries {
    forecast_with(series, &ForecastConfig::default().with_periods(periods))
}

/// Same as [`forecast`] with explicit horizon and search bounds.
pub fn forecast_with(series: &[SeriesPoint], config: &ForecastConfig) -> ForecastSeries {
    let mut points: Vec<ForecastPoint> = series
        .iter()
        .map(|p| ForecastPoint {
            year: p.year,
            total_fertilizer_usage: p.value,
            kind: SeriesType::Historical,
        })
        .collect();

    if series.len() < config.min_history {
        info!(
            "series has {} points, need {} to forecast; returning history only",
            series.len(),
            config.min_history
        );
        return ForecastSeries {
            points,
            outcome: ForecastOutcome::InsufficientData {
                required: config.min_history,
                actual: series.len(),
            },
        };
    }
    let Some(last) = series.last() else {
        return ForecastSeries {
            points,
            outcome: ForecastOutcome::InsufficientData {
                required: 1,
                actual: 0,
            },
        };
    };

    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    let (predicted, outcome) = match AutoArima::new(*config).fit(&values) {
        Ok(sel) => {
            let predicted = sel.model.forecast(config.periods);
            if predicted.iter().all(|v| v.is_finite()) {
                let order = sel.model.order();
                let aicc = sel.model.aicc();
                info!(
                    "selected {order} (AICc={aicc:.3}) from {} candidates",
                    sel.candidates.len()
                );
                (predicted, ForecastOutcome::Fitted { order, aicc })
            } else {
                let reason = format!("{} produced a non-finite forecast", sel.model.order());
                fallback(last.value, config.periods, reason)
            }
        }
        Err(e) => {
            let reason = format!("no ARIMA candidate could be fitted: {e}");
            fallback(last.value, config.periods, reason)
        }
    };

    let wanted = predicted.len();
    let rows: Vec<ForecastPoint> = predicted
        .into_iter()
        .zip(1..)
        .map_while(|(value, step)| {
            Some(ForecastPoint {
                year: last.year.checked_add(step)?,
                total_fertilizer_usage: value,
                kind: SeriesType::Forecast,
            })
        })
        .collect();
    if rows.len() < wanted {
        warn!("year overflow: forecast truncated to {} of {wanted} periods", rows.len());
    }
    points.extend(rows);
    ForecastSeries { points, outcome }
}

fn fallback(last: f64, periods: usize, reason: String) -> (Vec<f64>, ForecastOutcome) {
    warn!("{reason}; using persistence forecast");
    (vec![last; periods], ForecastOutcome::Fallback { reason })
}
