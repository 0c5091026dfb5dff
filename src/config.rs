use serde::{Deserialize, Serialize};

/// Default forecast horizon in years.
pub const DEFAULT_PERIODS: usize = 5;
/// Series shorter than this are returned unchanged.
pub const DEFAULT_MIN_HISTORY: usize = 5;
/// Default dataset location, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "data/country_fertilizer_trend.csv";

/// Forecast horizon and bounds of the automatic order search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub periods: usize,
    pub min_history: usize,
    pub max_p: usize,
    pub max_d: usize,
    pub max_q: usize,
    /// Upper bound on `p + q`.
    pub max_order: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            periods: DEFAULT_PERIODS,
            min_history: DEFAULT_MIN_HISTORY,
            max_p: 5,
            max_d: 2,
            max_q: 5,
            max_order: 5,
        }
    }
}

impl ForecastConfig {
    pub fn with_periods(mut self, periods: usize) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_min_history(mut self, min_history: usize) -> Self {
        self.min_history = min_history;
        self
    }

    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    pub fn with_max_order(mut self, max_order: usize) -> Self {
        self.max_order = max_order;
        self
    }
}
