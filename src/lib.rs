//! fertcast
//!
//! Aggregate a country-level fertilizer usage dataset into annual country and global
//! series and extrapolate them with an automatically selected ARIMA model.
//! Pairs with the `fertcast` CLI.
//!
//! ### Features
//! - Load the raw CSV (`Country, Year, N_k_t, P2O5_k_t, K2O_k_t, N_P2O5_K2O_k_t`)
//! - Country-year and global-year totals in thousand metric tons
//! - 5-year forecasts via a bounded AICc search over ARIMA(p, d, q)
//! - Per-country summary statistics and share of global usage
//! - Save any table as CSV or JSON
//!
//! ### Example
//! ```no_run
//! use fertcast::{forecast, loader};
//!
//! let data = loader::load_and_process("data/country_fertilizer_trend.csv")?;
//! let india = data.country_series("India");
//! let out = forecast(&india, 5);
//! for row in out.forecasts() {
//!     println!("{} {:.1}", row.year, row.total_fertilizer_usage);
//! }
//! fertcast::storage::save_forecast_csv(&out.points, "india_forecast.csv")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod arima;
pub mod auto_arima;
pub mod config;
pub mod error;
pub mod forecast;
pub mod loader;
pub mod models;
pub mod report;
pub mod stats;
pub mod storage;

pub use config::ForecastConfig;
pub use error::{FitError, LoadError};
pub use forecast::{ForecastOutcome, ForecastSeries, forecast, forecast_with};
pub use loader::{Dataset, DatasetCache, load_and_process};
pub use models::{CountryYear, ForecastPoint, GlobalYear, SeriesPoint, SeriesType};
