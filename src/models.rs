use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw row as it appears in the source CSV.
///
/// Every cell is read as text first; normalization (NA tokens, year truncation,
/// float coercion) happens in [`crate::loader`] so errors can name the offending cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawRecord {
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "N_k_t")]
    pub n_k_t: Option<String>,
    #[serde(rename = "P2O5_k_t")]
    pub p2o5_k_t: Option<String>,
    #[serde(rename = "K2O_k_t")]
    pub k2o_k_t: Option<String>,
    #[serde(rename = "N_P2O5_K2O_k_t")]
    pub n_p2o5_k2o_k_t: Option<String>,
}

/// Normalized usage figures of one raw row (thousand metric tons).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Usage {
    pub n: Option<f64>,
    pub p2o5: Option<f64>,
    pub k2o: Option<f64>,
    pub npk: Option<f64>,
}

impl Usage {
    /// Combined total if reported, otherwise the sum of the components with gaps as zero.
    pub fn total(&self) -> f64 {
        self.npk.unwrap_or_else(|| {
            self.n.unwrap_or(0.0) + self.p2o5.unwrap_or(0.0) + self.k2o.unwrap_or(0.0)
        })
    }
}

/// One row of the country table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryYear {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Total_Fertilizer_Usage")]
    pub total_fertilizer_usage: f64,
}

/// One row of the global table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GlobalYear {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Total_Fertilizer_Usage")]
    pub total_fertilizer_usage: f64,
}

/// Annual observation handed to the forecaster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(year: i32, value: f64) -> Self {
        Self { year, value }
    }
}

impl From<&CountryYear> for SeriesPoint {
    fn from(r: &CountryYear) -> Self {
        Self::new(r.year, r.total_fertilizer_usage)
    }
}

impl From<&GlobalYear> for SeriesPoint {
    fn from(r: &GlobalYear) -> Self {
        Self::new(r.year, r.total_fertilizer_usage)
    }
}

/// Distinguishes observed rows from model output in a combined series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SeriesType {
    Historical,
    Forecast,
}

impl SeriesType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesType::Historical => "Historical",
            SeriesType::Forecast => "Forecast",
        }
    }
}

impl fmt::Display for SeriesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a historical + forecast table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ForecastPoint {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Total_Fertilizer_Usage")]
    pub total_fertilizer_usage: f64,
    #[serde(rename = "Type")]
    pub kind: SeriesType,
}
