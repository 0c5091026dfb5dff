//! Read the raw fertilizer CSV and aggregate it into country-year and global-year tables.
//!
//! The input header is fixed: `Country, Year, N_k_t, P2O5_k_t, K2O_k_t, N_P2O5_K2O_k_t`.
//! Extra columns are ignored. Cells are trimmed; the usual NA spellings (`NA`, `N/A`,
//! `NaN`, empty, ...) count as missing.
//!
//! ### Example
//! ```no_run
//! let data = fertcast::loader::load_and_process("data/country_fertilizer_trend.csv")?;
//! for name in data.countries() {
//!     println!("{name}: {} years", data.country_series(name).len());
//! }
//! # Ok::<(), fertcast::LoadError>(())
//! ```

use crate::error::LoadError;
use crate::models::{CountryYear, GlobalYear, RawRecord, SeriesPoint, Usage};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const COL_COUNTRY: &str = "Country";
pub const COL_YEAR: &str = "Year";
pub const COL_N: &str = "N_k_t";
pub const COL_P2O5: &str = "P2O5_k_t";
pub const COL_K2O: &str = "K2O_k_t";
pub const COL_NPK: &str = "N_P2O5_K2O_k_t";

const REQUIRED_COLUMNS: [&str; 6] = [COL_COUNTRY, COL_YEAR, COL_N, COL_P2O5, COL_K2O, COL_NPK];

/// Cell spellings treated as a missing value (the common CSV/spreadsheet NA markers).
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>",
    "#N/A", "#N/A N/A", "#NA", "1.#IND", "-1.#IND", "1.#QNAN", "-1.#QNAN",
];

/// Aggregated tables produced by one load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Sorted by country, then year. `(country, year)` is unique.
    pub country: Vec<CountryYear>,
    /// Sorted by year. `year` is unique.
    pub global: Vec<GlobalYear>,
}

impl Dataset {
    pub fn into_parts(self) -> (Vec<CountryYear>, Vec<GlobalYear>) {
        (self.country, self.global)
    }

    /// Distinct country names in ascending order.
    pub fn countries(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for row in &self.country {
            if out.last() != Some(&row.country.as_str()) {
                out.push(row.country.as_str());
            }
        }
        out
    }

    pub fn has_country(&self, name: &str) -> bool {
        self.country.iter().any(|r| r.country == name)
    }

    /// Year-ordered series for one country; empty if the country is unknown.
    pub fn country_series(&self, name: &str) -> Vec<SeriesPoint> {
        self.country
            .iter()
            .filter(|r| r.country == name)
            .map(SeriesPoint::from)
            .collect()
    }

    pub fn global_series(&self) -> Vec<SeriesPoint> {
        self.global.iter().map(SeriesPoint::from).collect()
    }
}

/// Load a CSV file and aggregate it.
pub fn load_and_process<P: AsRef<Path>>(path: P) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    debug!("loading fertilizer dataset from {}", path.display());
    let file = std::fs::File::open(path)?;
    load_and_process_reader(file)
}

/// Same as [`load_and_process`] for any reader (in-memory data, stdin, ...).
pub fn load_and_process_reader<R: Read>(source: R) -> Result<Dataset, LoadError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(source);
    let headers = rdr.headers()?.clone();
    check_headers(&headers)?;

    let mut by_country_year: BTreeMap<(String, i32), f64> = BTreeMap::new();
    let mut rows = 0usize;
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let raw: RawRecord = record.deserialize(Some(&headers))?;
        let (country, year, usage) = normalize_record(&raw, line)?;
        *by_country_year.entry((country, year)).or_insert(0.0) += usage.total();
        rows += 1;
    }

    let dataset = aggregate(by_country_year);
    info!(
        "loaded {} rows into {} country-year and {} global-year records",
        rows,
        dataset.country.len(),
        dataset.global.len()
    );
    Ok(dataset)
}

fn check_headers(headers: &StringRecord) -> Result<(), LoadError> {
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(LoadError::MissingColumn(col));
        }
    }
    Ok(())
}

fn aggregate(by_country_year: BTreeMap<(String, i32), f64>) -> Dataset {
    let mut global: BTreeMap<i32, f64> = BTreeMap::new();
    let country: Vec<CountryYear> = by_country_year
        .into_iter()
        .map(|((country, year), total)| {
            *global.entry(year).or_insert(0.0) += total;
            CountryYear {
                country,
                year,
                total_fertilizer_usage: total,
            }
        })
        .collect();
    let global = global
        .into_iter()
        .map(|(year, total)| GlobalYear {
            year,
            total_fertilizer_usage: total,
        })
        .collect();
    Dataset { country, global }
}

/// Validate one raw row and turn it into `(country, year, usage)`.
pub fn normalize_record(raw: &RawRecord, line: u64) -> Result<(String, i32, Usage), LoadError> {
    let country = cell(&raw.country)
        .ok_or_else(|| parse_err(line, COL_COUNTRY, "", "missing country"))?
        .to_string();
    let year_text = cell(&raw.year).ok_or_else(|| parse_err(line, COL_YEAR, "", "missing year"))?;
    let year = parse_year(year_text).map_err(|reason| parse_err(line, COL_YEAR, year_text, &reason))?;
    let usage = Usage {
        n: parse_usage(&raw.n_k_t, line, COL_N)?,
        p2o5: parse_usage(&raw.p2o5_k_t, line, COL_P2O5)?,
        k2o: parse_usage(&raw.k2o_k_t, line, COL_K2O)?,
        npk: parse_usage(&raw.n_p2o5_k2o_k_t, line, COL_NPK)?,
    };
    Ok((country, year, usage))
}

/// Parse a year cell such as `"2001"` or `"1991/92"` (first four characters win).
pub fn parse_year(s: &str) -> Result<i32, String> {
    let head: String = s.trim().chars().take(4).collect();
    let year = head
        .parse::<i32>()
        .map_err(|e| format!("year prefix {head:?} is not an integer: {e}"))?;
    if year <= 0 {
        return Err(format!("{year} is not a calendar year"));
    }
    Ok(year)
}

pub fn is_missing(s: &str) -> bool {
    NA_TOKENS.contains(&s.trim())
}

fn cell(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !is_missing(s))
}

fn parse_usage(v: &Option<String>, line: u64, column: &'static str) -> Result<Option<f64>, LoadError> {
    let Some(text) = cell(v) else {
        return Ok(None);
    };
    let x = text
        .parse::<f64>()
        .map_err(|e| parse_err(line, column, text, &format!("not a number: {e}")))?;
    if !x.is_finite() {
        return Err(parse_err(line, column, text, "value is not finite"));
    }
    Ok(Some(x))
}

fn parse_err(line: u64, column: &'static str, value: &str, reason: &str) -> LoadError {
    LoadError::Parse {
        line,
        column,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Process-lifetime memoized dataset.
///
/// The first successful [`DatasetCache::get`] reads the file; later calls return the
/// same tables. A failed load is not remembered, so the next call retries.
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    cell: OnceLock<Dataset>,
}

impl DatasetCache {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            cell: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get(&self) -> Result<&Dataset, LoadError> {
        if let Some(d) = self.cell.get() {
            return Ok(d);
        }
        let loaded = load_and_process(&self.path)?;
        Ok(self.cell.get_or_init(|| loaded))
    }
}
