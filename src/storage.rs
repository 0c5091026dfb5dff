use crate::models::{CountryYear, ForecastPoint, GlobalYear};
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix cells a spreadsheet would evaluate as a formula.
fn sanitize_cell(s: &str) -> String {
    match s.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{s}"),
        _ => s.to_string(),
    }
}

/// Save the country table as CSV with header.
pub fn save_country_csv<P: AsRef<Path>>(rows: &[CountryYear], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(["Country", "Year", "Total_Fertilizer_Usage"])?;
    for r in rows {
        wtr.serialize((sanitize_cell(&r.country), r.year, r.total_fertilizer_usage))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save the global table as CSV with header.
pub fn save_global_csv<P: AsRef<Path>>(rows: &[GlobalYear], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(["Year", "Total_Fertilizer_Usage"])?;
    for r in rows {
        wtr.serialize((r.year, r.total_fertilizer_usage))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a historical + forecast table as CSV with header.
pub fn save_forecast_csv<P: AsRef<Path>>(rows: &[ForecastPoint], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(["Year", "Total_Fertilizer_Usage", "Type"])?;
    for r in rows {
        wtr.serialize((r.year, r.total_fertilizer_usage, r.kind.as_str()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_country_json<P: AsRef<Path>>(rows: &[CountryYear], path: P) -> Result<()> {
    save_json(rows, path)
}

pub fn save_global_json<P: AsRef<Path>>(rows: &[GlobalYear], path: P) -> Result<()> {
    save_json(rows, path)
}

pub fn save_forecast_json<P: AsRef<Path>>(rows: &[ForecastPoint], path: P) -> Result<()> {
    save_json(rows, path)
}

/// Save rows as a pretty JSON array.
fn save_json<T: Serialize, P: AsRef<Path>>(rows: &[T], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let s = serde_json::to_string_pretty(rows)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeriesType;
    use tempfile::tempdir;

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        let pts = vec![ForecastPoint {
            year: 2000,
            total_fertilizer_usage: 1.23,
            kind: SeriesType::Forecast,
        }];
        save_forecast_csv(&pts, &csvp).unwrap();
        save_forecast_json(&pts, &jsonp).unwrap();
        assert!(csvp.exists());
        assert!(jsonp.exists());
    }

    #[test]
    fn formula_starters_are_quoted() {
        assert_eq!(sanitize_cell("=1+1"), "'=1+1");
        assert_eq!(sanitize_cell("@x"), "'@x");
        assert_eq!(sanitize_cell("Chad"), "Chad");
    }
}
