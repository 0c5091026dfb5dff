use crate::models::{CountryYear, GlobalYear};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary statistics for one country's annual totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub country: String,
    pub count: usize,
    pub first_year: i32,
    pub last_year: i32,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Compound annual growth between the first and last year, if both are positive.
    pub cagr: Option<f64>,
}

/// Country usage set against the global total for one year.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Share {
    pub year: i32,
    pub country: f64,
    pub global: f64,
    /// `country / global`, `None` when the global total is zero.
    pub share: Option<f64>,
}

/// Compute per-country statistics, ordered by country.
pub fn country_summary(rows: &[CountryYear]) -> Vec<Summary> {
    let mut groups: BTreeMap<&str, Vec<(i32, f64)>> = BTreeMap::new();
    for r in rows {
        groups
            .entry(r.country.as_str())
            .or_default()
            .push((r.year, r.total_fertilizer_usage));
    }

    let mut out = Vec::with_capacity(groups.len());
    for (country, mut obs) in groups {
        obs.sort_by_key(|(y, _)| *y);
        let (first_year, first) = obs[0];
        let (last_year, last) = obs[obs.len() - 1];

        let mut vals: Vec<f64> = obs.iter().map(|(_, v)| *v).collect();
        vals.sort_by(|a, b| a.total_cmp(b));
        let count = vals.len();
        let mean = vals.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 1 {
            vals[count / 2]
        } else {
            (vals[count / 2 - 1] + vals[count / 2]) / 2.0
        };
        let span = last_year - first_year;
        let cagr = if span > 0 && first > 0.0 && last > 0.0 {
            Some((last / first).powf(1.0 / span as f64) - 1.0)
        } else {
            None
        };

        out.push(Summary {
            country: country.to_string(),
            count,
            first_year,
            last_year,
            min: vals[0],
            max: vals[count - 1],
            mean,
            median,
            cagr,
        });
    }
    out
}

/// Year-by-year share of global usage for one country.
///
/// Only years present in the country's series are returned.
pub fn country_share(rows: &[CountryYear], global: &[GlobalYear], country: &str) -> Vec<Share> {
    let totals: BTreeMap<i32, f64> = global
        .iter()
        .map(|g| (g.year, g.total_fertilizer_usage))
        .collect();
    rows.iter()
        .filter(|r| r.country == country)
        .map(|r| {
            let global = totals.get(&r.year).copied().unwrap_or(0.0);
            Share {
                year: r.year,
                country: r.total_fertilizer_usage,
                global,
                share: (global != 0.0).then(|| r.total_fertilizer_usage / global),
            }
        })
        .collect()
}
