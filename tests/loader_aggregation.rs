//! Loading, normalization and aggregation of the raw fertilizer CSV.

use fertcast::loader::{self, DatasetCache, load_and_process_reader};
use fertcast::{LoadError, SeriesPoint};
use std::collections::BTreeMap;
use std::io::Write;

const HEADER: &str = "Country,Year,N_k_t,P2O5_k_t,K2O_k_t,N_P2O5_K2O_k_t\n";

fn csv(rows: &[&str]) -> String {
    let mut s = HEADER.to_string();
    for r in rows {
        s.push_str(r);
        s.push('\n');
    }
    s
}

fn sample() -> String {
    csv(&[
        "Brazil,1991/92,10,20,30,NA",
        "Brazil,1991,NA,NA,NA,100",
        "Brazil,1992/93,,,,250",
        "Albania,1991,1.5,NA,2.5,",
        "Albania,1992,NA,NA,NA,NA",
        "Chad,1992,3,3,3,12",
    ])
}

#[test]
fn null_components_count_as_zero() {
    let data = load_and_process_reader(csv(&["X,2000,10,NA,5,NA"]).as_bytes()).unwrap();
    assert_eq!(data.country.len(), 1);
    assert_eq!(data.country[0].total_fertilizer_usage, 15.0);
}

#[test]
fn combined_column_takes_precedence() {
    let data = load_and_process_reader(csv(&["X,2000,10,10,10,12"]).as_bytes()).unwrap();
    assert_eq!(data.country[0].total_fertilizer_usage, 12.0);
}

#[test]
fn split_years_are_truncated() {
    let data = load_and_process_reader(csv(&["X,1991/92,NA,NA,NA,7"]).as_bytes()).unwrap();
    assert_eq!(data.country[0].year, 1991);
    assert_eq!(data.global[0].year, 1991);
}

#[test]
fn groups_are_summed_and_sorted() {
    let data = load_and_process_reader(sample().as_bytes()).unwrap();
    let keys: Vec<(&str, i32)> = data
        .country
        .iter()
        .map(|r| (r.country.as_str(), r.year))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("Albania", 1991),
            ("Albania", 1992),
            ("Brazil", 1991),
            ("Brazil", 1992),
            ("Chad", 1992),
        ]
    );
    // "1991/92" and "1991" collapse into one Brazil-1991 group: 60 + 100.
    assert_eq!(data.country[2].total_fertilizer_usage, 160.0);
    assert_eq!(data.countries(), vec!["Albania", "Brazil", "Chad"]);
}

#[test]
fn all_missing_group_is_zero() {
    let data = load_and_process_reader(sample().as_bytes()).unwrap();
    let albania_1992 = data
        .country
        .iter()
        .find(|r| r.country == "Albania" && r.year == 1992)
        .unwrap();
    assert_eq!(albania_1992.total_fertilizer_usage, 0.0);
}

#[test]
fn global_equals_sum_of_countries() {
    let data = load_and_process_reader(sample().as_bytes()).unwrap();
    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for r in &data.country {
        *by_year.entry(r.year).or_default() += r.total_fertilizer_usage;
    }
    assert_eq!(data.global.len(), by_year.len());
    for g in &data.global {
        assert!((g.total_fertilizer_usage - by_year[&g.year]).abs() < 1e-9);
    }
    let years: Vec<i32> = data.global.iter().map(|g| g.year).collect();
    assert_eq!(years, vec![1991, 1992]);
    assert_eq!(data.global[0].total_fertilizer_usage, 4.0 + 160.0);
    assert_eq!(data.global[1].total_fertilizer_usage, 0.0 + 250.0 + 12.0);
}

#[test]
fn load_is_idempotent() {
    let input = sample();
    let a = load_and_process_reader(input.as_bytes()).unwrap();
    let b = load_and_process_reader(input.as_bytes()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn country_and_global_series_projection() {
    let data = load_and_process_reader(sample().as_bytes()).unwrap();
    assert_eq!(
        data.country_series("Brazil"),
        vec![SeriesPoint::new(1991, 160.0), SeriesPoint::new(1992, 250.0)]
    );
    assert!(data.country_series("Atlantis").is_empty());
    assert_eq!(data.global_series().len(), 2);
    assert!(data.has_country("Chad"));
}

#[test]
fn dataset_splits_into_country_and_global_tables() {
    let data = load_and_process_reader(sample().as_bytes()).unwrap();
    let (country, global) = data.clone().into_parts();
    assert_eq!(country, data.country);
    assert_eq!(global, data.global);
}

#[test]
fn extra_columns_and_whitespace_are_tolerated() {
    let input = "Region,Country,Year,N_k_t,P2O5_k_t,K2O_k_t,N_P2O5_K2O_k_t\n\
                 South, Peru , 2001 , 1 , 2 , 3 , NA \n";
    let data = load_and_process_reader(input.as_bytes()).unwrap();
    assert_eq!(data.country[0].country, "Peru");
    assert_eq!(data.country[0].year, 2001);
    assert_eq!(data.country[0].total_fertilizer_usage, 6.0);
}

#[test]
fn malformed_year_aborts_the_load() {
    let err = load_and_process_reader(csv(&["X,2000,1,1,1,3", "X,19x1,1,1,1,3"]).as_bytes())
        .unwrap_err();
    match err {
        LoadError::Parse { line, column, value, .. } => {
            assert_eq!(line, 3);
            assert_eq!(column, "Year");
            assert_eq!(value, "19x1");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn non_numeric_usage_aborts_the_load() {
    let err = load_and_process_reader(csv(&["X,2000,ten,1,1,NA"]).as_bytes()).unwrap_err();
    assert!(matches!(err, LoadError::Parse { column: "N_k_t", .. }), "{err}");
}

#[test]
fn missing_column_is_reported() {
    let input = "Country,Year,N_k_t,P2O5_k_t,K2O_k_t\nX,2000,1,1,1\n";
    let err = load_and_process_reader(input.as_bytes()).unwrap_err();
    assert!(matches!(err, LoadError::MissingColumn("N_P2O5_K2O_k_t")));
}

#[test]
fn cache_loads_once_and_retries_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fert.csv");

    let cache = DatasetCache::new(&path);
    assert!(cache.get().is_err());
    assert!(!cache.is_loaded());

    std::fs::File::create(&path)
        .unwrap()
        .write_all(sample().as_bytes())
        .unwrap();
    let first = cache.get().unwrap().clone();
    assert!(cache.is_loaded());

    // Later edits to the file are not observed by a loaded cache.
    std::fs::write(&path, csv(&["Zed,2010,1,1,1,NA"])).unwrap();
    assert_eq!(cache.get().unwrap(), &first);
    assert_eq!(loader::load_and_process(&path).unwrap().countries(), vec!["Zed"]);
}
