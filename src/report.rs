//! Plain-text tables for terminal output, with locale-aware number formatting.

use crate::forecast::ForecastSeries;
use crate::models::SeriesPoint;
use crate::stats::{Share, Summary};
use num_format::{Locale, ToFormattedString};
use std::fmt::Write;

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator char.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'),
    }
}

/// Format with grouped thousands and up to `decimals` fractional digits
/// (trailing zeros trimmed). Non-finite values print as `NA`.
pub fn format_number(v: f64, decimals: usize, locale_tag: &str) -> String {
    if !v.is_finite() {
        return "NA".to_string();
    }
    let (locale, dec_sep) = map_locale(locale_tag);
    let fixed = format!("{:.*}", decimals, v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let grouped = int_part
        .parse::<u64>()
        .map(|i| i.to_formatted_string(locale))
        .unwrap_or_else(|_| int_part.to_string());
    let frac = frac_part.trim_end_matches('0');
    let sign = if v < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}{dec_sep}{frac}")
    }
}

pub fn series_table(series: &[SeriesPoint], locale_tag: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>6}  {:>18}", "Year", "Total (k t)");
    for p in series {
        let _ = writeln!(out, "{:>6}  {:>18}", p.year, format_number(p.value, 2, locale_tag));
    }
    out
}

pub fn forecast_table(series: &ForecastSeries, locale_tag: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>6}  {:>18}  {}", "Year", "Total (k t)", "Type");
    for p in &series.points {
        let _ = writeln!(
            out,
            "{:>6}  {:>18}  {}",
            p.year,
            format_number(p.total_fertilizer_usage, 2, locale_tag),
            p.kind
        );
    }
    out
}

pub fn summary_line(s: &Summary, locale_tag: &str) -> String {
    let cagr = s
        .cagr
        .map(|g| format!("{}%", format_number(g * 100.0, 2, locale_tag)))
        .unwrap_or_else(|| "NA".to_string());
    format!(
        "{}  years={}..{} ({})  min={} max={} mean={} median={} cagr={}",
        s.country,
        s.first_year,
        s.last_year,
        s.count,
        format_number(s.min, 2, locale_tag),
        format_number(s.max, 2, locale_tag),
        format_number(s.mean, 2, locale_tag),
        format_number(s.median, 2, locale_tag),
        cagr
    )
}

pub fn share_table(shares: &[Share], locale_tag: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>6}  {:>16}  {:>16}  {:>8}", "Year", "Country", "Global", "Share");
    for s in shares {
        let share = s
            .share
            .map(|x| format!("{}%", format_number(x * 100.0, 2, locale_tag)))
            .unwrap_or_else(|| "NA".to_string());
        let _ = writeln!(
            out,
            "{:>6}  {:>16}  {:>16}  {:>8}",
            s.year,
            format_number(s.country, 2, locale_tag),
            format_number(s.global, 2, locale_tag),
            share
        );
    }
    out
}
