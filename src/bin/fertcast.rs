use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fertcast::config::{DEFAULT_DATA_PATH, DEFAULT_MIN_HISTORY, DEFAULT_PERIODS};
use fertcast::{Dataset, DatasetCache, ForecastConfig, ForecastOutcome, SeriesPoint};
use fertcast::{forecast_with, report, stats, storage};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "fertcast",
    version,
    about = "Aggregate country fertilizer usage and forecast it with automatic ARIMA"
)]
struct Cli {
    /// Source CSV (Country, Year, N_k_t, P2O5_k_t, K2O_k_t, N_P2O5_K2O_k_t).
    #[arg(long, global = true, env = "FERTCAST_DATA", default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,
    /// Locale for number formatting (en, de, fr, es, it, pt, nl).
    #[arg(long, global = true, default_value = "en")]
    locale: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the countries present in the dataset.
    Countries,
    /// Print the annual series of a country (or the global series).
    Series(SelectArgs),
    /// Print summary statistics (all countries, or one country with its global share).
    Summary(SelectArgs),
    /// Print (and optionally save) the historical + forecast table.
    Forecast(ForecastArgs),
    /// Write the aggregated country and global tables.
    Export(ExportArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct SelectArgs {
    /// Country name as it appears in the dataset. Omit for the global series.
    #[arg(short, long)]
    country: Option<String>,
}

#[derive(Args, Debug)]
struct ForecastArgs {
    #[command(flatten)]
    select: SelectArgs,
    /// Number of years to forecast.
    #[arg(short, long, default_value_t = DEFAULT_PERIODS)]
    periods: usize,
    /// Series shorter than this are printed without a forecast.
    #[arg(long, default_value_t = DEFAULT_MIN_HISTORY)]
    min_history: usize,
    /// Save the table to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Destination of the country table (.csv or .json).
    #[arg(long)]
    country_out: Option<PathBuf>,
    /// Destination of the global table (.csv or .json).
    #[arg(long)]
    global_out: Option<PathBuf>,
    /// Output format. If omitted, inferred from each file's extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cache = DatasetCache::new(&cli.data);
    let data = cache
        .get()
        .with_context(|| format!("loading {}", cache.path().display()))?;
    match cli.cmd {
        Command::Countries => cmd_countries(data),
        Command::Series(args) => cmd_series(data, args, &cli.locale),
        Command::Summary(args) => cmd_summary(data, args, &cli.locale),
        Command::Forecast(args) => cmd_forecast(data, args, &cli.locale),
        Command::Export(args) => cmd_export(data, args),
    }
}

fn resolve_format(explicit: Option<OutFormat>, path: &Path) -> Result<OutFormat> {
    if let Some(f) = explicit {
        return Ok(f);
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Ok(OutFormat::Csv),
        "json" => Ok(OutFormat::Json),
        other => anyhow::bail!("unsupported format: {}", other),
    }
}

/// Series for `--country`, or the global series when it is absent.
fn select_series(data: &Dataset, country: Option<&str>) -> Result<(String, Vec<SeriesPoint>)> {
    match country {
        Some(name) => {
            if !data.has_country(name) {
                anyhow::bail!("unknown country: {name} (see `fertcast countries`)");
            }
            Ok((name.to_string(), data.country_series(name)))
        }
        None => Ok(("Global".to_string(), data.global_series())),
    }
}

fn cmd_countries(data: &Dataset) -> Result<()> {
    for name in data.countries() {
        println!("{name}");
    }
    Ok(())
}

fn cmd_series(data: &Dataset, args: SelectArgs, locale: &str) -> Result<()> {
    let (label, series) = select_series(data, args.country.as_deref())?;
    println!("{label}");
    print!("{}", report::series_table(&series, locale));
    Ok(())
}

fn cmd_summary(data: &Dataset, args: SelectArgs, locale: &str) -> Result<()> {
    let summaries = stats::country_summary(&data.country);
    match args.country.as_deref() {
        None => {
            for s in &summaries {
                println!("{}", report::summary_line(s, locale));
            }
        }
        Some(name) => {
            let s = summaries
                .iter()
                .find(|s| s.country == name)
                .with_context(|| format!("unknown country: {name}"))?;
            println!("{}", report::summary_line(s, locale));
            let shares = stats::country_share(&data.country, &data.global, name);
            print!("{}", report::share_table(&shares, locale));
        }
    }
    Ok(())
}

fn cmd_forecast(data: &Dataset, args: ForecastArgs, locale: &str) -> Result<()> {
    let (label, series) = select_series(data, args.select.country.as_deref())?;
    let config = ForecastConfig::default()
        .with_periods(args.periods)
        .with_min_history(args.min_history);
    let result = forecast_with(&series, &config);

    match &result.outcome {
        ForecastOutcome::Fitted { order, aicc } => {
            println!("{label}: {order}, AICc={aicc:.3}");
        }
        ForecastOutcome::InsufficientData { required, actual } => {
            eprintln!("{label}: not enough data for forecasting ({actual} of {required} years)");
        }
        ForecastOutcome::Fallback { reason } => {
            eprintln!("{label}: {reason}; forecast repeats the last observed value");
        }
    }
    print!("{}", report::forecast_table(&result, locale));

    if let Some(path) = args.out.as_ref() {
        match resolve_format(args.format, path)? {
            OutFormat::Csv => storage::save_forecast_csv(&result.points, path)?,
            OutFormat::Json => storage::save_forecast_json(&result.points, path)?,
        }
        eprintln!("Saved {} rows to {}", result.len(), path.display());
    }
    Ok(())
}

fn cmd_export(data: &Dataset, args: ExportArgs) -> Result<()> {
    if args.country_out.is_none() && args.global_out.is_none() {
        anyhow::bail!("nothing to export: pass --country-out and/or --global-out");
    }
    if let Some(path) = args.country_out.as_ref() {
        match resolve_format(args.format, path)? {
            OutFormat::Csv => storage::save_country_csv(&data.country, path)?,
            OutFormat::Json => storage::save_country_json(&data.country, path)?,
        }
        eprintln!("Saved {} rows to {}", data.country.len(), path.display());
    }
    if let Some(path) = args.global_out.as_ref() {
        match resolve_format(args.format, path)? {
            OutFormat::Csv => storage::save_global_csv(&data.global, path)?,
            OutFormat::Json => storage::save_global_json(&data.global, path)?,
        }
        eprintln!("Saved {} rows to {}", data.global.len(), path.display());
    }
    Ok(())
}
