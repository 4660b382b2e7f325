//! Dipwatch CLI: the dashboard pipeline without the terminal UI.
//!
//! Commands:
//! - `show`: render a selection and print tiles, drawdowns and notices
//! - `universe`: list or search the instrument universe
//! - `period`: resolve a period label to its start/end window
//! - `config`: print the effective configuration as TOML

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dipwatch_core::analysis::{ChartSpec, Tile};
use dipwatch_core::domain::{period, Period};
use dipwatch_core::{Dashboard, DashboardConfig, DashboardView, Selection};

#[derive(Parser)]
#[command(name = "dipwatch", about = "Dipwatch CLI: Japanese equities vs. benchmarks")]
struct Cli {
    /// Path to a TOML config file. Defaults to <config_dir>/dipwatch/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a selection and print the summary.
    Show {
        /// Instrument codes, comma separated (e.g. 8306,1802). Defaults to the configured list.
        #[arg(long, value_delimiter = ',')]
        codes: Option<Vec<String>>,

        /// Period label: 5d, 1mo, 6mo, 1y, 3y, 5y, 10y (or 5日 ... 10年).
        #[arg(long, default_value = "1y")]
        period: String,

        /// Benchmark names, comma separated. Defaults to those enabled in config.
        #[arg(long, value_delimiter = ',')]
        bench: Option<Vec<String>>,

        /// Plot raw prices instead of rebasing to 100.
        #[arg(long, default_value_t = false)]
        no_normalize: bool,

        /// Write the plotted series as a wide CSV.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Reference date (YYYY-MM-DD). Defaults to now.
        #[arg(long)]
        date: Option<String>,
    },
    /// List instruments in the universe.
    Universe {
        /// Only show instruments whose code or name contains this text.
        #[arg(long)]
        search: Option<String>,
    },
    /// Resolve a period label to its window.
    Period {
        label: String,

        /// Reference date (YYYY-MM-DD). Defaults to now.
        #[arg(long)]
        date: Option<String>,
    },
    /// Print the effective configuration.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = DashboardConfig::load_or_default(cli.config.as_deref()).context("loading config")?;

    match cli.command {
        Commands::Show {
            codes,
            period,
            bench,
            no_normalize,
            csv,
            date,
        } => run_show(config, codes, &period, bench, !no_normalize, csv.as_deref(), date.as_deref()),
        Commands::Universe { search } => run_universe(config, search.as_deref()),
        Commands::Period { label, date } => run_period(&label, date.as_deref()),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn reference_time(date: Option<&str>) -> Result<NaiveDateTime> {
    match date {
        Some(s) => {
            let d = NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("bad --date '{s}'"))?;
            Ok(d.and_time(chrono::Local::now().time()))
        }
        None => Ok(chrono::Local::now().naive_local()),
    }
}

fn run_show(
    config: DashboardConfig,
    codes: Option<Vec<String>>,
    period_label: &str,
    bench: Option<Vec<String>>,
    normalize: bool,
    csv_path: Option<&Path>,
    date: Option<&str>,
) -> Result<()> {
    let now = reference_time(date)?;
    let mut dashboard = Dashboard::connect(config)?;

    let defaults = dashboard.default_selection();
    let selection = Selection {
        codes: codes.unwrap_or(defaults.codes),
        period: Period::from_label(period_label),
        benchmarks: bench.unwrap_or(defaults.benchmarks),
        normalize,
    };

    let view = dashboard.render(&selection, now);
    print_view(&view);

    if let Some(path) = csv_path {
        match &view.chart {
            Some(spec) => {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("creating {}", path.display()))?;
                write_wide_csv(spec, file)?;
                println!("Chart data saved to: {}", path.display());
            }
            None => println!("Nothing plotted; {} not written", path.display()),
        }
    }

    let stats = dashboard.cache_stats();
    tracing::debug!(hits = stats.hits, misses = stats.misses, "fetch cache");
    Ok(())
}

fn print_tiles(title: &str, tiles: &[Tile]) {
    if tiles.is_empty() {
        return;
    }
    println!("{title}");
    println!("{}", "-".repeat(64));
    for t in tiles {
        println!("{:<28} {:>14} {:>20}", t.title(), t.value_text(), t.delta_text());
    }
    println!();
}

fn print_view(view: &DashboardView) {
    println!(
        "Period: {} ({} to {})",
        view.period.label(),
        view.window.start.format("%Y-%m-%d"),
        view.window.end.format("%Y-%m-%d")
    );
    println!();

    print_tiles("Latest prices", &view.instrument_tiles);
    print_tiles("Benchmarks", &view.benchmark_tiles);

    if !view.drawdowns.is_empty() {
        println!("Drawdown");
        println!("{}", "-".repeat(64));
        for d in &view.drawdowns {
            println!(
                "{:<28} {:>12.1} {:>12.1} {:>7.2}%  {}",
                d.label,
                d.current_price,
                d.window_high,
                d.drop_rate_pct,
                d.category.label()
            );
        }
        println!();
    }

    for notice in &view.notices {
        eprintln!("warning: {notice}");
    }
}

/// One row per date in the union of all series; blank where a series has
/// no value.
fn write_wide_csv<W: Write>(spec: &ChartSpec, writer: W) -> Result<()> {
    let mut rows: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    let n = spec.series.len();
    for (i, s) in spec.series.iter().enumerate() {
        for (date, value) in &s.points {
            rows.entry(*date).or_insert_with(|| vec![None; n])[i] = Some(*value);
        }
    }

    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["date".to_string()];
    header.extend(spec.series.iter().map(|s| s.label.clone()));
    wtr.write_record(&header)?;
    for (date, values) in rows {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(values.iter().map(|v| v.map(|x| format!("{x:.4}")).unwrap_or_default()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn run_universe(config: DashboardConfig, search: Option<&str>) -> Result<()> {
    let dashboard = Dashboard::connect(config)?;
    let universe = dashboard.universe();
    if let Some(notice) = &universe.notice {
        eprintln!("warning: {notice}");
    }
    if let Some(src) = &universe.source {
        println!("Source: {}", src.display());
    }
    let matches = universe.search(search.unwrap_or(""));
    for inst in &matches {
        println!("{:<8} {}", inst.code, inst.name);
    }
    println!("{} instruments", matches.len());
    Ok(())
}

fn run_period(label: &str, date: Option<&str>) -> Result<()> {
    let now = reference_time(date)?;
    let p = Period::from_label(label);
    let window = period::resolve(label, now);
    println!("{} ({})", p.label(), p.code());
    println!("start: {}", window.start.format("%Y-%m-%d %H:%M:%S"));
    println!("end:   {}", window.end.format("%Y-%m-%d %H:%M:%S"));
    Ok(())
}
