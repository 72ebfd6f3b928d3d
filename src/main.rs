#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::uninlined_format_args)]

mod csv_reader;
mod esd;
mod output;
mod stats;
mod structs;

use clap::{Parser, Subcommand};
use esd::pipeline::RankingRequest;
use std::path::{Path, PathBuf};
use structs::{AggFunc, CsvData, EsdConfig, Result, SkError};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// skesd - Scott-Knott ESD ranking of treatment groups
#[derive(Parser, Debug)]
#[command(name = "skesd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank groups into statistically distinct clusters
    Rank {
        /// Input CSV/TSV file with one observation per row
        #[arg(short, long)]
        csv: PathBuf,

        /// Column naming the treatment group of each row
        #[arg(short, long)]
        group_by: String,

        /// Numeric column holding the performance measure
        #[arg(short = 'm', long = "value")]
        value: String,

        /// Statistic used for the initial ordering (median or mean)
        #[arg(long, default_value = "median")]
        agg: String,

        /// Significance level for accepting a split
        #[arg(long, env = "SKESD_ALPHA", default_value_t = EsdConfig::DEFAULT_ALPHA)]
        alpha: f64,

        /// Minimum Cliff's delta between some pair of groups to accept a split
        #[arg(long, env = "SKESD_EFFECT_THRESH", default_value_t = EsdConfig::DEFAULT_EFFECT_THRESH)]
        effect_thresh: f64,

        /// Treat input as TSV instead of CSV
        #[arg(long)]
        tsv: bool,

        /// Evaluate independent sub-blocks in parallel
        #[arg(long)]
        parallel: bool,

        /// Print the ranking as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Also write summary.txt, clusters.csv and ranking.json here
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Compare two groups with Cliff's delta and Kruskal-Wallis
    Compare {
        /// Input CSV/TSV file with one observation per row
        #[arg(short, long)]
        csv: PathBuf,

        /// Column naming the treatment group of each row
        #[arg(short, long)]
        group_by: String,

        /// Numeric column holding the performance measure
        #[arg(short = 'm', long = "value")]
        value: String,

        /// First group
        left: String,

        /// Second group
        right: String,

        /// Significance level for the split gate
        #[arg(long, env = "SKESD_ALPHA", default_value_t = EsdConfig::DEFAULT_ALPHA)]
        alpha: f64,

        /// Minimum Cliff's delta for the split gate
        #[arg(long, env = "SKESD_EFFECT_THRESH", default_value_t = EsdConfig::DEFAULT_EFFECT_THRESH)]
        effect_thresh: f64,

        /// Treat input as TSV instead of CSV
        #[arg(long)]
        tsv: bool,

        /// Print the comparison as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Option<Commands>) -> Result<()> {
    match command {
        Some(Commands::Rank {
            csv,
            group_by,
            value,
            agg,
            alpha,
            effect_thresh,
            tsv,
            parallel,
            json,
            output_dir,
        }) => {
            let config = EsdConfig {
                alpha,
                effect_thresh,
                agg_func: agg.parse::<AggFunc>()?,
            };
            let request = RankingRequest {
                group_column: &group_by,
                value_column: &value,
                parallel,
            };
            run_rank(&csv, &request, &config, tsv, json, output_dir.as_deref())
        }

        Some(Commands::Compare {
            csv,
            group_by,
            value,
            left,
            right,
            alpha,
            effect_thresh,
            tsv,
            json,
        }) => {
            let config = EsdConfig {
                alpha,
                effect_thresh,
                ..EsdConfig::default()
            };
            run_compare(&csv, &group_by, &value, (&left, &right), &config, tsv, json)
        }

        None => {
            eprintln!("No subcommand provided. Use 'skesd rank' or 'skesd compare'.");
            eprintln!("Run 'skesd --help' for usage information.");
            std::process::exit(1);
        }
    }
}

/// Load the input table, failing early if the path does not exist
fn load_csv(csv_path: &Path, tsv: bool) -> Result<CsvData> {
    if !csv_path.exists() {
        return Err(SkError::Config(format!(
            "CSV file not found: {}",
            csv_path.display()
        )));
    }

    let csv_data = CsvData::from_file(csv_path, tsv)?;
    info!(
        path = %csv_path.display(),
        rows = csv_data.row_count(),
        columns = csv_data.col_count(),
        "Loaded input table"
    );
    Ok(csv_data)
}

/// Run the ranking and report it
fn run_rank(
    csv_path: &Path,
    request: &RankingRequest<'_>,
    config: &EsdConfig,
    tsv: bool,
    json: bool,
    output_dir: Option<&Path>,
) -> Result<()> {
    // Reject bad settings before reading any data
    config.validate()?;

    let csv_data = load_csv(csv_path, tsv)?;
    let result = esd::pipeline::run_ranking(&csv_data, request, config)?;

    if json {
        println!("{}", output::ranking_json(&result)?);
    } else {
        print!("{}", output::render_ranking(&result));
    }

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;

        let summary = output::build_summary(csv_path, &csv_data, &result);
        output::write_summary(dir, &summary)?;
        output::write_clusters(dir, &result)?;
        output::write_ranking_json(dir, &result)?;

        info!(dir = %dir.display(), "Wrote summary.txt, clusters.csv, ranking.json");
    }

    Ok(())
}

/// Run a two-group comparison and report it
fn run_compare(
    csv_path: &Path,
    group_column: &str,
    value_column: &str,
    pair: (&str, &str),
    config: &EsdConfig,
    tsv: bool,
    json: bool,
) -> Result<()> {
    config.validate()?;

    let csv_data = load_csv(csv_path, tsv)?;
    let comparison =
        esd::pipeline::compare_groups(&csv_data, group_column, value_column, pair, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print!("{}", output::render_comparison(&comparison));
    }

    Ok(())
}
