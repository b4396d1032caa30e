mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::catalog::{BrokersArgs, CompaniesArgs, OptionsArgs, PeriodsArgs};
use commands::comparison::{CompareArgs, PortfolioArgs};
use commands::summary::SummaryArgs;

/// Quarterly results against consensus and broker expectations
#[derive(Parser)]
#[command(
    name = "beatmiss",
    version,
    about = "Quarterly results against consensus and broker expectations",
    long_about = "A CLI for comparing reported quarterly results (sales, EBITDA, PAT and \
                  margins) against consensus or individual broker estimates with decimal \
                  precision. Classifies each metric as Beat, Inline or Miss and ranks \
                  companies by total beats."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// YAML file with comparison settings (inline band, lookup key, metrics)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare one company's actual results against expectations
    Compare(CompareArgs),
    /// Compare every company and rank by total beats
    Portfolio(PortfolioArgs),
    /// Summarise broker estimate rows for one company
    Summary(SummaryArgs),
    /// List expected and actual reporting periods
    Periods(PeriodsArgs),
    /// List company names and identifiers
    Companies(CompaniesArgs),
    /// List expectation sources for an expected period
    Brokers(BrokersArgs),
    /// List filter values available in an estimate-row export
    Options(OptionsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("beatmiss=warn,beat_miss_core=warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let config_path = cli.config.as_deref();
    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Compare(args) => commands::comparison::run_compare(args, config_path),
        Commands::Portfolio(args) => commands::comparison::run_portfolio(args, config_path),
        Commands::Summary(args) => commands::summary::run_summary(args, config_path),
        Commands::Periods(args) => commands::catalog::run_periods(args),
        Commands::Companies(args) => commands::catalog::run_companies(args),
        Commands::Brokers(args) => commands::catalog::run_brokers(args),
        Commands::Options(args) => commands::catalog::run_options(args),
        Commands::Version => {
            println!("beatmiss {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
