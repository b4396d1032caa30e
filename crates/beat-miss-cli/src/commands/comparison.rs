use clap::Args;
use serde::de::DeserializeOwned;
use serde_json::Value;

use beat_miss_core::comparison::company::{self, CompanyComparisonInput};
use beat_miss_core::comparison::portfolio::{self, PortfolioInput};
use beat_miss_core::comparison::ComparisonRequest;
use beat_miss_core::{ComparisonConfig, StatementType};

use crate::config::{resolve_config, ConfigOverrides};
use crate::input;

use super::load_tables;

/// Period, statement type and expectation source flags
#[derive(Args)]
pub struct SelectionArgs {
    /// Expected (preview) period, e.g. Q1FY25
    #[arg(long)]
    pub expected_period: Option<String>,

    /// Actual results period (defaults to the expected period)
    #[arg(long)]
    pub actual_period: Option<String>,

    /// Standalone or Consolidated
    #[arg(long, default_value = "Standalone")]
    pub statement_type: StatementType,

    /// "Consensus" or an exact broker name
    #[arg(long, default_value = "Consensus")]
    pub broker: String,
}

impl SelectionArgs {
    fn request(&self) -> Result<ComparisonRequest, Box<dyn std::error::Error>> {
        let expected = self
            .expected_period
            .clone()
            .ok_or("--expected-period is required (or provide --input)")?;
        let actual = self.actual_period.clone().unwrap_or_else(|| expected.clone());
        Ok(ComparisonRequest::new(
            expected,
            actual,
            self.statement_type,
            self.broker.as_str(),
        ))
    }
}

/// Arguments for a single-company comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON request file (company, periods, broker, config)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to JSON file with the actuals and previews tables
    #[arg(long)]
    pub tables: Option<String>,

    /// Company identifier, or display name with --lookup-key name
    #[arg(long)]
    pub company: Option<String>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Arguments for a portfolio-wide comparison
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to JSON request file (periods, broker, companies, config)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to JSON file with the actuals and previews tables
    #[arg(long)]
    pub tables: Option<String>,

    /// Restrict to these company keys (comma-separated, order kept for ties)
    #[arg(long, value_delimiter = ',')]
    pub companies: Option<Vec<String>>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Parse a JSON request file together with its own `config` block, if any.
///
/// A request without one leaves the settings file and defaults in charge.
fn read_request<T: DeserializeOwned>(
    path: &str,
) -> Result<(T, Option<ComparisonConfig>), Box<dyn std::error::Error>> {
    let value: Value = input::file::read_json(path)?;
    let embedded = match value.get("config") {
        Some(config) if !config.is_null() => Some(serde_json::from_value(config.clone())?),
        _ => None,
    };
    Ok((serde_json::from_value(value)?, embedded))
}

pub fn run_compare(
    args: CompareArgs,
    config_path: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = match args.input {
        Some(ref path) => {
            let (mut request, embedded): (CompanyComparisonInput, _) = read_request(path)?;
            request.config = resolve_config(config_path, embedded, &args.overrides)?;
            request
        }
        None => CompanyComparisonInput {
            company: args
                .company
                .ok_or("--company is required (or provide --input)")?,
            request: args.selection.request()?,
            config: resolve_config(config_path, None, &args.overrides)?,
        },
    };

    let tables = load_tables(args.tables.as_deref())?;
    let result = company::run_company_comparison(&tables, &request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_portfolio(
    args: PortfolioArgs,
    config_path: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = match args.input {
        Some(ref path) => {
            let (mut request, embedded): (PortfolioInput, _) = read_request(path)?;
            request.config = resolve_config(config_path, embedded, &args.overrides)?;
            request
        }
        None => PortfolioInput {
            request: args.selection.request()?,
            companies: None,
            config: resolve_config(config_path, None, &args.overrides)?,
        },
    };
    if args.companies.is_some() {
        request.companies = args.companies;
    }

    let tables = load_tables(args.tables.as_deref())?;
    let result = portfolio::run_portfolio(&tables, &request)?;
    Ok(serde_json::to_value(result)?)
}
