use clap::Args;
use serde_json::{json, Value};

use beat_miss_core::data::catalog;
use beat_miss_core::summary::filter_options;

use super::{load_estimate_rows, load_tables};

/// Arguments for listing periods
#[derive(Args)]
pub struct PeriodsArgs {
    /// Path to JSON file with the actuals and previews tables
    #[arg(long)]
    pub tables: Option<String>,
}

/// Arguments for listing companies
#[derive(Args)]
pub struct CompaniesArgs {
    /// Path to JSON file with the actuals and previews tables
    #[arg(long)]
    pub tables: Option<String>,
}

/// Arguments for listing expectation sources
#[derive(Args)]
pub struct BrokersArgs {
    /// Path to JSON file with the actuals and previews tables
    #[arg(long)]
    pub tables: Option<String>,

    /// Expected (preview) period
    #[arg(long)]
    pub period: String,
}

/// Arguments for listing estimate-row filter values
#[derive(Args)]
pub struct OptionsArgs {
    /// Path to the estimate-row CSV export (or pipe it on stdin)
    #[arg(long)]
    pub rows: Option<String>,
}

pub fn run_periods(args: PeriodsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tables = load_tables(args.tables.as_deref())?;
    Ok(json!({
        "expected_periods": catalog::expected_periods(&tables.previews),
        "actual_periods": catalog::actual_periods(&tables.actuals),
    }))
}

/// Display name to identifier, the mapping used by name lookups.
pub fn run_companies(args: CompaniesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tables = load_tables(args.tables.as_deref())?;
    Ok(json!({
        "companies": catalog::name_index(&tables.actuals),
    }))
}

pub fn run_brokers(args: BrokersArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tables = load_tables(args.tables.as_deref())?;
    Ok(json!({
        "period": args.period,
        "brokers": catalog::brokers_for_period(&tables.previews, &args.period),
    }))
}

pub fn run_options(args: OptionsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rows = load_estimate_rows(args.rows.as_deref())?;
    Ok(serde_json::to_value(filter_options(&rows))?)
}
