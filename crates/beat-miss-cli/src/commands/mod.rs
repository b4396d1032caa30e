pub mod catalog;
pub mod comparison;
pub mod summary;

use tracing::debug;

use beat_miss_core::data::Tables;
use beat_miss_core::summary::EstimateRow;

use crate::input;

/// Lookup tables from `--tables` or piped stdin.
pub(crate) fn load_tables(path: Option<&str>) -> Result<Tables, Box<dyn std::error::Error>> {
    let tables: Tables = if let Some(p) = path {
        input::file::read_json(p)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("Provide --tables <file> or pipe the tables JSON on stdin".into());
    };
    debug!(
        companies = tables.actuals.len(),
        previews = tables.previews.len(),
        "tables loaded"
    );
    Ok(tables)
}

/// Estimate rows from a `--rows` CSV file or CSV piped on stdin.
pub(crate) fn load_estimate_rows(
    path: Option<&str>,
) -> Result<Vec<EstimateRow>, Box<dyn std::error::Error>> {
    let rows: Vec<EstimateRow> = if let Some(p) = path {
        input::file::read_estimate_csv(p)?
    } else if let Some(text) = input::stdin::read_stdin_text()? {
        input::file::parse_estimate_csv(text.as_bytes())?
    } else {
        return Err("Provide --rows <file.csv> or pipe the estimate CSV on stdin".into());
    };
    debug!(rows = rows.len(), "estimate rows loaded");
    Ok(rows)
}
