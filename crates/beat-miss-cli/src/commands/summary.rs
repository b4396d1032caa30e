use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

use beat_miss_core::comparison::BeatStatus;
use beat_miss_core::summary::{self, EstimateFilter, EstimateRow, SummaryInput, NO_ROWS_NOTICE};

use crate::config::{resolve_config, ConfigOverrides};

use super::load_estimate_rows;

/// Arguments for the estimate-row summary
#[derive(Args)]
pub struct SummaryArgs {
    /// Path to the estimate-row CSV export (or pipe it on stdin)
    #[arg(long)]
    pub rows: Option<String>,

    /// Company symbol (nsesymbol)
    #[arg(long)]
    pub symbol: String,

    /// Keep only these brokers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub brokers: Option<Vec<String>>,

    /// Keep only these statement types as exported (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub picked_types: Option<Vec<String>>,

    /// Keep only rows whose sales flag is one of these
    #[arg(long, value_delimiter = ',')]
    pub sales_flags: Option<Vec<BeatStatus>>,

    /// Keep only rows whose PAT flag is one of these
    #[arg(long, value_delimiter = ',')]
    pub pat_flags: Option<Vec<BeatStatus>>,

    /// Keep only rows whose EBITDA flag is one of these
    #[arg(long, value_delimiter = ',')]
    pub ebitda_flags: Option<Vec<BeatStatus>>,

    /// Keep only rows whose overall flag is one of these
    #[arg(long, value_delimiter = ',')]
    pub overall_flags: Option<Vec<BeatStatus>>,

    /// Recompute the sales/EBITDA/PAT flags from the row values first
    #[arg(long)]
    pub classify: bool,

    /// Inline band in percent used with --classify
    #[arg(long)]
    pub inline_band_pct: Option<Decimal>,

    /// Inline band in basis points used with --classify
    #[arg(long)]
    pub inline_band_bps: Option<Decimal>,

    /// Also write the selected rows to <dir>/filtered_<timestamp>.csv
    #[arg(long)]
    pub export_dir: Option<String>,
}

fn set<T: Ord>(values: Option<Vec<T>>) -> Option<BTreeSet<T>> {
    values.map(|v| v.into_iter().collect())
}

fn export_rows(dir: &str, rows: &[EstimateRow]) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = Path::new(dir).join(format!("filtered_{stamp}.csv"));
    let mut wtr = csv::Writer::from_path(&path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(path)
}

pub fn run_summary(
    args: SummaryArgs,
    config_path: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let reclassify = if args.classify {
        let overrides = ConfigOverrides {
            inline_band_pct: args.inline_band_pct,
            inline_band_bps: args.inline_band_bps,
            ..Default::default()
        };
        Some(resolve_config(config_path, None, &overrides)?.inline_band)
    } else {
        None
    };

    let input = SummaryInput {
        symbol: args.symbol,
        rows: load_estimate_rows(args.rows.as_deref())?,
        filter: EstimateFilter {
            brokers: set(args.brokers),
            picked_types: set(args.picked_types),
            sales_flags: set(args.sales_flags),
            pat_flags: set(args.pat_flags),
            ebitda_flags: set(args.ebitda_flags),
            overall_flags: set(args.overall_flags),
        },
        reclassify,
    };

    let result = summary::run_summary(&input).map_err(|e| -> Box<dyn std::error::Error> {
        if e.is_not_found() {
            NO_ROWS_NOTICE.into()
        } else {
            e.into()
        }
    })?;

    if let Some(ref dir) = args.export_dir {
        let path = export_rows(dir, &summary::select_rows(&input)?)?;
        info!(path = %path.display(), "selected rows exported");
        eprintln!("Exported selected rows to {}", path.display());
    }

    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::input::file::read_estimate_csv;

    #[test]
    fn test_export_rows_reads_back() {
        let rows = vec![
            EstimateRow {
                co_code: Some("101".into()),
                nsesymbol: Some("ACME".into()),
                broker_name: Some("Kotak".into()),
                picked_type: Some("Standalone".into()),
                sales: Some(dec!(1000)),
                expected_sales: Some(dec!(950.5)),
                sales_flag: Some(BeatStatus::Beat),
                ..Default::default()
            },
            EstimateRow {
                nsesymbol: Some("ACME".into()),
                broker_name: Some("Axis".into()),
                pat: Some(dec!(12)),
                pat_flag: Some(BeatStatus::Inline),
                ..Default::default()
            },
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = export_rows(&dir.path().to_string_lossy(), &rows).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("filtered_") && name.ends_with(".csv"));
        // filtered_YYYYmmdd_HHMMSS.csv
        assert_eq!(name.len(), "filtered_20250101_120000.csv".len());

        let back = read_estimate_csv(&path.to_string_lossy()).unwrap();
        assert_eq!(back, rows);
    }
}
