//! Dashboard summary over flat broker-estimate rows.

pub mod filter;
pub mod rows;
pub mod table;

pub use filter::{filter_options, for_company, EstimateFilter, FilterOptions};
pub use rows::{classify_row, validate_columns, EstimateRow, REQUIRED_COLUMNS};
pub use table::{
    beat_values, build_summary_table, expected_by_broker, run_summary, select_rows, BeatValue,
    BrokerExpectation, SummaryInput, SummaryOutput, SummaryRow, NO_ROWS_NOTICE,
};
