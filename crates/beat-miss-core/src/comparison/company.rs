use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::classifier::{is_beat, total_beats, tri_state, BeatStatus};
use super::metrics::{margin_difference_bps, percent_difference};
use super::resolver::{resolve, ComparisonRequest, ResolvedRecords};
use crate::config::ComparisonConfig;
use crate::data::{ActualResult, ExpectedResult, Tables};
use crate::error::BeatMissError;
use crate::types::{with_metadata, ComputationOutput, Metric, PerMetric, StatementType};
use crate::BeatMissResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Actual vs expected comparison for one company, period, statement type
/// and expectation source. Derived on every query, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub company_id: String,
    /// Display name, or the identifier when no name is known
    pub company_name: String,
    pub statement_type: StatementType,
    pub expected_period: String,
    pub actual_period: String,
    pub broker: String,
    pub actual: PerMetric<Option<Decimal>>,
    pub expected: PerMetric<Option<Decimal>>,
    /// Percent for sales/EBITDA/PAT, bps for the margins
    pub difference: PerMetric<Option<Decimal>>,
    /// Beat/Inline/Miss using the configured inline band
    pub status: PerMetric<Option<BeatStatus>>,
    /// 1 when the difference is strictly positive, else 0
    pub beat: PerMetric<u8>,
    pub total_beats: u32,
}

/// One line of the single-company breakdown view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub metric: String,
    pub value: Option<Decimal>,
    pub status: Option<BeatStatus>,
}

/// Single-company comparison with its breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyComparisonOutput {
    pub row: ComparisonRow,
    pub breakdown: Vec<MetricValue>,
}

/// Input for a single-company comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyComparisonInput {
    pub company: String,
    #[serde(flatten)]
    pub request: ComparisonRequest,
    #[serde(default)]
    pub config: ComparisonConfig,
}

// ---------------------------------------------------------------------------
// Metric extraction
// ---------------------------------------------------------------------------

fn actual_values(actual: &ActualResult) -> PerMetric<Option<Decimal>> {
    PerMetric {
        sales: actual.net_sales,
        ebitda: actual.ebitda,
        pat: actual.net_profit,
        ebitda_margin: actual.ebitda_margin_percent,
        pat_margin: actual.pat_margin_percent,
    }
}

fn expected_values(expected: &ExpectedResult) -> PerMetric<Option<Decimal>> {
    PerMetric {
        sales: expected.expected_sales,
        ebitda: expected.expected_ebitda,
        pat: expected.expected_pat,
        ebitda_margin: expected.ebitda_margin_percent,
        pat_margin: expected.pat_margin_percent,
    }
}

fn metric_difference(
    metric: Metric,
    actual: Option<Decimal>,
    expected: Option<Decimal>,
) -> Option<Decimal> {
    if metric.is_margin() {
        margin_difference_bps(actual, expected)
    } else {
        percent_difference(actual, expected)
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Compare resolved records metric by metric.
///
/// Each metric stands alone: an undefined difference only clears that
/// metric's flag. Metrics outside the configured set are left undefined.
pub fn compare_records(
    records: &ResolvedRecords<'_>,
    request: &ComparisonRequest,
    config: &ComparisonConfig,
) -> ComparisonRow {
    let actual = actual_values(records.actual);
    let expected = expected_values(&records.expected);

    let difference = PerMetric::from_fn(|m| {
        if config.metrics.contains(m) {
            metric_difference(m, *actual.get(m), *expected.get(m))
        } else {
            None
        }
    });
    let status = PerMetric::from_fn(|m| {
        tri_state(*difference.get(m), config.inline_band.for_metric(m))
    });
    let beat = PerMetric::from_fn(|m| u8::from(is_beat(*difference.get(m))));
    let total_beats = total_beats(beat.iter().map(|(_, &b)| b == 1));

    ComparisonRow {
        company_id: records.company_id.to_string(),
        company_name: records.company_name.to_string(),
        statement_type: request.statement_type,
        expected_period: request.expected_period.clone(),
        actual_period: request.actual_period.clone(),
        broker: request.broker.to_string(),
        actual,
        expected,
        difference,
        status,
        beat,
        total_beats,
    }
}

/// Resolve and compare one company, surfacing the reason for a miss.
pub fn try_build_comparison(
    tables: &Tables,
    request: &ComparisonRequest,
    company: &str,
    config: &ComparisonConfig,
) -> BeatMissResult<ComparisonRow> {
    let records = resolve(tables, request, company, config.lookup_key)?;
    Ok(compare_records(&records, request, config))
}

/// Resolve and compare one company; `None` when any record is missing.
pub fn build_comparison(
    tables: &Tables,
    request: &ComparisonRequest,
    company: &str,
    config: &ComparisonConfig,
) -> Option<ComparisonRow> {
    try_build_comparison(tables, request, company, config).ok()
}

/// `(label, value, status)` per configured metric, in canonical order.
pub fn metric_breakdown(row: &ComparisonRow, config: &ComparisonConfig) -> Vec<MetricValue> {
    Metric::ALL
        .into_iter()
        .filter(|m| config.metrics.contains(*m))
        .map(|m| MetricValue {
            metric: m.label().to_string(),
            value: *row.difference.get(m),
            status: *row.status.get(m),
        })
        .collect()
}

/// Single-company comparison wrapped in the standard output envelope.
pub fn run_company_comparison(
    tables: &Tables,
    input: &CompanyComparisonInput,
) -> BeatMissResult<ComputationOutput<CompanyComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.company.trim().is_empty() {
        return Err(BeatMissError::InvalidInput {
            field: "company".into(),
            reason: "Company identifier is required".into(),
        });
    }
    input.request.validate()?;
    input.config.validate()?;

    let row = try_build_comparison(tables, &input.request, &input.company, &input.config)?;

    for (metric, value) in row.difference.iter() {
        if value.is_none() && input.config.metrics.contains(metric) {
            warnings.push(format!(
                "{} could not be computed: missing or zero input",
                metric.label()
            ));
        }
    }

    let breakdown = metric_breakdown(&row, &input.config);
    let output = CompanyComparisonOutput { row, breakdown };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Actual vs Expected Results: percent difference for amounts, bps spread for margins",
        &serde_json::json!({
            "company": input.company,
            "expected_period": input.request.expected_period,
            "actual_period": input.request.actual_period,
            "statement_type": input.request.statement_type,
            "broker": input.request.broker,
            "inline_band": input.config.inline_band,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
