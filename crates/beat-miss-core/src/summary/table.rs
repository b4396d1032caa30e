use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use super::filter::{for_company, EstimateFilter};
use super::rows::{classify_row, EstimateRow};
use crate::comparison::classifier::{total_beats, BeatStatus, InlineBand};
use crate::comparison::metrics::{implied_margin, margin_difference_bps, percent_difference};
use crate::error::BeatMissError;
use crate::types::{with_metadata, Bps, ComputationOutput, Metric, Money, Percent};
use crate::BeatMissResult;

/// Notice shown when filtering leaves nothing for the selected company.
pub const NO_ROWS_NOTICE: &str = "No rows for selected company with these filters.";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One-row summary of a company against the mean of its broker estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub company: String,

    pub exp_sales: Option<Money>,
    pub exp_pat: Option<Money>,
    pub exp_ebitda: Option<Money>,
    /// Implied from the expected EBITDA and sales means
    pub exp_ebitda_margin: Option<Percent>,

    pub act_sales: Option<Money>,
    pub act_pat: Option<Money>,
    pub act_ebitda: Option<Money>,
    pub act_ebitda_margin: Option<Percent>,

    pub sales_diff_pct: Option<Percent>,
    pub pat_diff_pct: Option<Percent>,
    pub ebitda_diff_pct: Option<Percent>,
    pub margin_diff_bps: Option<Bps>,

    /// 1 when any broker row flagged the metric as Beat
    pub beat_sales: u8,
    pub beat_pat: u8,
    pub beat_ebitda: u8,
    pub beat_total: u32,
}

/// Mean expectation of one broker across its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerExpectation {
    pub broker: String,
    pub expected_sales: Option<Money>,
    pub expected_ebitda: Option<Money>,
    pub expected_pat: Option<Money>,
}

/// Stored beat percentage of one row for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatValue {
    pub broker: Option<String>,
    pub metric: Metric,
    pub percent: Option<Percent>,
}

/// Input for the summary table of one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryInput {
    /// Company symbol (nsesymbol) to summarise
    pub symbol: String,
    pub rows: Vec<EstimateRow>,
    #[serde(default)]
    pub filter: EstimateFilter,
    /// When set, the three amount flags are recomputed with this band
    /// before filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reclassify: Option<InlineBand>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub summary: SummaryRow,
    pub expected_by_broker: Vec<BrokerExpectation>,
    pub beat_values: Vec<BeatValue>,
    pub rows_considered: usize,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Stable order by broker name; rows without a broker go last.
fn broker_order<'a>(rows: &[&'a EstimateRow]) -> Vec<&'a EstimateRow> {
    let mut ordered = rows.to_vec();
    ordered.sort_by(|a, b| {
        (a.broker_name.is_none(), &a.broker_name).cmp(&(b.broker_name.is_none(), &b.broker_name))
    });
    ordered
}

fn first_non_null(
    rows: &[&EstimateRow],
    field: impl Fn(&EstimateRow) -> Option<Decimal>,
) -> Option<Decimal> {
    rows.iter().find_map(|r| field(r))
}

/// Arithmetic mean over the present values; `None` when there are none
/// or the sum overflows.
fn mean(rows: &[&EstimateRow], field: impl Fn(&EstimateRow) -> Option<Decimal>) -> Option<Decimal> {
    let values: Vec<Decimal> = rows.iter().filter_map(|r| field(r)).collect();
    if values.is_empty() {
        return None;
    }
    let sum = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))?;
    sum.checked_div(Decimal::from(values.len() as u64))
}

fn any_beat(rows: &[&EstimateRow], metric: Metric) -> bool {
    rows.iter().any(|r| r.flag(metric) == Some(BeatStatus::Beat))
}

fn distinct_values(
    rows: &[&EstimateRow],
    field: impl Fn(&EstimateRow) -> Option<Decimal>,
) -> usize {
    rows.iter()
        .filter_map(|r| field(r))
        .map(|d| d.normalize())
        .collect::<BTreeSet<_>>()
        .len()
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Summarise one company's broker rows.
///
/// Actuals come from the first row (in broker-name order) that has a
/// value; expectations are means over the rows. Beat flags are an OR over
/// the rows' stored flags, not a flag of the mean.
pub fn build_summary_table(symbol: &str, rows: &[&EstimateRow]) -> BeatMissResult<SummaryRow> {
    if rows.is_empty() {
        return Err(BeatMissError::not_found("estimate rows", symbol));
    }
    let ordered = broker_order(rows);

    let act_sales = first_non_null(&ordered, |r| r.sales);
    let act_ebitda = first_non_null(&ordered, |r| r.ebitda);
    let act_pat = first_non_null(&ordered, |r| r.pat);
    let act_ebitda_margin = implied_margin(act_ebitda, act_sales);

    let exp_sales = mean(&ordered, |r| r.expected_sales);
    let exp_ebitda = mean(&ordered, |r| r.expected_ebitda);
    let exp_pat = mean(&ordered, |r| r.expected_pat);
    let exp_ebitda_margin = implied_margin(exp_ebitda, exp_sales);

    let beat_sales = any_beat(&ordered, Metric::Sales);
    let beat_pat = any_beat(&ordered, Metric::Pat);
    let beat_ebitda = any_beat(&ordered, Metric::Ebitda);

    Ok(SummaryRow {
        company: symbol.to_string(),
        exp_sales,
        exp_pat,
        exp_ebitda,
        exp_ebitda_margin,
        act_sales,
        act_pat,
        act_ebitda,
        act_ebitda_margin,
        sales_diff_pct: percent_difference(act_sales, exp_sales),
        pat_diff_pct: percent_difference(act_pat, exp_pat),
        ebitda_diff_pct: percent_difference(act_ebitda, exp_ebitda),
        margin_diff_bps: margin_difference_bps(act_ebitda_margin, exp_ebitda_margin),
        beat_sales: u8::from(beat_sales),
        beat_pat: u8::from(beat_pat),
        beat_ebitda: u8::from(beat_ebitda),
        beat_total: total_beats([beat_sales, beat_pat, beat_ebitda]),
    })
}

/// Mean expected sales/EBITDA/PAT per broker, sorted by broker name.
pub fn expected_by_broker(rows: &[&EstimateRow]) -> Vec<BrokerExpectation> {
    let mut groups: BTreeMap<&str, Vec<&EstimateRow>> = BTreeMap::new();
    for r in rows {
        if let Some(broker) = r.broker_name.as_deref() {
            groups.entry(broker).or_default().push(r);
        }
    }
    groups
        .into_iter()
        .map(|(broker, group)| BrokerExpectation {
            broker: broker.to_string(),
            expected_sales: mean(&group, |r| r.expected_sales),
            expected_ebitda: mean(&group, |r| r.expected_ebitda),
            expected_pat: mean(&group, |r| r.expected_pat),
        })
        .collect()
}

/// Stored beat percentages in long form: every row's sales value, then
/// EBITDA, then PAT.
pub fn beat_values(rows: &[&EstimateRow]) -> Vec<BeatValue> {
    let columns: [(Metric, fn(&EstimateRow) -> Option<Percent>); 3] = [
        (Metric::Sales, |r| r.sales_beat),
        (Metric::Ebitda, |r| r.ebitda_beat),
        (Metric::Pat, |r| r.pat_beat),
    ];
    columns
        .iter()
        .flat_map(|(metric, value)| {
            rows.iter().map(move |r| BeatValue {
                broker: r.broker_name.clone(),
                metric: *metric,
                percent: value(r),
            })
        })
        .collect()
}

/// Rows of the selected company after optional reclassification and
/// filtering, in input order.
pub fn select_rows(input: &SummaryInput) -> BeatMissResult<Vec<EstimateRow>> {
    if input.symbol.trim().is_empty() {
        return Err(BeatMissError::InvalidInput {
            field: "symbol".into(),
            reason: "Company symbol is required".into(),
        });
    }

    let classified: Vec<EstimateRow>;
    let rows: &[EstimateRow] = match &input.reclassify {
        Some(band) => {
            band.validate()?;
            classified = input.rows.iter().map(|r| classify_row(r, band)).collect();
            &classified
        }
        None => &input.rows,
    };

    let filtered = input.filter.apply(rows);
    Ok(for_company(&filtered, &input.symbol)
        .into_iter()
        .cloned()
        .collect())
}

/// Filter, select one company and summarise, wrapped in the standard
/// output envelope.
pub fn run_summary(input: &SummaryInput) -> BeatMissResult<ComputationOutput<SummaryOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let selected = select_rows(input)?;
    let company_rows: Vec<&EstimateRow> = selected.iter().collect();
    let summary = build_summary_table(&input.symbol, &company_rows)?;

    let actual_columns: [(&str, fn(&EstimateRow) -> Option<Decimal>); 3] = [
        ("sales", |r| r.sales),
        ("ebitda", |r| r.ebitda),
        ("pat", |r| r.pat),
    ];
    for (name, field) in actual_columns {
        if distinct_values(&company_rows, field) > 1 {
            warnings.push(format!(
                "Actual {name} differs across broker rows; using the first by broker name"
            ));
        }
    }

    let output = SummaryOutput {
        summary,
        expected_by_broker: expected_by_broker(&company_rows),
        beat_values: beat_values(&company_rows),
        rows_considered: company_rows.len(),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Actual vs mean broker expectation with implied EBITDA margin and any-broker beat flags",
        &serde_json::json!({
            "symbol": input.symbol,
            "rows_total": input.rows.len(),
            "filter": input.filter,
            "reclassify": input.reclassify,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(broker: &str, sales: Option<Decimal>, exp_sales: Decimal) -> EstimateRow {
        EstimateRow {
            nsesymbol: Some("ACME".into()),
            broker_name: Some(broker.into()),
            picked_type: Some("Standalone".into()),
            sales,
            ebitda: Some(dec!(200)),
            pat: Some(dec!(100)),
            expected_sales: Some(exp_sales),
            expected_ebitda: Some(dec!(180)),
            expected_pat: Some(dec!(110)),
            sales_flag: Some(BeatStatus::Miss),
            pat_flag: Some(BeatStatus::Miss),
            ebitda_flag: Some(BeatStatus::Inline),
            overall_flag: Some(BeatStatus::Miss),
            ..Default::default()
        }
    }

    #[test]
    fn test_expected_is_mean_actual_is_first() {
        let rows = vec![
            row("Motilal", Some(dec!(1010)), dec!(1000)),
            row("Axis", None, dec!(900)),
            row("Kotak", Some(dec!(1000)), dec!(800)),
        ];
        let refs: Vec<&EstimateRow> = rows.iter().collect();
        let s = build_summary_table("ACME", &refs).unwrap();

        // Broker order: Axis (no sales), Kotak, Motilal
        assert_eq!(s.act_sales, Some(dec!(1000)));
        assert_eq!(s.exp_sales, Some(dec!(900)));
        assert_eq!(s.exp_ebitda, Some(dec!(180)));
        assert_eq!(s.exp_pat, Some(dec!(110)));
        assert_eq!(s.act_ebitda_margin, Some(dec!(20)));
        assert_eq!(s.exp_ebitda_margin, Some(dec!(20)));
        assert_eq!(s.margin_diff_bps, Some(dec!(0)));
        assert_eq!(s.sales_diff_pct.unwrap().round_dp(2), dec!(11.11));
        assert_eq!(s.ebitda_diff_pct.unwrap().round_dp(2), dec!(11.11));
        assert_eq!(s.pat_diff_pct.unwrap().round_dp(2), dec!(-9.09));
    }

    #[test]
    fn test_beat_flags_are_any_over_rows() {
        let mut rows = vec![
            row("Axis", Some(dec!(1000)), dec!(900)),
            row("Kotak", Some(dec!(1000)), dec!(1100)),
        ];
        rows[1].sales_flag = Some(BeatStatus::Beat);
        let refs: Vec<&EstimateRow> = rows.iter().collect();
        let s = build_summary_table("ACME", &refs).unwrap();

        // Mean expectation is 1000, so the mean alone is not a beat
        assert_eq!(s.sales_diff_pct, Some(dec!(0)));
        assert_eq!(s.beat_sales, 1);
        assert_eq!(s.beat_pat, 0);
        assert_eq!(s.beat_ebitda, 0);
        assert_eq!(s.beat_total, 1);
    }

    #[test]
    fn test_empty_rows_not_found() {
        let err = build_summary_table("ACME", &[]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_mean_ignores_missing_expectations() {
        let mut rows = vec![
            row("Axis", Some(dec!(1000)), dec!(900)),
            row("Kotak", Some(dec!(1000)), dec!(1100)),
        ];
        rows[1].expected_pat = None;
        let refs: Vec<&EstimateRow> = rows.iter().collect();
        let s = build_summary_table("ACME", &refs).unwrap();
        assert_eq!(s.exp_pat, Some(dec!(110)));
    }

    #[test]
    fn test_mean_overflow_leaves_expectation_absent() {
        let rows = vec![
            row("Axis", Some(dec!(1000)), Decimal::MAX),
            row("Kotak", Some(dec!(1000)), Decimal::MAX),
        ];
        let refs: Vec<&EstimateRow> = rows.iter().collect();
        let s = build_summary_table("ACME", &refs).unwrap();
        assert_eq!(s.exp_sales, None);
        assert_eq!(s.sales_diff_pct, None);
        assert_eq!(s.exp_ebitda_margin, None);
        assert_eq!(s.exp_pat, Some(dec!(110)));
    }

    #[test]
    fn test_expected_by_broker_groups() {
        let rows = vec![
            row("Kotak", Some(dec!(1000)), dec!(800)),
            row("Axis", Some(dec!(1000)), dec!(900)),
            row("Kotak", Some(dec!(1000)), dec!(1000)),
        ];
        let refs: Vec<&EstimateRow> = rows.iter().collect();
        let grouped = expected_by_broker(&refs);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].broker, "Axis");
        assert_eq!(grouped[1].broker, "Kotak");
        assert_eq!(grouped[1].expected_sales, Some(dec!(900)));
    }

    #[test]
    fn test_beat_values_long_form_order() {
        let mut rows = vec![
            row("Kotak", Some(dec!(1000)), dec!(800)),
            row("Axis", Some(dec!(1000)), dec!(900)),
        ];
        rows[0].sales_beat = Some(dec!(25));
        let refs: Vec<&EstimateRow> = rows.iter().collect();
        let values = beat_values(&refs);
        assert_eq!(values.len(), 6);
        assert_eq!(values[0].metric, Metric::Sales);
        assert_eq!(values[0].percent, Some(dec!(25)));
        assert_eq!(values[2].metric, Metric::Ebitda);
        assert_eq!(values[5].metric, Metric::Pat);
        assert_eq!(values[5].broker.as_deref(), Some("Axis"));
    }

    #[test]
    fn test_run_summary_filters_and_warns() {
        let mut rows = vec![
            row("Axis", Some(dec!(1000)), dec!(900)),
            row("Kotak", Some(dec!(1005)), dec!(950)),
            row("Motilal", Some(dec!(1000)), dec!(2000)),
        ];
        rows[2].picked_type = Some("Consolidated".into());
        let mut other = row("Axis", Some(dec!(50)), dec!(40));
        other.nsesymbol = Some("BETA".into());
        rows.push(other);

        let input = SummaryInput {
            symbol: "ACME".into(),
            rows,
            filter: EstimateFilter {
                picked_types: Some(["Standalone".to_string()].into_iter().collect()),
                ..Default::default()
            },
            reclassify: None,
        };
        let out = run_summary(&input).unwrap();
        assert_eq!(out.result.rows_considered, 2);
        assert_eq!(out.result.summary.exp_sales, Some(dec!(925)));
        assert_eq!(out.result.summary.act_sales, Some(dec!(1000)));
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("sales"));
    }

    #[test]
    fn test_run_summary_no_rows_for_company() {
        let input = SummaryInput {
            symbol: "ZETA".into(),
            rows: vec![row("Axis", Some(dec!(1000)), dec!(900))],
            filter: EstimateFilter::default(),
            reclassify: None,
        };
        assert!(run_summary(&input).unwrap_err().is_not_found());
    }

    #[test]
    fn test_run_summary_reclassifies_before_filtering() {
        // Stored flag says Miss, values say Beat
        let rows = vec![row("Axis", Some(dec!(1000)), dec!(900))];
        let input = SummaryInput {
            symbol: "ACME".into(),
            rows,
            filter: EstimateFilter {
                sales_flags: Some([BeatStatus::Beat].into_iter().collect()),
                ..Default::default()
            },
            reclassify: Some(InlineBand::default()),
        };
        let out = run_summary(&input).unwrap();
        assert_eq!(out.result.summary.beat_sales, 1);
    }
}
