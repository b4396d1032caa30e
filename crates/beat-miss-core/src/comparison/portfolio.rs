use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::company::{try_build_comparison, ComparisonRow};
use super::resolver::ComparisonRequest;
use crate::config::ComparisonConfig;
use crate::data::{catalog, Tables};
use crate::types::{with_metadata, ComputationOutput};
use crate::BeatMissResult;

pub const EMPTY_UNIVERSE_WARNING: &str = "No companies have both actual and expected data.";

/// Input for a portfolio-wide comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioInput {
    #[serde(flatten)]
    pub request: ComparisonRequest,
    /// Company keys to compare, in encounter order. Defaults to every
    /// company in the actuals table, sorted by identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<String>>,
    #[serde(default)]
    pub config: ComparisonConfig,
}

/// Ranked comparison rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioOutput {
    pub rows: Vec<ComparisonRow>,
    pub companies_considered: usize,
    pub companies_skipped: usize,
}

fn compare_one(
    tables: &Tables,
    request: &ComparisonRequest,
    company: &str,
    config: &ComparisonConfig,
) -> Option<ComparisonRow> {
    match try_build_comparison(tables, request, company, config) {
        Ok(row) => Some(row),
        Err(e) => {
            debug!(company, error = %e, "skipping company");
            None
        }
    }
}

/// Compare every company and rank by total beats, descending.
///
/// Companies without data for the selection are dropped. The sort is
/// stable, so ties keep the order of `companies`.
pub fn build_all(
    tables: &Tables,
    request: &ComparisonRequest,
    companies: &[String],
    config: &ComparisonConfig,
) -> Vec<ComparisonRow> {
    #[cfg(feature = "parallel")]
    let results: Vec<Option<ComparisonRow>> = companies
        .par_iter()
        .map(|c| compare_one(tables, request, c, config))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results: Vec<Option<ComparisonRow>> = companies
        .iter()
        .map(|c| compare_one(tables, request, c, config))
        .collect();

    let mut rows: Vec<ComparisonRow> = results.into_iter().flatten().collect();
    rows.sort_by(|a, b| b.total_beats.cmp(&a.total_beats));
    rows
}

/// Portfolio comparison wrapped in the standard output envelope.
///
/// An empty result is reported as a warning, not an error.
pub fn run_portfolio(
    tables: &Tables,
    input: &PortfolioInput,
) -> BeatMissResult<ComputationOutput<PortfolioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.request.validate()?;
    input.config.validate()?;

    let companies = match &input.companies {
        Some(list) => list.clone(),
        None => catalog::company_universe(&tables.actuals),
    };

    let rows = build_all(tables, &input.request, &companies, &input.config);

    if rows.is_empty() {
        warn!(
            expected_period = %input.request.expected_period,
            actual_period = %input.request.actual_period,
            broker = %input.request.broker,
            "no company produced a comparison row"
        );
        warnings.push(EMPTY_UNIVERSE_WARNING.to_string());
    }

    let output = PortfolioOutput {
        companies_considered: companies.len(),
        companies_skipped: companies.len() - rows.len(),
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Actual vs Expected Results ranked by total beats",
        &serde_json::json!({
            "expected_period": input.request.expected_period,
            "actual_period": input.request.actual_period,
            "statement_type": input.request.statement_type,
            "broker": input.request.broker,
            "metrics": input.config.metrics,
            "universe": if input.companies.is_some() { "explicit" } else { "all_actuals" },
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        ActualResult, ActualsTable, BrokerEstimate, CompanyActuals, ConsensusBlock,
        ExpectedResult, MeanBlock, Preview,
    };
    use crate::types::StatementType;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Company with actual sales `sales` vs consensus 100, and so on.
    fn add_company(
        actuals: &mut ActualsTable,
        previews: &mut Vec<Preview>,
        id: &str,
        sales: Decimal,
        ebitda: Decimal,
        pat: Decimal,
    ) {
        actuals.insert(
            id,
            CompanyActuals::named(format!("{id} Ltd")).with_result(
                StatementType::Standalone,
                "Q1FY25",
                ActualResult {
                    net_sales: Some(sales),
                    ebitda: Some(ebitda),
                    net_profit: Some(pat),
                    ..Default::default()
                },
            ),
        );
        previews.push(Preview {
            company_id: id.into(),
            report_period: "Q1FY25".into(),
            consensus: ConsensusBlock {
                expected_sales: Some(MeanBlock::of(dec!(100))),
                expected_ebitda: Some(MeanBlock::of(dec!(100))),
                expected_pat: Some(MeanBlock::of(dec!(100))),
                ..Default::default()
            },
            broker_estimates: vec![BrokerEstimate {
                broker_name: "Kotak".into(),
                values: ExpectedResult {
                    expected_sales: Some(dec!(100)),
                    ..Default::default()
                },
            }],
            ..Default::default()
        });
    }

    fn tables() -> Tables {
        let mut actuals = ActualsTable::new();
        let mut previews = Vec::new();
        add_company(&mut actuals, &mut previews, "A", dec!(90), dec!(110), dec!(90)); // 1 beat
        add_company(&mut actuals, &mut previews, "B", dec!(110), dec!(110), dec!(110)); // 3
        add_company(&mut actuals, &mut previews, "C", dec!(110), dec!(90), dec!(90)); // 1
        add_company(&mut actuals, &mut previews, "D", dec!(110), dec!(110), dec!(90)); // 2
        // E has actuals only
        actuals.insert("E", CompanyActuals::named("E Ltd"));
        Tables::new(actuals, previews.into())
    }

    fn request() -> ComparisonRequest {
        ComparisonRequest::new("Q1FY25", "Q1FY25", StatementType::Standalone, "Consensus")
    }

    fn ids(rows: &[ComparisonRow]) -> Vec<&str> {
        rows.iter().map(|r| r.company_id.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_total_beats_descending() {
        let t = tables();
        let universe = catalog::company_universe(&t.actuals);
        let rows = build_all(&t, &request(), &universe, &ComparisonConfig::default());
        assert_eq!(ids(&rows), vec!["B", "D", "A", "C"]);
        assert!(rows.windows(2).all(|w| w[0].total_beats >= w[1].total_beats));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let t = tables();
        let universe: Vec<String> = ["C", "B", "A", "D"].iter().map(|s| s.to_string()).collect();
        let rows = build_all(&t, &request(), &universe, &ComparisonConfig::default());
        assert_eq!(ids(&rows), vec!["B", "D", "C", "A"]);
    }

    #[test]
    fn test_companies_without_data_are_dropped() {
        let t = tables();
        let universe: Vec<String> = ["E", "B", "ZZZ"].iter().map(|s| s.to_string()).collect();
        let rows = build_all(&t, &request(), &universe, &ComparisonConfig::default());
        assert_eq!(ids(&rows), vec!["B"]);
    }

    #[test]
    fn test_named_broker_selection() {
        let t = tables();
        let mut req = request();
        req.broker = "Kotak".into();
        let universe = catalog::company_universe(&t.actuals);
        let rows = build_all(&t, &req, &universe, &ComparisonConfig::default());
        // Kotak only estimates sales
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.total_beats <= 1));
        assert_eq!(ids(&rows), vec!["B", "C", "D", "A"]);
    }

    #[test]
    fn test_matches_sequential_fold() {
        let t = tables();
        let universe: Vec<String> = ["D", "A", "E", "C", "B"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let config = ComparisonConfig::default();
        let mut expected: Vec<ComparisonRow> = universe
            .iter()
            .filter_map(|c| crate::comparison::build_comparison(&t, &request(), c, &config))
            .collect();
        expected.sort_by(|a, b| b.total_beats.cmp(&a.total_beats));
        assert_eq!(build_all(&t, &request(), &universe, &config), expected);
    }

    #[test]
    fn test_run_portfolio_defaults_to_all_actuals() {
        let t = tables();
        let input = PortfolioInput {
            request: request(),
            companies: None,
            config: ComparisonConfig::default(),
        };
        let out = run_portfolio(&t, &input).unwrap();
        assert_eq!(out.result.companies_considered, 5);
        assert_eq!(out.result.companies_skipped, 1);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_run_portfolio_empty_universe_warns() {
        let t = tables();
        let mut req = request();
        req.broker = "Jefferies".into();
        let input = PortfolioInput {
            request: req,
            companies: None,
            config: ComparisonConfig::default(),
        };
        let out = run_portfolio(&t, &input).unwrap();
        assert!(out.result.rows.is_empty());
        assert_eq!(out.warnings, vec![EMPTY_UNIVERSE_WARNING.to_string()]);
    }
}
