use serde::{Deserialize, Serialize};

use crate::config::LookupKey;
use crate::data::{ActualResult, ExpectedResult, Tables};
use crate::error::BeatMissError;
use crate::types::{BrokerSelector, StatementType};
use crate::BeatMissResult;

/// Period, statement type and expectation source of a comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub expected_period: String,
    pub actual_period: String,
    #[serde(default)]
    pub statement_type: StatementType,
    #[serde(default)]
    pub broker: BrokerSelector,
}

impl ComparisonRequest {
    pub fn new(
        expected_period: impl Into<String>,
        actual_period: impl Into<String>,
        statement_type: StatementType,
        broker: impl Into<BrokerSelector>,
    ) -> Self {
        ComparisonRequest {
            expected_period: expected_period.into(),
            actual_period: actual_period.into(),
            statement_type,
            broker: broker.into(),
        }
    }

    pub fn validate(&self) -> BeatMissResult<()> {
        if self.expected_period.trim().is_empty() {
            return Err(BeatMissError::InvalidInput {
                field: "expected_period".into(),
                reason: "Expected period is required".into(),
            });
        }
        if self.actual_period.trim().is_empty() {
            return Err(BeatMissError::InvalidInput {
                field: "actual_period".into(),
                reason: "Actual period is required".into(),
            });
        }
        Ok(())
    }
}

/// Both sides of a comparison, borrowed from the lookup tables.
#[derive(Debug, Clone)]
pub struct ResolvedRecords<'t> {
    pub company_id: &'t str,
    pub company_name: &'t str,
    pub actual: &'t ActualResult,
    pub expected: ExpectedResult,
}

/// Map a company key to its identifier in the actuals table.
pub fn resolve_company_id<'t>(
    tables: &'t Tables,
    company_key: &str,
    lookup: LookupKey,
) -> BeatMissResult<&'t str> {
    let found = match lookup {
        LookupKey::Id => tables
            .actuals
            .get_key_value(company_key)
            .map(|(id, _)| id.as_str()),
        // Identifiers iterate in sorted order, so duplicate names resolve
        // to the smallest identifier, never to the last one loaded.
        LookupKey::Name => tables
            .actuals
            .identifiers()
            .find(|id| tables.actuals.display_name(id) == company_key),
    };
    found.ok_or_else(|| BeatMissError::not_found("company", company_key))
}

/// Locate the actual and expected records for one company.
///
/// Any miss (unknown company, no preview for the expected period, no actual
/// for the statement type and period, unknown broker) is a single
/// `NotFound`.
pub fn resolve<'t>(
    tables: &'t Tables,
    request: &ComparisonRequest,
    company_key: &str,
    lookup: LookupKey,
) -> BeatMissResult<ResolvedRecords<'t>> {
    let company_id = resolve_company_id(tables, company_key, lookup)?;

    let preview = tables
        .previews
        .get(company_id, &request.expected_period)
        .ok_or_else(|| {
            BeatMissError::not_found(
                "expected results",
                format!("{company_id} / {}", request.expected_period),
            )
        })?;

    let actual = tables
        .actuals
        .get(company_id)
        .and_then(|c| c.result(request.statement_type, &request.actual_period))
        .ok_or_else(|| {
            BeatMissError::not_found(
                "actual results",
                format!(
                    "{company_id} / {} / {}",
                    request.statement_type, request.actual_period
                ),
            )
        })?;

    let expected = match &request.broker {
        BrokerSelector::Consensus => preview.consensus.expected(),
        BrokerSelector::Broker(name) => preview
            .broker(name)
            .map(|b| b.values.clone())
            .ok_or_else(|| {
                BeatMissError::not_found(
                    "broker estimate",
                    format!("{company_id} / {} / {name}", request.expected_period),
                )
            })?,
    };

    Ok(ResolvedRecords {
        company_id,
        company_name: tables.actuals.display_name(company_id),
        actual,
        expected,
    })
}
