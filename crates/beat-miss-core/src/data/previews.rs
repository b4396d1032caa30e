use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Money, Percent};

/// Expected results from one source, consensus or a single broker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectedResult {
    pub expected_sales: Option<Money>,
    pub expected_ebitda: Option<Money>,
    pub expected_pat: Option<Money>,
    pub ebitda_margin_percent: Option<Percent>,
    pub pat_margin_percent: Option<Percent>,
}

/// A pre-aggregated consensus statistic as supplied by the data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanBlock {
    pub mean: Option<Money>,
}

impl MeanBlock {
    pub fn of(mean: Money) -> Self {
        MeanBlock { mean: Some(mean) }
    }
}

/// Consensus block: one mean per metric, never recomputed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusBlock {
    pub expected_sales: Option<MeanBlock>,
    pub expected_ebitda: Option<MeanBlock>,
    pub expected_pat: Option<MeanBlock>,
    pub ebitda_margin_percent: Option<MeanBlock>,
    pub pat_margin_percent: Option<MeanBlock>,
}

impl ConsensusBlock {
    pub fn expected(&self) -> ExpectedResult {
        let mean = |block: &Option<MeanBlock>| block.as_ref().and_then(|b| b.mean);
        ExpectedResult {
            expected_sales: mean(&self.expected_sales),
            expected_ebitda: mean(&self.expected_ebitda),
            expected_pat: mean(&self.expected_pat),
            ebitda_margin_percent: mean(&self.ebitda_margin_percent),
            pat_margin_percent: mean(&self.pat_margin_percent),
        }
    }
}

/// One broker's estimate within a preview.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrokerEstimate {
    pub broker_name: String,
    #[serde(flatten)]
    pub values: ExpectedResult,
}

/// Result preview for one company and reporting period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    pub company_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub report_period: String,
    #[serde(default)]
    pub consensus: ConsensusBlock,
    #[serde(default)]
    pub broker_estimates: Vec<BrokerEstimate>,
}

impl Preview {
    /// Exact, case-sensitive broker match.
    pub fn broker(&self, broker_name: &str) -> Option<&BrokerEstimate> {
        self.broker_estimates
            .iter()
            .find(|b| b.broker_name == broker_name)
    }
}

/// Previews keyed by (company identifier, report period).
///
/// Serialised as a flat list of previews; a later duplicate key replaces
/// an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Preview>", into = "Vec<Preview>")]
pub struct PreviewsTable {
    previews: BTreeMap<(String, String), Preview>,
}

impl PreviewsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, preview: Preview) {
        let key = (preview.company_id.clone(), preview.report_period.clone());
        self.previews.insert(key, preview);
    }

    pub fn get(&self, company_id: &str, period: &str) -> Option<&Preview> {
        self.previews
            .get(&(company_id.to_string(), period.to_string()))
    }

    /// Previews in (company, period) order.
    pub fn iter(&self) -> impl Iterator<Item = &Preview> {
        self.previews.values()
    }

    pub fn len(&self) -> usize {
        self.previews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previews.is_empty()
    }
}

impl From<Vec<Preview>> for PreviewsTable {
    fn from(previews: Vec<Preview>) -> Self {
        let mut table = PreviewsTable::new();
        for p in previews {
            table.insert(p);
        }
        table
    }
}

impl From<PreviewsTable> for Vec<Preview> {
    fn from(table: PreviewsTable) -> Self {
        table.previews.into_values().collect()
    }
}
