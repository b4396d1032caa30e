use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BeatMissError;

/// Reported or estimated amounts (sales, EBITDA, PAT) in the source currency unit.
pub type Money = Decimal;

/// Percentages expressed as percent (12.5 = 12.5%), never as fractions.
pub type Percent = Decimal;

/// Basis points (1 percentage point = 100 bps).
pub type Bps = Decimal;

/// Literal used by data sources and selectors for the consensus expectation.
pub const CONSENSUS: &str = "Consensus";

/// Financial reporting basis of an actual result.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum StatementType {
    #[default]
    Standalone,
    Consolidated,
}

impl StatementType {
    pub const ALL: [StatementType; 2] = [StatementType::Standalone, StatementType::Consolidated];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::Standalone => "Standalone",
            StatementType::Consolidated => "Consolidated",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementType {
    type Err = BeatMissError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standalone" => Ok(StatementType::Standalone),
            "consolidated" => Ok(StatementType::Consolidated),
            other => Err(BeatMissError::InvalidInput {
                field: "statement_type".into(),
                reason: format!("'{other}' is neither Standalone nor Consolidated"),
            }),
        }
    }
}

/// Which expectation a comparison is made against.
///
/// Serialised as a plain string: the literal `"Consensus"` selects the
/// consensus block, anything else is an exact broker name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BrokerSelector {
    #[default]
    Consensus,
    Broker(String),
}

impl BrokerSelector {
    pub fn as_str(&self) -> &str {
        match self {
            BrokerSelector::Consensus => CONSENSUS,
            BrokerSelector::Broker(name) => name,
        }
    }
}

impl From<String> for BrokerSelector {
    fn from(s: String) -> Self {
        if s == CONSENSUS {
            BrokerSelector::Consensus
        } else {
            BrokerSelector::Broker(s)
        }
    }
}

impl From<&str> for BrokerSelector {
    fn from(s: &str) -> Self {
        BrokerSelector::from(s.to_string())
    }
}

impl From<BrokerSelector> for String {
    fn from(b: BrokerSelector) -> Self {
        match b {
            BrokerSelector::Consensus => CONSENSUS.to_string(),
            BrokerSelector::Broker(name) => name,
        }
    }
}

impl fmt::Display for BrokerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five canonical metrics compared between actual and expected results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Sales,
    Ebitda,
    Pat,
    EbitdaMargin,
    PatMargin,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Sales,
        Metric::Ebitda,
        Metric::Pat,
        Metric::EbitdaMargin,
        Metric::PatMargin,
    ];

    /// Margins are compared as a bps spread, amounts as a percent ratio.
    pub fn is_margin(&self) -> bool {
        matches!(self, Metric::EbitdaMargin | Metric::PatMargin)
    }

    /// Column label used in comparison tables.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Sales => "Sales %",
            Metric::Ebitda => "EBITDA %",
            Metric::Pat => "PAT %",
            Metric::EbitdaMargin => "EBITDA Margin (bps)",
            Metric::PatMargin => "PAT Margin (bps)",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per canonical metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerMetric<T> {
    pub sales: T,
    pub ebitda: T,
    pub pat: T,
    pub ebitda_margin: T,
    pub pat_margin: T,
}

impl<T> PerMetric<T> {
    pub fn from_fn(mut f: impl FnMut(Metric) -> T) -> Self {
        PerMetric {
            sales: f(Metric::Sales),
            ebitda: f(Metric::Ebitda),
            pat: f(Metric::Pat),
            ebitda_margin: f(Metric::EbitdaMargin),
            pat_margin: f(Metric::PatMargin),
        }
    }

    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::Sales => &self.sales,
            Metric::Ebitda => &self.ebitda,
            Metric::Pat => &self.pat,
            Metric::EbitdaMargin => &self.ebitda_margin,
            Metric::PatMargin => &self.pat_margin,
        }
    }

    /// Values in canonical metric order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, &T)> {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
