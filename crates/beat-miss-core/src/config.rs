//! Comparison settings shared by every dashboard variant.
//!
//! The variants differ only in how a company is looked up (stable
//! identifier or display name), which metrics are compared and how wide
//! the Inline zone is. One `ComparisonConfig` captures all three.

use serde::{Deserialize, Serialize};

use crate::comparison::classifier::InlineBand;
use crate::error::BeatMissError;
use crate::types::Metric;
use crate::BeatMissResult;

/// How the company key passed to a comparison is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKey {
    /// Stable identifier such as an ISIN.
    #[default]
    Id,
    /// Display name, mapped back to an identifier via the actuals table.
    Name,
}

/// Ordered set of metrics that contribute differences and beat flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSet(Vec<Metric>);

impl MetricSet {
    pub fn new(metrics: impl IntoIterator<Item = Metric>) -> Self {
        let mut set = Vec::new();
        for m in metrics {
            if !set.contains(&m) {
                set.push(m);
            }
        }
        MetricSet(set)
    }

    /// Sales, EBITDA, PAT and EBITDA margin; no PAT margin.
    pub fn without_pat_margin() -> Self {
        MetricSet::new([
            Metric::Sales,
            Metric::Ebitda,
            Metric::Pat,
            Metric::EbitdaMargin,
        ])
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.0.contains(&metric)
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for MetricSet {
    fn default() -> Self {
        MetricSet::new(Metric::ALL)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub inline_band: InlineBand,
    pub lookup_key: LookupKey,
    pub metrics: MetricSet,
}

impl ComparisonConfig {
    pub fn validate(&self) -> BeatMissResult<()> {
        self.inline_band.validate()?;
        if self.metrics.is_empty() {
            return Err(BeatMissError::InvalidInput {
                field: "metrics".into(),
                reason: "At least one metric must be compared".into(),
            });
        }
        Ok(())
    }
}
