use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::rows::EstimateRow;
use crate::comparison::classifier::BeatStatus;

/// Multi-select filters over estimate rows.
///
/// `None` allows every value. A row whose filtered column is blank never
/// passes, even when the filter allows everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateFilter {
    pub brokers: Option<BTreeSet<String>>,
    pub picked_types: Option<BTreeSet<String>>,
    pub sales_flags: Option<BTreeSet<BeatStatus>>,
    pub pat_flags: Option<BTreeSet<BeatStatus>>,
    pub ebitda_flags: Option<BTreeSet<BeatStatus>>,
    pub overall_flags: Option<BTreeSet<BeatStatus>>,
}

fn allowed<T: Ord>(set: &Option<BTreeSet<T>>, value: Option<&T>) -> bool {
    match (set, value) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(s), Some(v)) => s.contains(v),
    }
}

impl EstimateFilter {
    pub fn matches(&self, row: &EstimateRow) -> bool {
        allowed(&self.brokers, row.broker_name.as_ref())
            && allowed(&self.picked_types, row.picked_type.as_ref())
            && allowed(&self.sales_flags, row.sales_flag.as_ref())
            && allowed(&self.pat_flags, row.pat_flag.as_ref())
            && allowed(&self.ebitda_flags, row.ebitda_flag.as_ref())
            && allowed(&self.overall_flags, row.overall_flag.as_ref())
    }

    pub fn apply<'a>(&self, rows: &'a [EstimateRow]) -> Vec<&'a EstimateRow> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Rows for one company symbol, in input order.
pub fn for_company<'a>(rows: &[&'a EstimateRow], symbol: &str) -> Vec<&'a EstimateRow> {
    rows.iter()
        .copied()
        .filter(|r| r.nsesymbol.as_deref() == Some(symbol))
        .collect()
}

/// Distinct non-blank values a caller can filter on, each sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub symbols: Vec<String>,
    pub brokers: Vec<String>,
    pub picked_types: Vec<String>,
}

fn distinct(
    rows: &[EstimateRow],
    field: impl Fn(&EstimateRow) -> Option<&String>,
) -> Vec<String> {
    rows.iter()
        .filter_map(field)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn filter_options(rows: &[EstimateRow]) -> FilterOptions {
    FilterOptions {
        symbols: distinct(rows, |r| r.nsesymbol.as_ref()),
        brokers: distinct(rows, |r| r.broker_name.as_ref()),
        picked_types: distinct(rows, |r| r.picked_type.as_ref()),
    }
}
