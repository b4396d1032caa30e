//! Selection lists derived from the lookup tables: the periods, brokers
//! and companies a caller can choose from.

use std::collections::{BTreeMap, BTreeSet};

use super::{ActualsTable, PreviewsTable};
use crate::types::CONSENSUS;

/// Distinct report periods that have at least one preview, sorted.
pub fn expected_periods(previews: &PreviewsTable) -> Vec<String> {
    previews
        .iter()
        .map(|p| p.report_period.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct periods with actual results under either statement type, sorted.
pub fn actual_periods(actuals: &ActualsTable) -> Vec<String> {
    actuals
        .iter()
        .flat_map(|(_, company)| company.periods())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `Consensus` followed by every broker estimating any company in `period`.
pub fn brokers_for_period(previews: &PreviewsTable, period: &str) -> Vec<String> {
    let brokers: BTreeSet<&str> = previews
        .iter()
        .filter(|p| p.report_period == period)
        .flat_map(|p| p.broker_estimates.iter().map(|b| b.broker_name.as_str()))
        .collect();

    std::iter::once(CONSENSUS)
        .chain(brokers.into_iter().filter(|b| *b != CONSENSUS))
        .map(str::to_string)
        .collect()
}

/// Every company identifier with actual results, in sorted order.
///
/// This is the default, deterministic universe for portfolio runs.
pub fn company_universe(actuals: &ActualsTable) -> Vec<String> {
    actuals.identifiers().map(str::to_string).collect()
}

/// Display name to identifier.
///
/// On duplicate names the smallest identifier wins whatever the table
/// order; a later entry with the same name does not replace it.
pub fn name_index(actuals: &ActualsTable) -> BTreeMap<String, String> {
    let mut index = BTreeMap::new();
    for (id, _) in actuals.iter() {
        index
            .entry(actuals.display_name(id).to_string())
            .or_insert_with(|| id.to_string());
    }
    index
}
