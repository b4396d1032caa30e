pub mod actuals;
pub mod catalog;
pub mod previews;

use serde::{Deserialize, Serialize};

pub use actuals::{ActualResult, ActualsTable, CompanyActuals};
pub use previews::{
    BrokerEstimate, ConsensusBlock, ExpectedResult, MeanBlock, Preview, PreviewsTable,
};

/// The two read-only lookup tables every comparison runs against.
///
/// Loaded once by the caller and borrowed for the whole computation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub actuals: ActualsTable,
    #[serde(default)]
    pub previews: PreviewsTable,
}

impl Tables {
    pub fn new(actuals: ActualsTable, previews: PreviewsTable) -> Self {
        Tables { actuals, previews }
    }
}
