pub mod classifier;
pub mod company;
pub mod metrics;
pub mod portfolio;
pub mod resolver;

pub use classifier::{is_beat, total_beats, tri_state, BeatStatus, InlineBand};
pub use company::{build_comparison, try_build_comparison, ComparisonRow};
pub use metrics::{implied_margin, margin_difference_bps, percent_difference};
pub use portfolio::build_all;
pub use resolver::{resolve, ComparisonRequest};
