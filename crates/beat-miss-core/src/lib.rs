pub mod config;
pub mod error;
pub mod types;

pub mod comparison;
pub mod data;

#[cfg(feature = "summary")]
pub mod summary;

pub use config::ComparisonConfig;
pub use error::BeatMissError;
pub use types::*;

/// Standard result type for all beat/miss operations
pub type BeatMissResult<T> = Result<T, BeatMissError>;
