use thiserror::Error;

#[derive(Debug, Error)]
pub enum BeatMissError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Not found: {what} for {key}")]
    NotFound { what: String, key: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BeatMissError {
    pub(crate) fn not_found(what: &str, key: impl Into<String>) -> Self {
        BeatMissError::NotFound {
            what: what.to_string(),
            key: key.into(),
        }
    }

    /// True for resolution misses, which callers skip rather than abort on.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BeatMissError::NotFound { .. })
    }
}

impl From<serde_json::Error> for BeatMissError {
    fn from(e: serde_json::Error) -> Self {
        BeatMissError::SerializationError(e.to_string())
    }
}
