/// Error types for ensemble ingestion and the derived-quantity pipeline
use thiserror::Error;

/// Main error type for ensemble operations
#[derive(Error, Debug)]
pub enum EnsembleError {
    /// A model's payload is internally inconsistent (axis/array mismatch)
    #[error("Schema error for model {model}: {detail}")]
    Schema { model: String, detail: String },

    /// Physically invalid input to a formula
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Payload is not valid JSON for the expected shape
    #[error("Failed to parse ensemble payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// No model survived ingestion
    #[error("No usable model data in payload")]
    NoUsableData,
}

impl EnsembleError {
    pub fn schema(model: impl Into<String>, detail: impl Into<String>) -> Self {
        EnsembleError::Schema {
            model: model.into(),
            detail: detail.into(),
        }
    }
}

/// Type alias for Results using EnsembleError
pub type Result<T> = std::result::Result<T, EnsembleError>;
