use thiserror::Error;

/// Domain-level errors shared across application components.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The incoming payload missed a required field or violated invariants.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested model artifact does not exist in the artifact root.
    #[error("not found: {0}")]
    NotFound(String),

    /// The artifact exists but could not be read or decoded into a predictor.
    #[error("model load failed: {0}")]
    Load(String),

    /// The predictor failed or broke its one-value-per-row contract.
    #[error("prediction failed: {0}")]
    Prediction(String),

    /// Loading or predicting did not finish within the configured deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Any other unexpected failure.
    #[error("unexpected error: {0}")]
    Other(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    pub fn prediction(msg: impl Into<String>) -> Self {
        Self::Prediction(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Stable, machine-readable identifier for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::NotFound(_) => "MODEL_NOT_FOUND",
            Self::Load(_) => "MODEL_LOAD_FAILED",
            Self::Prediction(_) => "PREDICTION_FAILED",
            Self::Timeout(_) => "PREDICTION_TIMEOUT",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// True for failures caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}
