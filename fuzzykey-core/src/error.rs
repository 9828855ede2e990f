//! Error type shared by every component of the fuzzy extractor
//!
//! Noise tolerance is structural (lattice quantization + error correction),
//! so none of these errors is ever retried internally. `Decode` and
//! `VerificationMismatch` are expected outcomes of a failed authentication;
//! `Numerical` and `EncodingRange` indicate a misconfigured basis or scale.

#[derive(Debug, thiserror::Error)]
pub enum FuzzyKeyError {
    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Verification mismatch: recovered key does not match the committed hash")]
    VerificationMismatch,

    #[error("Encoding range error: coordinate {index} scales to {value}, outside the byte range")]
    EncodingRange { index: usize, value: f64 },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FuzzyKeyError {
    /// True for outcomes that mean "this sample was not accepted" rather
    /// than a fault in the caller's configuration.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            FuzzyKeyError::Decode(_) | FuzzyKeyError::VerificationMismatch
        )
    }
}

impl From<serde_json::Error> for FuzzyKeyError {
    fn from(e: serde_json::Error) -> Self {
        FuzzyKeyError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FuzzyKeyError>;
