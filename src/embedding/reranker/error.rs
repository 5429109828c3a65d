use thiserror::Error;

use crate::embedding::error::EmbeddingError;

#[derive(Debug, Error)]
pub enum RerankerError {
    #[error("failed to load reranker model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("reranker inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("invalid reranker configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("reranker produced a non-finite score")]
    NonFiniteScore,
}

impl From<candle_core::Error> for RerankerError {
    fn from(err: candle_core::Error) -> Self {
        RerankerError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<EmbeddingError> for RerankerError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::TokenizationFailed { reason } => {
                RerankerError::TokenizationFailed { reason }
            }
            EmbeddingError::InferenceFailed { reason } => RerankerError::InferenceFailed { reason },
            other => RerankerError::ModelLoadFailed {
                reason: other.to_string(),
            },
        }
    }
}
