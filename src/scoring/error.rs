use thiserror::Error;

use crate::embedding::RerankerError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("reranker error: {0}")]
    Reranker(#[from] RerankerError),

    #[error("reranking task failed: {reason}")]
    TaskFailed { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}
