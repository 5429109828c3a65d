use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::embedding::{EmbeddingError, RerankerError};
use crate::expansion::ExpansionError;
use crate::location::LocationCacheError;
use crate::results::ResultStoreError;
use crate::scoring::ScoringError;
use crate::vectordb::VectorDbError;

/// Errors that abort an incentive or prevent the pipeline from starting.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to read {path}: {reason}")]
    Input { path: PathBuf, reason: String },

    #[error("encoder error: {0}")]
    Encoder(#[from] EmbeddingError),

    #[error("reranker error: {0}")]
    Reranker(#[from] RerankerError),

    #[error("vector index error: {0}")]
    Index(#[from] VectorDbError),

    #[error("location cache error: {0}")]
    LocationCache(#[from] LocationCacheError),

    #[error("expansion failed: {0}")]
    Expansion(#[from] ExpansionError),

    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("failed to persist results: {0}")]
    Store(#[from] ResultStoreError),
}
