use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::model::IncentiveId;
use crate::vectordb::VectorDbError;

/// Retrieval failures. All of them abort the incentive.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("incentive {incentive_id} has no sector, description or actions to search with")]
    EmptyQuery { incentive_id: IncentiveId },

    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector index unavailable: {0}")]
    Index(#[from] VectorDbError),
}
