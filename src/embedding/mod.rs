//! Embedding + model utilities.
//!
//! - [`encoder`] embeds incentive queries for vector retrieval.
//! - [`reranker`] provides the cross-encoder used by [`crate::scoring::semantic`].

/// BERT encoder and classifier wrappers.
pub mod bert;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
/// Sentence encoder for retrieval queries.
pub mod encoder;
mod error;
/// Cross-encoder reranker.
pub mod reranker;
/// Model directory and tokenizer loading helpers.
pub mod utils;

pub use encoder::{EncoderConfig, QueryEncoder};
pub use error::EmbeddingError;
pub use reranker::{Reranker, RerankerConfig, RerankerError};
