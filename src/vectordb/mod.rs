//! Qdrant vector database integration.
//!
//! The company index is read-only here: embeddings are produced and upserted elsewhere.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;


pub use client::{QdrantClient, VectorDbClient};
pub use error::VectorDbError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockVectorDbClient, cosine_similarity};
pub use model::SearchResult;

pub const DEFAULT_COLLECTION_NAME: &str = "companies";
