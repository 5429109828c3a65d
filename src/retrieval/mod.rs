//! Candidate retrieval: incentive text → nearest companies in the vector index.

pub mod error;


pub use error::RetrievalError;

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::embedding::QueryEncoder;
use crate::expansion::by_similarity;
use crate::model::{CandidateMatch, Incentive};
use crate::vectordb::VectorDbClient;

/// Concatenates sector, enriched description and eligible actions, skipping empty parts.
pub fn build_query_text(incentive: &Incentive) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(2 + incentive.eligible_actions.len());
    parts.push(&incentive.sector);
    if let Some(description) = incentive.description.as_deref() {
        parts.push(description);
    }
    parts.extend(incentive.eligible_actions.iter().map(String::as_str));

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Embeds incentive queries and searches the company collection.
pub struct CandidateRetriever<V> {
    encoder: Arc<QueryEncoder>,
    index: Arc<V>,
    collection: String,
}

impl<V: VectorDbClient> CandidateRetriever<V> {
    pub fn new(encoder: Arc<QueryEncoder>, index: Arc<V>, collection: impl Into<String>) -> Self {
        Self {
            encoder,
            index,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the `k` most similar companies, similarity descending, company id ascending on
    /// ties. `round` is left at 0 for the caller to stamp.
    #[instrument(skip(self, incentive), fields(incentive_id = incentive.id))]
    pub async fn retrieve(
        &self,
        incentive: &Incentive,
        k: usize,
    ) -> Result<Vec<CandidateMatch>, RetrievalError> {
        let query = build_query_text(incentive);
        if query.is_empty() {
            return Err(RetrievalError::EmptyQuery {
                incentive_id: incentive.id,
            });
        }

        let vector = self.encoder.embed(&query)?;
        let results = self
            .index
            .search(&self.collection, vector, k as u64)
            .await?;

        let mut candidates: Vec<CandidateMatch> = results
            .into_iter()
            .map(|r| CandidateMatch {
                incentive_id: incentive.id,
                company_id: r.id,
                similarity: r.score,
                round: 0,
            })
            .collect();

        candidates.sort_by(by_similarity);
        candidates.truncate(k);

        debug!(
            k,
            returned = candidates.len(),
            top = candidates.first().map(|c| c.similarity),
            "Retrieved candidates"
        );

        Ok(candidates)
    }
}
