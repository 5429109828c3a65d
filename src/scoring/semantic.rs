use std::sync::Arc;

use tracing::{debug, warn};

use super::error::ScoringError;
use super::types::RerankOutcome;
use crate::embedding::Reranker;
use crate::model::{Company, CompanyId};

/// Cross-encoder scoring of the eligible set.
///
/// Inference is CPU/GPU bound, so the whole batch runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct SemanticReranker {
    reranker: Arc<Reranker>,
}

impl SemanticReranker {
    pub fn new(reranker: Arc<Reranker>) -> Self {
        Self { reranker }
    }

    pub fn stub() -> Result<Self, ScoringError> {
        Ok(Self::new(Arc::new(Reranker::stub()?)))
    }

    pub fn is_model_loaded(&self) -> bool {
        self.reranker.is_model_loaded()
    }

    /// Scores every company against `incentive_text`. A company that fails to score is
    /// reported in [`RerankOutcome::failures`] instead of failing the batch.
    pub async fn rerank(
        &self,
        incentive_text: &str,
        companies: &[Company],
    ) -> Result<RerankOutcome, ScoringError> {
        if companies.is_empty() {
            return Ok(RerankOutcome::default());
        }

        let reranker = self.reranker.clone();
        let query = incentive_text.to_string();
        let pairs: Vec<(CompanyId, String)> = companies
            .iter()
            .map(|c| (c.id, c.rerank_text()))
            .collect();

        let results = tokio::task::spawn_blocking(move || {
            pairs
                .into_iter()
                .map(|(id, text)| (id, reranker.score(&query, &text)))
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| ScoringError::TaskFailed {
            reason: e.to_string(),
        })?;

        let mut outcome = RerankOutcome::default();
        for (company_id, result) in results {
            match result {
                Ok(score) => {
                    outcome.scores.insert(company_id, score);
                }
                Err(e) => {
                    warn!(company_id, error = %e, "Reranking failed; excluding company");
                    outcome.failures.push((company_id, e.to_string()));
                }
            }
        }

        debug!(
            scored = outcome.scores.len(),
            failed = outcome.failures.len(),
            "Reranked eligible set"
        );
        Ok(outcome)
    }
}
