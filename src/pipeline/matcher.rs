use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use super::directory::CompanyDirectory;
use super::error::PipelineError;
use crate::constants::SCORING_FORMULA;
use crate::eligibility::EligibilityFilter;
use crate::expansion::{ExpansionController, ExpansionOutcome};
use crate::location::LocationResolver;
use crate::model::{Company, CompanyId, Incentive, ScoredMatch};
use crate::results::{IncentiveResults, RankedCompany, ResultStore};
use crate::retrieval::{CandidateRetriever, build_query_text};
use crate::scoring::{CompanyScorer, Rankings, SemanticReranker};
use crate::vectordb::VectorDbClient;

/// Every service one incentive run needs, constructed once and shared by all runs.
pub struct MatchingPipeline<V> {
    retriever: CandidateRetriever<V>,
    resolver: Arc<LocationResolver>,
    filter: EligibilityFilter,
    controller: ExpansionController,
    reranker: SemanticReranker,
    scorer: CompanyScorer,
    directory: Arc<dyn CompanyDirectory>,
    store: Arc<dyn ResultStore>,
}

impl<V: VectorDbClient> MatchingPipeline<V> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        retriever: CandidateRetriever<V>,
        resolver: Arc<LocationResolver>,
        filter: EligibilityFilter,
        controller: ExpansionController,
        reranker: SemanticReranker,
        scorer: CompanyScorer,
        directory: Arc<dyn CompanyDirectory>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            retriever,
            resolver,
            filter,
            controller,
            reranker,
            scorer,
            directory,
            store,
        }
    }

    pub fn resolver(&self) -> &Arc<LocationResolver> {
        &self.resolver
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Expands, reranks, scores and persists one incentive.
    ///
    /// Fails only on retrieval or persistence errors; an exhausted expansion is a valid result.
    #[instrument(skip_all, fields(incentive_id = incentive.id))]
    pub async fn process_incentive(
        &self,
        incentive: &Incentive,
    ) -> Result<IncentiveResults, PipelineError> {
        let started = Instant::now();

        let outcome = self
            .controller
            .run(
                incentive,
                &self.retriever,
                &self.resolver,
                &self.filter,
                self.directory.as_ref(),
            )
            .await?;

        let companies: Vec<Company> = outcome.selected.iter().map(|e| e.company.clone()).collect();
        let rerank = self
            .reranker
            .rerank(&build_query_text(incentive), &companies)
            .await?;
        if !rerank.failures.is_empty() {
            warn!(
                excluded = rerank.failures.len(),
                "Companies excluded from rankings after reranking failures"
            );
        }

        let entries = outcome.selected.iter().filter_map(|e| {
            rerank
                .score(e.company_id())
                .map(|s| (&e.company, &e.verdict, s))
        });
        let rankings = self.scorer.rank(self.scorer.score_all(incentive, entries));

        let results = assemble_results(incentive, &outcome, &rankings, started);
        self.store.save(&results).await?;

        info!(
            terminal = ?results.terminal_state,
            rounds = results.rounds,
            eligible = results.eligible_count,
            ranked = results.composite_ranking.len(),
            fewer_than_target = results.fewer_than_target,
            processing_ms = results.processing_ms,
            "Incentive processed"
        );

        Ok(results)
    }
}

fn assemble_results(
    incentive: &Incentive,
    outcome: &ExpansionOutcome,
    rankings: &Rankings,
    started: Instant,
) -> IncentiveResults {
    let details: HashMap<CompanyId, (&Company, Option<String>)> = outcome
        .selected
        .iter()
        .map(|e| (e.company_id(), (&e.company, e.location.address.clone())))
        .collect();

    let entries = |matches: &[ScoredMatch], composite: bool| {
        matches
            .iter()
            .filter_map(|m| {
                let (company, address) = details.get(&m.company_id)?;
                Some(if composite {
                    RankedCompany::composite(m, company, address.clone())
                } else {
                    RankedCompany::semantic(m, company, address.clone())
                })
            })
            .collect::<Vec<_>>()
    };

    IncentiveResults {
        incentive_id: incentive.id,
        semantic_ranking: entries(rankings.semantic.as_slice(), false),
        composite_ranking: entries(rankings.composite.as_slice(), true),
        eligible_count: outcome.eligible_found,
        fewer_than_target: outcome.fewer_than_target,
        terminal_state: outcome.terminal,
        candidates_searched: outcome.candidates_seen,
        rounds: outcome.rounds,
        processing_ms: started.elapsed().as_millis() as u64,
        processed_at: chrono::Utc::now().to_rfc3339(),
        scoring_formula: SCORING_FORMULA.to_string(),
    }
}
