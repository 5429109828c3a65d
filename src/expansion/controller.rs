use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use super::config::ExpansionConfig;
use super::error::ExpansionError;
use super::state::{CheckOutcome, EligibleCandidate, ExpansionOutcome, ExpansionRun};
use crate::eligibility::EligibilityFilter;
use crate::location::LocationResolver;
use crate::model::{Company, Incentive, LocationRecord};
use crate::pipeline::CompanyDirectory;
use crate::retrieval::CandidateRetriever;
use crate::vectordb::VectorDbClient;

/// Drives [`ExpansionRun`] against the retrieval, resolution and eligibility stages.
#[derive(Debug, Clone)]
pub struct ExpansionController {
    config: ExpansionConfig,
}

impl ExpansionController {
    pub fn new(config: ExpansionConfig) -> Result<Self, ExpansionError> {
        config
            .validate()
            .map_err(|reason| ExpansionError::InvalidConfig { reason })?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    /// Runs the expansion loop for one incentive.
    ///
    /// Only retrieval failures abort the run. Geocoding and reasoning failures surface as
    /// ineligible verdicts.
    #[instrument(skip_all, fields(incentive_id = incentive.id))]
    pub async fn run<V: VectorDbClient>(
        &self,
        incentive: &Incentive,
        retriever: &CandidateRetriever<V>,
        resolver: &LocationResolver,
        filter: &EligibilityFilter,
        directory: &dyn CompanyDirectory,
    ) -> Result<ExpansionOutcome, ExpansionError> {
        let mut run = ExpansionRun::new(incentive.id, self.config);
        let mut size = run.begin()?;

        loop {
            let candidates = retriever.retrieve(incentive, size).await?;
            let retrieved = candidates.len();
            let fresh = run.accept_candidates(candidates)?;

            debug!(
                round = run.round(),
                size,
                retrieved,
                new = fresh.len(),
                "Retrieved candidates"
            );

            let ids: Vec<_> = fresh.iter().map(|c| c.company_id).collect();
            let mut known = directory.companies(&ids).await;
            let companies: Vec<Company> = ids.iter().filter_map(|id| known.remove(id)).collect();
            if companies.len() < ids.len() {
                warn!(
                    missing = ids.len() - companies.len(),
                    "Retrieved companies missing from directory, skipping"
                );
            }

            let mut locations = resolver.resolve_batch(&companies).await;
            run.locations_resolved()?;

            let pairs: Vec<(Company, LocationRecord)> = companies
                .into_iter()
                .filter_map(|c| locations.remove(&c.id).map(|loc| (c, loc)))
                .collect();

            let mut verdicts = filter
                .filter_batch(incentive.id, &incentive.geo_requirement, &pairs)
                .await;

            let evaluated = pairs.len();
            let mut by_id: HashMap<_, _> = pairs.into_iter().map(|(c, l)| (c.id, (c, l))).collect();
            let eligible: Vec<EligibleCandidate> = fresh
                .into_iter()
                .filter_map(|candidate| {
                    let verdict = verdicts.remove(&candidate.company_id)?;
                    if !verdict.eligible {
                        return None;
                    }
                    let (company, location) = by_id.remove(&candidate.company_id)?;
                    Some(EligibleCandidate {
                        candidate,
                        company,
                        location,
                        verdict,
                    })
                })
                .collect();

            debug!(
                round = run.round(),
                evaluated,
                eligible = eligible.len(),
                "Filtered round"
            );

            run.merge_verdicts(eligible, evaluated)?;

            match run.check()? {
                CheckOutcome::Expand { next_size } => {
                    debug!(
                        eligible = run.eligible_count(),
                        target = self.config.target_matches,
                        next_size,
                        "Expanding candidate pool"
                    );
                    size = next_size;
                }
                CheckOutcome::Done | CheckOutcome::Exhausted => break,
            }
        }

        let outcome = run.finish()?;

        info!(
            terminal = ?outcome.terminal,
            rounds = outcome.rounds,
            final_size = outcome.final_size,
            seen = outcome.candidates_seen,
            eligible = outcome.eligible_found,
            fewer_than_target = outcome.fewer_than_target,
            "Expansion finished"
        );

        Ok(outcome)
    }
}
