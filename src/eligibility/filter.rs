use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::error::ReasonerError;
use super::prompt::{GeoMatch, build_prompt, is_national_requirement, parse_response};
use super::reasoner::EligibilityReasoner;
use crate::model::{
    Company, CompanyId, EligibilityVerdict, GeoFit, IncentiveId, LocationRecord, ResolutionStatus,
};

/// Geographic eligibility for a batch of located companies.
///
/// Never fails open: companies without an address, reasoner failures, ambiguous places and
/// companies the reasoner skipped all produce ineligible verdicts.
pub struct EligibilityFilter {
    reasoner: Arc<dyn EligibilityReasoner>,
    country: String,
    timeout: Duration,
}

impl EligibilityFilter {
    pub fn new(
        reasoner: Arc<dyn EligibilityReasoner>,
        country: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            reasoner,
            country: country.into(),
            timeout,
        }
    }

    /// Returns exactly one verdict per distinct company id in `candidates`.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn filter_batch(
        &self,
        incentive_id: IncentiveId,
        requirement: &str,
        candidates: &[(Company, LocationRecord)],
    ) -> HashMap<CompanyId, EligibilityVerdict> {
        let mut verdicts = HashMap::with_capacity(candidates.len());
        let mut located: Vec<(CompanyId, &str)> = Vec::with_capacity(candidates.len());

        for (company, location) in candidates {
            if verdicts.contains_key(&company.id)
                || located.iter().any(|(id, _)| *id == company.id)
            {
                continue;
            }
            match location.address.as_deref() {
                Some(address) if location.is_resolved() => located.push((company.id, address)),
                _ => {
                    verdicts.insert(
                        company.id,
                        EligibilityVerdict::ineligible(
                            incentive_id,
                            company.id,
                            missing_location_rationale(location),
                        ),
                    );
                }
            }
        }

        if located.is_empty() {
            return verdicts;
        }

        if requirement.trim().is_empty() {
            warn!(
                affected = located.len(),
                "Incentive has no geographic requirement; marking batch ineligible"
            );
            for (company_id, _) in located {
                verdicts.insert(
                    company_id,
                    EligibilityVerdict::ineligible(
                        incentive_id,
                        company_id,
                        "incentive has no geographic requirement",
                    ),
                );
            }
            return verdicts;
        }

        if is_national_requirement(requirement) {
            debug!(
                located = located.len(),
                "National requirement; all located companies eligible"
            );
            for (company_id, _) in located {
                verdicts.insert(
                    company_id,
                    EligibilityVerdict::eligible(
                        incentive_id,
                        company_id,
                        GeoFit::Inside,
                        format!("national requirement, located in {}", self.country),
                    ),
                );
            }
            return verdicts;
        }

        let prompt = build_prompt(requirement, &self.country, &located);
        let response =
            match tokio::time::timeout(self.timeout, self.reasoner.complete(&prompt)).await {
                Ok(result) => result,
                Err(_) => Err(ReasonerError::Timeout(self.timeout)),
            };

        match response.and_then(|text| parse_response(&text)) {
            Ok(mut matches) => {
                for (company_id, _) in located {
                    let verdict = match matches.remove(&company_id) {
                        Some(geo) => verdict_from_match(incentive_id, company_id, geo),
                        None => EligibilityVerdict::ineligible(
                            incentive_id,
                            company_id,
                            "no verdict returned for this company",
                        ),
                    };
                    verdicts.insert(company_id, verdict);
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    affected = located.len(),
                    "Eligibility reasoning failed; marking batch ineligible"
                );
                for (company_id, _) in located {
                    verdicts.insert(
                        company_id,
                        EligibilityVerdict::ineligible(
                            incentive_id,
                            company_id,
                            format!("eligibility check failed: {}", e),
                        ),
                    );
                }
            }
        }

        let eligible = verdicts.values().filter(|v| v.eligible).count();
        info!(
            requirement,
            evaluated = verdicts.len(),
            eligible,
            "Filtered candidate batch"
        );
        verdicts
    }
}

fn verdict_from_match(
    incentive_id: IncentiveId,
    company_id: CompanyId,
    geo: GeoMatch,
) -> EligibilityVerdict {
    let or_default = |rationale: String, fallback: &str| {
        if rationale.is_empty() {
            fallback.to_string()
        } else {
            rationale
        }
    };

    match geo {
        GeoMatch::Inside { rationale } => EligibilityVerdict::eligible(
            incentive_id,
            company_id,
            GeoFit::Inside,
            or_default(rationale, "inside the required area"),
        ),
        GeoMatch::Partial { rationale } => EligibilityVerdict::eligible(
            incentive_id,
            company_id,
            GeoFit::Partial,
            or_default(rationale, "partially inside the required area"),
        ),
        GeoMatch::Outside { rationale } => EligibilityVerdict::ineligible(
            incentive_id,
            company_id,
            or_default(rationale, "outside the required area"),
        ),
        GeoMatch::Ambiguous { rationale } => EligibilityVerdict::ineligible(
            incentive_id,
            company_id,
            format!("ambiguous: {}", or_default(rationale, "place matches several regions")),
        ),
    }
}

fn missing_location_rationale(location: &LocationRecord) -> String {
    match location.status {
        ResolutionStatus::NotFound => "location not found by geocoding provider".to_string(),
        ResolutionStatus::ResolutionError => format!(
            "location unavailable: {}",
            location.detail.as_deref().unwrap_or("geocoding error")
        ),
        ResolutionStatus::ResolvedCached | ResolutionStatus::ResolvedFresh => {
            "resolved location has no address".to_string()
        }
    }
}
