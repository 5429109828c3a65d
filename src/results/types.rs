use serde::{Deserialize, Serialize};

use crate::constants::ACTIVITY_SNIPPET_CHARS;
use crate::expansion::TerminalState;
use crate::model::{Company, CompanyId, IncentiveId, ScoreBreakdown, ScoredMatch};

/// One entry of a persisted ranking, self-contained for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCompany {
    pub company_id: CompanyId,
    pub rank: u32,
    /// Composite score in the composite ranking, semantic score in the semantic ranking.
    pub score: f64,
    pub semantic_score: f64,
    /// Present in the composite ranking only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
    pub name: String,
    pub classification: String,
    pub website: Option<String>,
    pub address: Option<String>,
    pub activities: String,
}

impl RankedCompany {
    /// Entry for the composite ranking.
    pub fn composite(scored: &ScoredMatch, company: &Company, address: Option<String>) -> Self {
        Self {
            score: scored.composite,
            breakdown: Some(scored.breakdown),
            ..Self::semantic(scored, company, address)
        }
    }

    /// Entry for the semantic ranking.
    pub fn semantic(scored: &ScoredMatch, company: &Company, address: Option<String>) -> Self {
        Self {
            company_id: scored.company_id,
            rank: scored.rank,
            score: scored.semantic,
            semantic_score: scored.semantic,
            breakdown: None,
            name: company.name.clone(),
            classification: company.classification.clone(),
            website: company.has_website().then(|| company.website.clone()).flatten(),
            address,
            activities: company.activity_snippet(ACTIVITY_SNIPPET_CHARS),
        }
    }
}

/// Persisted result set of one incentive. Replaced as a whole on reprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveResults {
    pub incentive_id: IncentiveId,
    pub semantic_ranking: Vec<RankedCompany>,
    pub composite_ranking: Vec<RankedCompany>,
    /// Eligible companies found during expansion, before the top-N cut.
    pub eligible_count: usize,
    /// Set when expansion hit the cap before reaching the target.
    pub fewer_than_target: bool,
    pub terminal_state: TerminalState,
    pub candidates_searched: usize,
    pub rounds: u32,
    pub processing_ms: u64,
    /// RFC 3339.
    pub processed_at: String,
    pub scoring_formula: String,
}
