use std::collections::HashMap;

use crate::model::{CompanyId, ScoredMatch};

/// Reranker output for one eligible set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RerankOutcome {
    /// Relevance in `[0, 1]` per company.
    pub scores: HashMap<CompanyId, f32>,
    /// Companies that could not be scored, with the reason. They are left out of both rankings.
    pub failures: Vec<(CompanyId, String)>,
}

impl RerankOutcome {
    pub fn score(&self, company_id: CompanyId) -> Option<f32> {
        self.scores.get(&company_id).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Organizational profile an incentive favors.
pub enum OrgDirection {
    /// SMEs, micro companies, startups.
    Small,
    /// Social economy or no stated preference.
    Neutral,
    /// Established companies and public bodies.
    Large,
}

impl OrgDirection {
    /// `-1`, `0` or `+1`.
    pub fn sign(&self) -> i8 {
        match self {
            Self::Small => -1,
            Self::Neutral => 0,
            Self::Large => 1,
        }
    }
}

impl std::fmt::Display for OrgDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Small => write!(f, "SMALL"),
            Self::Neutral => write!(f, "NEUTRAL"),
            Self::Large => write!(f, "LARGE"),
        }
    }
}

/// Top entries of both orderings for one incentive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rankings {
    /// Ordered by composite score. `rank` is the composite position.
    pub composite: Vec<ScoredMatch>,
    /// Ordered by the reranker score alone. `rank` is the semantic position.
    pub semantic: Vec<ScoredMatch>,
}
