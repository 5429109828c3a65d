use std::cmp::Ordering;

use tracing::debug;

use super::signals::{
    digital_presence, org_capacity, org_direction, organizational_fit, sector_overlap,
};
use super::types::{OrgDirection, Rankings};
use crate::constants::{
    WEIGHT_DIGITAL_PRESENCE, WEIGHT_GEOGRAPHY, WEIGHT_ORGANIZATIONAL, WEIGHT_RELEVANCE,
    WEIGHT_SECTOR_OVERLAP,
};
use crate::model::{Company, EligibilityVerdict, GeoFit, Incentive, ScoreBreakdown, ScoredMatch};

/// Weighted multi-factor scoring:
/// `composite = 0.50·S + 0.20·M + 0.10·G + 0.15·O′ + 0.05·W`.
#[derive(Debug, Clone)]
pub struct CompanyScorer {
    top_n: usize,
}

impl CompanyScorer {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Scores one eligible company. `rank` is left at 0 until [`CompanyScorer::rank`].
    pub fn score(
        &self,
        incentive: &Incentive,
        company: &Company,
        semantic: f32,
        verdict: &EligibilityVerdict,
    ) -> ScoredMatch {
        self.score_with_direction(incentive, company, semantic, verdict, org_direction(incentive))
    }

    /// Scores every company with a semantic score, in input order. The organizational
    /// direction is derived once per incentive.
    pub fn score_all<'a>(
        &self,
        incentive: &Incentive,
        entries: impl IntoIterator<Item = (&'a Company, &'a EligibilityVerdict, f32)>,
    ) -> Vec<ScoredMatch> {
        let direction = org_direction(incentive);
        debug!(incentive_id = incentive.id, %direction, "Organizational direction");

        entries
            .into_iter()
            .map(|(company, verdict, semantic)| {
                self.score_with_direction(incentive, company, semantic, verdict, direction)
            })
            .collect()
    }

    fn score_with_direction(
        &self,
        incentive: &Incentive,
        company: &Company,
        semantic: f32,
        verdict: &EligibilityVerdict,
        direction: OrgDirection,
    ) -> ScoredMatch {
        let relevance = clamp_unit(semantic as f64);
        let geography_fit = if verdict.eligible {
            verdict.geo_fit.value()
        } else {
            GeoFit::Outside.value()
        };

        let breakdown = ScoreBreakdown {
            relevance,
            sector_overlap: sector_overlap(incentive, company),
            geography_fit,
            organizational_fit: organizational_fit(org_capacity(&company.name), direction),
            digital_presence: digital_presence(company),
        };

        ScoredMatch {
            incentive_id: incentive.id,
            company_id: company.id,
            rank: 0,
            composite: composite(&breakdown),
            breakdown,
            semantic: relevance,
            computed_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Orders the scored set both ways and keeps the top entries of each.
    pub fn rank(&self, scored: Vec<ScoredMatch>) -> Rankings {
        let mut composite_order = scored.clone();
        composite_order.sort_by(by_composite);
        composite_order.truncate(self.top_n);
        assign_ranks(&mut composite_order);

        let mut semantic_order = scored;
        semantic_order.sort_by(by_semantic);
        semantic_order.truncate(self.top_n);
        assign_ranks(&mut semantic_order);

        Rankings {
            composite: composite_order,
            semantic: semantic_order,
        }
    }
}

/// Weighted sum of the breakdown, clamped to `[0, 1]`.
pub fn composite(breakdown: &ScoreBreakdown) -> f64 {
    let value = WEIGHT_RELEVANCE * breakdown.relevance
        + WEIGHT_SECTOR_OVERLAP * breakdown.sector_overlap
        + WEIGHT_GEOGRAPHY * breakdown.geography_fit
        + WEIGHT_ORGANIZATIONAL * breakdown.organizational_fit
        + WEIGHT_DIGITAL_PRESENCE * breakdown.digital_presence;
    clamp_unit(value)
}

/// Composite descending, then semantic descending, then company id ascending.
pub fn by_composite(a: &ScoredMatch, b: &ScoredMatch) -> Ordering {
    b.composite
        .total_cmp(&a.composite)
        .then_with(|| b.semantic.total_cmp(&a.semantic))
        .then_with(|| a.company_id.cmp(&b.company_id))
}

/// Semantic descending, then company id ascending.
pub fn by_semantic(a: &ScoredMatch, b: &ScoredMatch) -> Ordering {
    b.semantic
        .total_cmp(&a.semantic)
        .then_with(|| a.company_id.cmp(&b.company_id))
}

fn assign_ranks(matches: &mut [ScoredMatch]) {
    for (i, m) in matches.iter_mut().enumerate() {
        m.rank = i as u32 + 1;
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
