//! Domain records shared by every pipeline stage.
//!
//! Incentives and companies are immutable inputs. Candidates and verdicts live for a single
//! incentive run; [`ScoredMatch`] is the durable output.

pub mod location;

#[cfg(test)]
mod tests;

pub use location::{ArchivedLocationRecord, LocationRecord, ResolutionStatus};

use serde::{Deserialize, Serialize};

pub type IncentiveId = u64;
pub type CompanyId = u64;

/// Placeholder websites that count as "no website".
const MISSING_WEBSITE_MARKERS: &[&str] = &["n/a", "na", "none", "-"];

/// A funding program looking for recipient companies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incentive {
    pub id: IncentiveId,
    pub title: String,
    /// Free-text description of the targeted sectors.
    #[serde(default)]
    pub sector: String,
    /// Longer enriched description, when available.
    #[serde(default)]
    pub description: Option<String>,
    /// Free text: a region, a city, or a national marker. Left empty when the source has no
    /// value, in which case no company is eligible.
    #[serde(default)]
    pub geo_requirement: String,
    #[serde(default)]
    pub eligible_actions: Vec<String>,
    #[serde(default)]
    pub total_budget: Option<f64>,
}

impl Incentive {
    /// Text used for sector overlap: target sectors plus eligible actions.
    pub fn sector_text(&self) -> String {
        let mut parts = Vec::with_capacity(1 + self.eligible_actions.len());
        parts.push(self.sector.as_str());
        parts.extend(self.eligible_actions.iter().map(String::as_str));
        join_non_empty(parts)
    }

    /// Text used to infer the organizational direction (title, sectors, actions).
    pub fn direction_text(&self) -> String {
        let mut parts = Vec::with_capacity(2 + self.eligible_actions.len());
        parts.push(self.title.as_str());
        parts.push(self.sector.as_str());
        parts.extend(self.eligible_actions.iter().map(String::as_str));
        join_non_empty(parts)
    }
}

/// A candidate recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    /// Primary classification label (sector taxonomy code plus description).
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub activities: String,
    #[serde(default)]
    pub website: Option<String>,
    /// Optional address hint sent to the geocoder.
    #[serde(default)]
    pub address_hint: Option<String>,
}

impl Company {
    /// Returns `true` if a usable website URL is present.
    pub fn has_website(&self) -> bool {
        self.website.as_deref().is_some_and(|w| {
            let w = w.trim();
            !w.is_empty()
                && !MISSING_WEBSITE_MARKERS
                    .iter()
                    .any(|m| w.eq_ignore_ascii_case(m))
        })
    }

    /// Text compared against the incentive by the cross-encoder.
    pub fn rerank_text(&self) -> String {
        join_non_empty([
            self.name.as_str(),
            self.classification.as_str(),
            self.activities.as_str(),
        ])
    }

    /// Text used for sector overlap: classification plus activities.
    pub fn sector_text(&self) -> String {
        join_non_empty([self.classification.as_str(), self.activities.as_str()])
    }

    /// First `max_chars` characters of the activity text.
    pub fn activity_snippet(&self, max_chars: usize) -> String {
        match self.activities.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &self.activities[..idx]),
            None => self.activities.clone(),
        }
    }
}

/// A company surfaced by vector retrieval for an incentive.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch {
    pub incentive_id: IncentiveId,
    pub company_id: CompanyId,
    pub similarity: f32,
    /// Expansion round (1-based) in which the company was first seen.
    pub round: u32,
}

/// Discretized geographic fit used as the `G` signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoFit {
    Inside,
    Partial,
    Outside,
}

impl GeoFit {
    pub fn value(&self) -> f64 {
        match self {
            Self::Inside => 1.0,
            Self::Partial => 0.5,
            Self::Outside => 0.0,
        }
    }
}

/// Geographic eligibility decision for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityVerdict {
    pub incentive_id: IncentiveId,
    pub company_id: CompanyId,
    pub eligible: bool,
    pub geo_fit: GeoFit,
    pub rationale: String,
}

impl EligibilityVerdict {
    pub fn eligible(
        incentive_id: IncentiveId,
        company_id: CompanyId,
        geo_fit: GeoFit,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            incentive_id,
            company_id,
            eligible: geo_fit != GeoFit::Outside,
            geo_fit,
            rationale: rationale.into(),
        }
    }

    pub fn ineligible(
        incentive_id: IncentiveId,
        company_id: CompanyId,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            incentive_id,
            company_id,
            eligible: false,
            geo_fit: GeoFit::Outside,
            rationale: rationale.into(),
        }
    }
}

/// Per-signal contributions to a composite score, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// S
    pub relevance: f64,
    /// M
    pub sector_overlap: f64,
    /// G
    pub geography_fit: f64,
    /// O′
    pub organizational_fit: f64,
    /// W
    pub digital_presence: f64,
}

/// A ranked company for an incentive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub incentive_id: IncentiveId,
    pub company_id: CompanyId,
    /// 1-based position in the composite ranking.
    pub rank: u32,
    pub composite: f64,
    pub breakdown: ScoreBreakdown,
    /// Reranker score alone.
    pub semantic: f64,
    /// Unix seconds.
    pub computed_at: i64,
}

fn join_non_empty<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
