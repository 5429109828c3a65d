//! Deterministic composite signals: sector overlap (M), organizational fit (O′) and website
//! presence (W).

use std::collections::HashSet;

use super::types::OrgDirection;
use crate::model::{Company, Incentive};

/// Words dropped before computing sector overlap.
pub const OVERLAP_STOP_WORDS: &[&str] = &[
    "de", "da", "do", "e", "a", "o", "para", "com", "em", "por", "the", "and", "or", "of", "to",
    "in",
];

const SOCIAL_FORMS: &[&str] = &[
    "COOPERATIVA",
    "ASSOCIAÇÃO",
    "ASSOCIACAO",
    "FUNDAÇÃO",
    "FUNDACAO",
    "MISERICÓRDIA",
    "MISERICORDIA",
    "CENTRO SOCIAL",
];

const SOCIAL_KEYWORDS: &[&str] = &[
    "associação",
    "cooperativa",
    "social",
    "nonprofit",
    "terceiro setor",
    "ipss",
];
const SMALL_KEYWORDS: &[&str] = &["pme", "pequena", "micro", "startup", "empreendedor"];
const LARGE_KEYWORDS: &[&str] = &[
    "grande empresa",
    "multinacional",
    "corporação",
    "s.a.",
    "administração pública",
    "governo",
];

/// Lowercased alphanumeric tokens without stop words.
pub fn overlap_tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !OVERLAP_STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the two token sets; `0.0` when either is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// M: overlap between the incentive's sectors/actions and the company's
/// classification/activities.
pub fn sector_overlap(incentive: &Incentive, company: &Company) -> f64 {
    jaccard(
        &overlap_tokens(&incentive.sector_text()),
        &overlap_tokens(&company.sector_text()),
    )
}

/// O: capacity estimate from the legal form in the company name.
pub fn org_capacity(name: &str) -> f64 {
    let upper = name.to_uppercase();
    let tokens: Vec<&str> = upper
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let has_token = |t: &str| tokens.contains(&t);

    if upper.contains("S.A.") || has_token("SA") {
        1.0
    } else if SOCIAL_FORMS.iter().any(|form| upper.contains(form)) {
        1.0
    } else if has_token("SGPS") {
        0.6
    } else if has_token("UNIPESSOAL") {
        0.4
    } else if has_token("LDA") || has_token("LTD") || has_token("LTDA") {
        0.7
    } else {
        0.5
    }
}

/// Organizational profile favored by the incentive, from its title, sectors and actions.
pub fn org_direction(incentive: &Incentive) -> OrgDirection {
    let text = incentive.direction_text().to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    if mentions(SOCIAL_KEYWORDS) {
        OrgDirection::Neutral
    } else if mentions(SMALL_KEYWORDS) {
        OrgDirection::Small
    } else if mentions(LARGE_KEYWORDS) {
        OrgDirection::Large
    } else {
        OrgDirection::Neutral
    }
}

/// O′: capacity adjusted by direction.
pub fn organizational_fit(capacity: f64, direction: OrgDirection) -> f64 {
    let fit = match direction {
        OrgDirection::Large => capacity,
        OrgDirection::Small => 1.0 - capacity,
        OrgDirection::Neutral => {
            if capacity >= 0.9 {
                1.0
            } else {
                0.5
            }
        }
    };
    fit.clamp(0.0, 1.0)
}

/// W
pub fn digital_presence(company: &Company) -> f64 {
    if company.has_website() { 1.0 } else { 0.0 }
}
