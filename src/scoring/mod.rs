//! Reranking and composite scoring of the eligible set.
//!
//! [`SemanticReranker`] produces the relevance signal `S` with the cross-encoder.
//! [`CompanyScorer`] combines it with the deterministic signals from [`signals`] into the
//! composite score and builds the two persisted rankings.
//!
//! # Ranking Ties
//!
//! Both orderings are total: composite ranking breaks ties by semantic score and then by
//! company id; semantic ranking breaks ties by company id. Identical inputs therefore always
//! produce identical rankings.

pub mod composite;
pub mod error;
pub mod semantic;
pub mod signals;
pub mod types;


pub use composite::{CompanyScorer, by_composite, by_semantic, composite};
pub use error::ScoringError;
pub use semantic::SemanticReranker;
pub use types::{OrgDirection, RerankOutcome, Rankings};
