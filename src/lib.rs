//! Fundmatch library crate (used by the batch binary and integration tests).
//!
//! Ranks the best-fit companies for each funding incentive under a per-incentive cost ceiling:
//! vector retrieval, cache-first geocoding, geographic eligibility, cross-encoder reranking,
//! weighted multi-factor scoring, and persistence of two top-N rankings.
//!
//! # Public API Surface
//!
//! ## Pipeline
//! - [`MatchingPipeline`], [`BatchRunner`] - Per-incentive and batch drivers
//! - [`ExpansionController`] - Iterative candidate-pool expansion state machine
//! - [`CompanyDirectory`] - Company lookup by id
//!
//! ## Stages
//! - [`CandidateRetriever`] - Embedding + vector search
//! - [`LocationResolver`], [`LocationCache`] - Cache-first geocoding
//! - [`EligibilityFilter`] - Geographic eligibility
//! - [`SemanticReranker`], [`CompanyScorer`] - Relevance and composite scoring
//! - [`ResultStore`] - Persisted rankings
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod eligibility;
pub mod embedding;
pub mod expansion;
pub mod location;
pub mod model;
pub mod pipeline;
pub mod results;
pub mod retrieval;
pub mod scoring;
pub mod vectordb;

pub use config::{Config, ConfigError};
pub use constants::{SCORING_FORMULA, composite_weights, validate_weights};
#[cfg(any(test, feature = "mock"))]
pub use eligibility::MockReasoner;
pub use eligibility::{EligibilityFilter, EligibilityReasoner, GenaiReasoner, ReasonerError};
pub use embedding::{
    EmbeddingError, EncoderConfig, QueryEncoder, Reranker, RerankerConfig, RerankerError,
};
pub use expansion::{
    ExpansionConfig, ExpansionController, ExpansionError, ExpansionOutcome, ExpansionState,
    TerminalState,
};
#[cfg(any(test, feature = "mock"))]
pub use location::{MockBehavior, MockGeocoder};
pub use location::{
    DiskLocationCache, GeocodingProvider, GooglePlacesGeocoder, LocationCache, LocationResolver,
    MemoryLocationCache, ResolverStats,
};
pub use model::{
    CandidateMatch, Company, CompanyId, EligibilityVerdict, GeoFit, Incentive, IncentiveId,
    LocationRecord, ResolutionStatus, ScoreBreakdown, ScoredMatch,
};
pub use pipeline::{
    BatchRunner, BatchSummary, CompanyDirectory, InMemoryCompanyDirectory, MatchingPipeline,
    PipelineError, load_incentives,
};
pub use results::{IncentiveResults, JsonResultStore, MemoryResultStore, RankedCompany, ResultStore};
pub use retrieval::{CandidateRetriever, RetrievalError, build_query_text};
pub use scoring::{CompanyScorer, RerankOutcome, ScoringError, SemanticReranker};
#[cfg(any(test, feature = "mock"))]
pub use vectordb::MockVectorDbClient;
pub use vectordb::{QdrantClient, SearchResult, VectorDbClient, VectorDbError};
