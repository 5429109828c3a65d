//! Geographic eligibility.
//!
//! Deterministic checks run first (missing locations, national requirements); only the
//! remaining companies go to the reasoning provider, in a single structured prompt.

pub mod error;
pub mod filter;
pub mod prompt;
pub mod reasoner;

#[cfg(test)]
mod tests;

pub use error::ReasonerError;
pub use filter::EligibilityFilter;
pub use prompt::{GeoMatch, NUTS2_REGIONS, build_prompt, is_national_requirement, parse_response};
#[cfg(any(test, feature = "mock"))]
pub use reasoner::MockReasoner;
pub use reasoner::{EligibilityReasoner, GenaiReasoner};
