//! Persisted rankings.
//!
//! Every incentive owns one [`IncentiveResults`] document holding both the semantic and the
//! composite top-N. Saving replaces the whole document.

pub mod error;
pub mod store;
pub mod types;


pub use error::ResultStoreError;
pub use store::{JsonResultStore, MemoryResultStore, ResultStore};
pub use types::{IncentiveResults, RankedCompany};
