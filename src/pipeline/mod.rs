//! End-to-end matching: expansion, reranking, scoring and persistence per incentive, and a
//! bounded-concurrency batch runner on top.

pub mod batch;
pub mod directory;
pub mod error;
pub mod matcher;


pub use batch::{BatchRunner, BatchSummary};
pub use directory::{CompanyDirectory, InMemoryCompanyDirectory, load_incentives};
pub use error::PipelineError;
pub use matcher::MatchingPipeline;
