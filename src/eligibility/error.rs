use std::time::Duration;

use thiserror::Error;

/// Errors from the eligibility reasoning provider. None of them are fatal: the filter turns
/// every one into ineligible verdicts.
#[derive(Debug, Error)]
pub enum ReasonerError {
    #[error("reasoner timed out after {0:?}")]
    Timeout(Duration),

    #[error("reasoner request failed: {0}")]
    Provider(String),

    #[error("reasoner returned no text")]
    EmptyResponse,

    #[error("unparsable reasoner response: {reason}")]
    InvalidResponse { reason: String },
}
