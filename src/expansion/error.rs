use thiserror::Error;

use super::state::ExpansionState;
use crate::retrieval::RetrievalError;

#[derive(Debug, Error)]
pub enum ExpansionError {
    #[error("invalid expansion configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("cannot {event} while in state {state}")]
    InvalidTransition {
        state: ExpansionState,
        event: &'static str,
    },

    #[error("candidate retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),
}
