//! Iterative candidate-pool expansion.
//!
//! The pool starts small and grows by a fixed step until enough geographically eligible
//! companies are found or the cap is reached. Only companies first seen in the current round
//! are resolved and filtered, so earlier work is never repeated.

pub mod config;
pub mod controller;
pub mod error;
pub mod state;

#[cfg(test)]
mod tests;

pub use config::ExpansionConfig;
pub use controller::ExpansionController;
pub use error::ExpansionError;
pub use state::{
    CheckOutcome, EligibleCandidate, ExpansionOutcome, ExpansionRun, ExpansionState,
    TerminalState, by_similarity,
};
