use crate::constants::{
    DEFAULT_EXPANSION_STEP, DEFAULT_INITIAL_CANDIDATES, DEFAULT_MAX_CANDIDATES,
    DEFAULT_TARGET_MATCHES,
};

/// Candidate-pool sizing for the expansion loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionConfig {
    /// Candidates retrieved in the first round.
    pub initial_candidates: usize,
    /// Growth of the candidate pool per round.
    pub step: usize,
    /// Hard cap on the candidate pool.
    pub max_candidates: usize,
    /// Eligible companies needed to stop early.
    pub target_matches: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            initial_candidates: DEFAULT_INITIAL_CANDIDATES,
            step: DEFAULT_EXPANSION_STEP,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            target_matches: DEFAULT_TARGET_MATCHES,
        }
    }
}

impl ExpansionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_candidates == 0 {
            return Err("initial_candidates must be greater than zero".to_string());
        }
        if self.step == 0 {
            return Err("step must be greater than zero".to_string());
        }
        if self.max_candidates < self.initial_candidates {
            return Err(format!(
                "max_candidates ({}) must be >= initial_candidates ({})",
                self.max_candidates, self.initial_candidates
            ));
        }
        if self.target_matches == 0 {
            return Err("target_matches must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Upper bound on the number of rounds before the loop terminates.
    pub fn max_rounds(&self) -> u32 {
        let growth = self.max_candidates.saturating_sub(self.initial_candidates);
        (growth.div_ceil(self.step.max(1)) + 1) as u32
    }
}
