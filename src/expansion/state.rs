//! Pure expansion state machine.
//!
//! `Init → Searching → Resolving → Filtering → Check → {Searching | Done | Exhausted}`.
//! Each event method is a guarded transition; calling one from the wrong state returns
//! [`ExpansionError::InvalidTransition`] and leaves the run untouched.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::config::ExpansionConfig;
use super::error::ExpansionError;
use crate::model::{
    CandidateMatch, Company, CompanyId, EligibilityVerdict, IncentiveId, LocationRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    Init,
    Searching,
    Resolving,
    Filtering,
    Check,
    Done,
    Exhausted,
}

impl ExpansionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Exhausted)
    }
}

impl std::fmt::Display for ExpansionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::Searching => "SEARCHING",
            Self::Resolving => "RESOLVING",
            Self::Filtering => "FILTERING",
            Self::Check => "CHECK",
            Self::Done => "DONE",
            Self::Exhausted => "EXHAUSTED",
        };
        f.write_str(name)
    }
}

/// Terminal state recorded with persisted results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Done,
    Exhausted,
}

/// Result of the `Check` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Grow the pool to `next_size` and search again.
    Expand { next_size: usize },
    Done,
    Exhausted,
}

/// An eligible company together with everything later stages need about it.
#[derive(Debug, Clone)]
pub struct EligibleCandidate {
    pub candidate: CandidateMatch,
    pub company: Company,
    pub location: LocationRecord,
    pub verdict: EligibilityVerdict,
}

impl EligibleCandidate {
    pub fn company_id(&self) -> CompanyId {
        self.company.id
    }
}

/// Summary of a finished expansion.
#[derive(Debug, Clone)]
pub struct ExpansionOutcome {
    pub incentive_id: IncentiveId,
    /// Eligible companies handed to scoring, best similarity first.
    pub selected: Vec<EligibleCandidate>,
    pub terminal: TerminalState,
    pub rounds: u32,
    /// Candidate pool size of the last round.
    pub final_size: usize,
    /// Distinct companies returned by retrieval across all rounds.
    pub candidates_seen: usize,
    /// Companies that reached the eligibility filter.
    pub candidates_evaluated: usize,
    /// Eligible companies found (before capping to the target).
    pub eligible_found: usize,
    pub fewer_than_target: bool,
}

/// Bookkeeping for one incentive's expansion loop.
#[derive(Debug)]
pub struct ExpansionRun {
    incentive_id: IncentiveId,
    config: ExpansionConfig,
    state: ExpansionState,
    size: usize,
    round: u32,
    seen: HashSet<CompanyId>,
    eligible: Vec<EligibleCandidate>,
    evaluated: usize,
}

impl ExpansionRun {
    pub fn new(incentive_id: IncentiveId, config: ExpansionConfig) -> Self {
        Self {
            incentive_id,
            config,
            state: ExpansionState::Init,
            size: 0,
            round: 0,
            seen: HashSet::new(),
            eligible: Vec::new(),
            evaluated: 0,
        }
    }

    pub fn state(&self) -> ExpansionState {
        self.state
    }

    pub fn candidate_size(&self) -> usize {
        self.size
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn eligible_count(&self) -> usize {
        self.eligible.len()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// `Init → Searching`. Returns the first candidate pool size.
    pub fn begin(&mut self) -> Result<usize, ExpansionError> {
        self.expect(ExpansionState::Init, "begin")?;
        self.size = self.config.initial_candidates;
        self.round = 1;
        self.state = ExpansionState::Searching;
        Ok(self.size)
    }

    /// `Searching → Resolving`. Returns the candidates not seen in earlier rounds, stamped
    /// with the current round, in retrieval order.
    pub fn accept_candidates(
        &mut self,
        candidates: Vec<CandidateMatch>,
    ) -> Result<Vec<CandidateMatch>, ExpansionError> {
        self.expect(ExpansionState::Searching, "accept candidates")?;

        let round = self.round;
        let fresh = candidates
            .into_iter()
            .filter(|c| self.seen.insert(c.company_id))
            .map(|mut c| {
                c.round = round;
                c
            })
            .collect();

        self.state = ExpansionState::Resolving;
        Ok(fresh)
    }

    /// `Resolving → Filtering`.
    pub fn locations_resolved(&mut self) -> Result<(), ExpansionError> {
        self.expect(ExpansionState::Resolving, "finish resolution")?;
        self.state = ExpansionState::Filtering;
        Ok(())
    }

    /// `Filtering → Check`. Merges the eligible companies of this round; `evaluated` is the
    /// number of companies that received a verdict.
    pub fn merge_verdicts(
        &mut self,
        eligible: Vec<EligibleCandidate>,
        evaluated: usize,
    ) -> Result<(), ExpansionError> {
        self.expect(ExpansionState::Filtering, "merge verdicts")?;

        for entry in eligible {
            if !entry.verdict.eligible {
                continue;
            }
            if self
                .eligible
                .iter()
                .any(|e| e.company_id() == entry.company_id())
            {
                continue;
            }
            self.eligible.push(entry);
        }
        self.evaluated += evaluated;

        self.state = ExpansionState::Check;
        Ok(())
    }

    /// `Check → Searching | Done | Exhausted`.
    pub fn check(&mut self) -> Result<CheckOutcome, ExpansionError> {
        self.expect(ExpansionState::Check, "check")?;

        if self.eligible.len() >= self.config.target_matches {
            self.state = ExpansionState::Done;
            return Ok(CheckOutcome::Done);
        }

        if self.size >= self.config.max_candidates {
            self.state = ExpansionState::Exhausted;
            return Ok(CheckOutcome::Exhausted);
        }

        self.size = (self.size + self.config.step).min(self.config.max_candidates);
        self.round += 1;
        self.state = ExpansionState::Searching;
        Ok(CheckOutcome::Expand {
            next_size: self.size,
        })
    }

    /// Consumes a terminated run.
    pub fn finish(self) -> Result<ExpansionOutcome, ExpansionError> {
        let terminal = match self.state {
            ExpansionState::Done => TerminalState::Done,
            ExpansionState::Exhausted => TerminalState::Exhausted,
            state => {
                return Err(ExpansionError::InvalidTransition {
                    state,
                    event: "finish",
                });
            }
        };

        let eligible_found = self.eligible.len();
        let mut selected = self.eligible;
        selected.sort_by(|a, b| by_similarity(&a.candidate, &b.candidate));
        selected.truncate(self.config.target_matches);

        Ok(ExpansionOutcome {
            incentive_id: self.incentive_id,
            selected,
            terminal,
            rounds: self.round,
            final_size: self.size,
            candidates_seen: self.seen.len(),
            candidates_evaluated: self.evaluated,
            eligible_found,
            fewer_than_target: eligible_found < self.config.target_matches,
        })
    }

    fn expect(&self, state: ExpansionState, event: &'static str) -> Result<(), ExpansionError> {
        if self.state == state {
            Ok(())
        } else {
            Err(ExpansionError::InvalidTransition {
                state: self.state,
                event,
            })
        }
    }
}

/// Similarity descending, then company id ascending.
pub fn by_similarity(a: &CandidateMatch, b: &CandidateMatch) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.company_id.cmp(&b.company_id))
}
