use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{error, info};

use super::matcher::MatchingPipeline;
use crate::expansion::TerminalState;
use crate::model::{Incentive, IncentiveId};
use crate::vectordb::VectorDbClient;

/// Totals of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Incentives that reached the target.
    pub done: usize,
    /// Incentives that hit the cap with fewer eligible companies than the target.
    pub exhausted: usize,
    /// Aborted incentives with the error message.
    pub failed: Vec<(IncentiveId, String)>,
}

impl BatchSummary {
    pub fn processed(&self) -> usize {
        self.done + self.exhausted
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Runs the pipeline over many incentives with at most `concurrency` in flight. All runs share
/// the pipeline's location cache.
pub struct BatchRunner<V> {
    pipeline: Arc<MatchingPipeline<V>>,
    concurrency: usize,
}

impl<V: VectorDbClient> BatchRunner<V> {
    pub fn new(pipeline: Arc<MatchingPipeline<V>>, concurrency: usize) -> Self {
        Self {
            pipeline,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run(&self, incentives: &[Incentive]) -> BatchSummary {
        info!(
            incentives = incentives.len(),
            concurrency = self.concurrency,
            "Starting batch"
        );

        let outcomes: Vec<_> = stream::iter(incentives)
            .map(|incentive| async move {
                (incentive.id, self.pipeline.process_incentive(incentive).await)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut summary = BatchSummary::default();
        for (incentive_id, outcome) in outcomes {
            match outcome {
                Ok(results) => match results.terminal_state {
                    TerminalState::Done => summary.done += 1,
                    TerminalState::Exhausted => summary.exhausted += 1,
                },
                Err(e) => {
                    error!(incentive_id, error = %e, "Incentive failed");
                    summary.failed.push((incentive_id, e.to_string()));
                }
            }
        }
        summary.failed.sort_by_key(|(id, _)| *id);

        let stats = self.pipeline.resolver().stats();
        info!(
            done = summary.done,
            exhausted = summary.exhausted,
            failed = summary.failed.len(),
            cache_hits = stats.cache_hits,
            provider_calls = stats.provider_calls,
            "Batch complete"
        );

        summary
    }
}
