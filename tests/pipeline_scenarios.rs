//! End-to-end matching runs against in-memory collaborators.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fixtures::{HarnessBuilder, NORTE_CITIES, company, incentive, region_reasoner};
use fundmatch::eligibility::MockReasoner;
use fundmatch::expansion::TerminalState;
use fundmatch::location::{DiskLocationCache, LocationCache, MockBehavior};
use fundmatch::results::ResultStore;
use tempfile::TempDir;

#[tokio::test]
async fn test_national_incentive_finishes_in_one_round() {
    let harness = HarnessBuilder::new(region_reasoner(NORTE_CITIES))
        .companies_in(1, 30, "Lisboa")
        .build();

    let results = harness
        .pipeline
        .process_incentive(&incentive(1, "Nacional"))
        .await
        .unwrap();

    assert_eq!(results.terminal_state, TerminalState::Done);
    assert_eq!(results.rounds, 1);
    assert_eq!(results.candidates_searched, 10);
    assert_eq!(results.composite_ranking.len(), 5);
    assert_eq!(results.semantic_ranking.len(), 5);
    assert!(!results.fewer_than_target);
    assert_eq!(harness.reasoner.call_count(), 0);
    assert_eq!(harness.geocoder.total_calls(), 10);
    assert_eq!(harness.store.load(1).await.unwrap(), Some(results));
}

#[tokio::test]
async fn test_regional_incentive_expands_once() {
    // Three Norte companies among the first ten, two more among the next ten.
    let harness = HarnessBuilder::new(region_reasoner(NORTE_CITIES))
        .companies_in(1, 3, "Porto")
        .companies_in(4, 7, "Lisboa")
        .companies_in(11, 2, "Braga")
        .companies_in(13, 20, "Faro")
        .build();

    let results = harness
        .pipeline
        .process_incentive(&incentive(2, "Norte"))
        .await
        .unwrap();

    assert_eq!(results.terminal_state, TerminalState::Done);
    assert_eq!(results.rounds, 2);
    assert_eq!(results.candidates_searched, 20);
    assert_eq!(results.eligible_count, 5);
    assert_eq!(harness.reasoner.call_count(), 2);

    let mut ids: Vec<u64> = results
        .composite_ranking
        .iter()
        .map(|r| r.company_id)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 11, 12]);

    // Round two only geocodes the ten new candidates.
    assert_eq!(harness.geocoder.total_calls(), 20);
    for id in 1..=20 {
        assert_eq!(harness.geocoder.calls_for(id), 1, "company {}", id);
    }
}

#[tokio::test]
async fn test_shared_company_geocoded_once_across_incentives() {
    let harness = HarnessBuilder::new(region_reasoner(NORTE_CITIES))
        .companies_in(1, 10, "Porto")
        .build();

    let first = harness
        .pipeline
        .process_incentive(&incentive(1, "Nacional"))
        .await
        .unwrap();
    let second = harness
        .pipeline
        .process_incentive(&incentive(2, "Norte"))
        .await
        .unwrap();

    assert_eq!(first.terminal_state, TerminalState::Done);
    assert_eq!(second.terminal_state, TerminalState::Done);
    assert_eq!(harness.geocoder.total_calls(), 10);
    let stats = harness.resolver.stats();
    assert_eq!(stats.cache_hits, 10);
    assert_eq!(stats.cache_misses, 10);
}

#[tokio::test]
async fn test_hanging_geocoder_does_not_stall_run() {
    let harness = HarnessBuilder::new(region_reasoner(NORTE_CITIES))
        .company(company(1), 0.99, MockBehavior::Hang(Duration::from_secs(30)))
        .companies_in(2, 9, "Porto")
        .build();

    let results = tokio::time::timeout(
        Duration::from_secs(5),
        harness.pipeline.process_incentive(&incentive(3, "Norte")),
    )
    .await
    .expect("run finished before the outer timeout")
    .unwrap();

    assert_eq!(results.terminal_state, TerminalState::Done);
    assert!(results.composite_ranking.iter().all(|r| r.company_id != 1));
    assert_eq!(harness.resolver.stats().errors, 1);
    // Timed-out lookups are not cached.
    assert!(harness.cache.get(1).unwrap().is_none());
}

#[tokio::test]
async fn test_sparse_region_exhausts_pool() {
    let harness = HarnessBuilder::new(region_reasoner(NORTE_CITIES))
        .companies_in(1, 4, "Lisboa")
        .companies_in(5, 1, "Porto")
        .companies_in(6, 19, "Lisboa")
        .companies_in(25, 1, "Braga")
        .companies_in(26, 19, "Faro")
        .companies_in(45, 1, "Guimaraes")
        .companies_in(46, 5, "Faro")
        .build();

    let results = harness
        .pipeline
        .process_incentive(&incentive(4, "Norte"))
        .await
        .unwrap();

    assert_eq!(results.terminal_state, TerminalState::Exhausted);
    assert!(results.fewer_than_target);
    assert_eq!(results.rounds, 5);
    assert_eq!(results.candidates_searched, 50);
    assert_eq!(results.eligible_count, 3);
    assert_eq!(results.composite_ranking.len(), 3);
    assert_eq!(harness.reasoner.call_count(), 5);
    assert_eq!(harness.geocoder.total_calls(), 50);
}

#[tokio::test]
async fn test_disk_cache_survives_restart() {
    let dir = TempDir::new().unwrap();

    let first_cache: Arc<dyn LocationCache> =
        Arc::new(DiskLocationCache::open(dir.path(), 64).unwrap());
    let first = HarnessBuilder::new(MockReasoner::failing())
        .companies_in(1, 10, "Porto")
        .cache(first_cache)
        .build();
    first
        .pipeline
        .process_incentive(&incentive(1, "Nacional"))
        .await
        .unwrap();
    assert_eq!(first.geocoder.total_calls(), 10);

    let reopened: Arc<dyn LocationCache> =
        Arc::new(DiskLocationCache::open(dir.path(), 64).unwrap());
    assert_eq!(reopened.len().unwrap(), 10);
    let second = HarnessBuilder::new(MockReasoner::failing())
        .companies_in(1, 10, "Porto")
        .cache(reopened)
        .build();
    let results = second
        .pipeline
        .process_incentive(&incentive(1, "Nacional"))
        .await
        .unwrap();

    assert_eq!(second.geocoder.total_calls(), 0);
    assert_eq!(results.composite_ranking.len(), 5);
}

#[tokio::test]
async fn test_scores_are_bounded() {
    let harness = HarnessBuilder::new(region_reasoner(NORTE_CITIES))
        .companies_in(1, 20, "Braga")
        .build();

    let results = harness
        .pipeline
        .process_incentive(&incentive(5, "Norte"))
        .await
        .unwrap();

    for ranked in results
        .composite_ranking
        .iter()
        .chain(results.semantic_ranking.iter())
    {
        assert!((0.0..=1.0).contains(&ranked.score), "{:?}", ranked);
        assert!((0.0..=1.0).contains(&ranked.semantic_score), "{:?}", ranked);
    }
    let ranks: Vec<u32> = results.composite_ranking.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_identical_runs_rank_identically() {
    let run = || async {
        let harness = HarnessBuilder::new(region_reasoner(NORTE_CITIES))
            .companies_in(1, 6, "Porto")
            .companies_in(7, 14, "Lisboa")
            .build();
        harness
            .pipeline
            .process_incentive(&incentive(6, "Norte"))
            .await
            .unwrap()
    };

    let a = run().await;
    let b = run().await;

    assert_eq!(a.composite_ranking, b.composite_ranking);
    assert_eq!(a.semantic_ranking, b.semantic_ranking);
    assert_eq!(a.rounds, b.rounds);
}

#[tokio::test]
async fn test_retrieval_failure_aborts_without_persisting() {
    let harness = HarnessBuilder::new(region_reasoner(NORTE_CITIES))
        .companies_in(1, 10, "Porto")
        .build();
    harness.index.set_unavailable(true);

    let result = harness
        .pipeline
        .process_incentive(&incentive(7, "Norte"))
        .await;

    assert!(result.is_err());
    assert!(harness.store.is_empty());
    assert_eq!(harness.geocoder.total_calls(), 0);
}

#[tokio::test]
async fn test_reasoner_failure_marks_companies_ineligible() {
    let harness = HarnessBuilder::new(MockReasoner::failing())
        .companies_in(1, 50, "Porto")
        .build();

    let results = harness
        .pipeline
        .process_incentive(&incentive(8, "Norte"))
        .await
        .unwrap();

    assert_eq!(results.terminal_state, TerminalState::Exhausted);
    assert_eq!(results.eligible_count, 0);
    assert!(results.composite_ranking.is_empty());
    assert!(results.semantic_ranking.is_empty());
    assert_eq!(harness.reasoner.call_count(), 5);
    // Geocoded locations are still cached for later incentives.
    assert_eq!(harness.cache.len().unwrap(), 50);
}
