use super::*;
use crate::model::{CandidateMatch, Company, EligibilityVerdict, GeoFit, LocationRecord};

fn candidate(company_id: u64, similarity: f32) -> CandidateMatch {
    CandidateMatch {
        incentive_id: 1,
        company_id,
        similarity,
        round: 0,
    }
}

fn eligible(company_id: u64, similarity: f32) -> EligibleCandidate {
    EligibleCandidate {
        candidate: candidate(company_id, similarity),
        company: Company {
            id: company_id,
            name: format!("Empresa {company_id}"),
            classification: String::new(),
            activities: String::new(),
            website: None,
            address_hint: None,
        },
        location: LocationRecord::found(company_id, "Porto", None, "test"),
        verdict: EligibilityVerdict::eligible(1, company_id, GeoFit::Inside, "inside"),
    }
}

fn pool(range: std::ops::Range<u64>) -> Vec<CandidateMatch> {
    range.map(|id| candidate(id, 1.0 - id as f32 / 100.0)).collect()
}

/// Drives one round with the given eligible ids among the new candidates.
fn round(
    run: &mut ExpansionRun,
    retrieved: Vec<CandidateMatch>,
    eligible_ids: &[u64],
) -> CheckOutcome {
    let fresh = run.accept_candidates(retrieved).unwrap();
    run.locations_resolved().unwrap();
    let evaluated = fresh.len();
    let found = fresh
        .iter()
        .filter(|c| eligible_ids.contains(&c.company_id))
        .map(|c| eligible(c.company_id, c.similarity))
        .collect();
    run.merge_verdicts(found, evaluated).unwrap();
    run.check().unwrap()
}

#[test]
fn test_config_default_and_validate() {
    let config = ExpansionConfig::default();
    assert_eq!(config.initial_candidates, 10);
    assert_eq!(config.max_rounds(), 5);
    assert!(config.validate().is_ok());

    let zero_step = ExpansionConfig {
        step: 0,
        ..Default::default()
    };
    assert!(zero_step.validate().is_err());

    let inverted = ExpansionConfig {
        initial_candidates: 60,
        ..Default::default()
    };
    assert!(inverted.validate().unwrap_err().contains("max_candidates"));
}

#[test]
fn test_max_rounds_rounds_up() {
    let config = ExpansionConfig {
        initial_candidates: 10,
        step: 15,
        max_candidates: 50,
        target_matches: 5,
    };
    assert_eq!(config.max_rounds(), 4);
}

#[test]
fn test_controller_rejects_invalid_config() {
    let err = ExpansionController::new(ExpansionConfig {
        target_matches: 0,
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, ExpansionError::InvalidConfig { .. }));
}

#[test]
fn test_done_in_first_round() {
    let mut run = ExpansionRun::new(1, ExpansionConfig::default());
    assert_eq!(run.begin().unwrap(), 10);

    let outcome = round(&mut run, pool(0..10), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(outcome, CheckOutcome::Done);
    assert_eq!(run.state(), ExpansionState::Done);

    let outcome = run.finish().unwrap();
    assert_eq!(outcome.terminal, TerminalState::Done);
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.eligible_found, 10);
    assert_eq!(outcome.selected.len(), 5);
    assert!(!outcome.fewer_than_target);
    let ids: Vec<_> = outcome.selected.iter().map(|e| e.company_id()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_expands_until_target() {
    let mut run = ExpansionRun::new(1, ExpansionConfig::default());
    run.begin().unwrap();

    assert_eq!(
        round(&mut run, pool(0..10), &[1, 4, 7]),
        CheckOutcome::Expand { next_size: 20 }
    );
    assert_eq!(run.candidate_size(), 20);
    assert_eq!(run.round(), 2);

    assert_eq!(round(&mut run, pool(0..20), &[12, 15]), CheckOutcome::Done);

    let outcome = run.finish().unwrap();
    assert_eq!(outcome.rounds, 2);
    assert_eq!(outcome.final_size, 20);
    assert_eq!(outcome.candidates_seen, 20);
    assert_eq!(outcome.candidates_evaluated, 20);
}

#[test]
fn test_only_new_candidates_are_returned() {
    let mut run = ExpansionRun::new(1, ExpansionConfig::default());
    run.begin().unwrap();
    round(&mut run, pool(0..10), &[]);

    let fresh = run.accept_candidates(pool(0..20)).unwrap();
    let ids: Vec<_> = fresh.iter().map(|c| c.company_id).collect();
    assert_eq!(ids, (10..20).collect::<Vec<_>>());
    assert!(fresh.iter().all(|c| c.round == 2));
}

#[test]
fn test_exhausted_at_cap() {
    let mut run = ExpansionRun::new(1, ExpansionConfig::default());
    run.begin().unwrap();

    let mut sizes = vec![run.candidate_size()];
    let mut outcome = round(&mut run, pool(0..10), &[3]);
    while let CheckOutcome::Expand { next_size } = outcome {
        sizes.push(next_size);
        outcome = round(&mut run, pool(0..next_size as u64), &[25, 41]);
    }

    assert_eq!(outcome, CheckOutcome::Exhausted);
    assert_eq!(sizes, vec![10, 20, 30, 40, 50]);

    let outcome = run.finish().unwrap();
    assert_eq!(outcome.terminal, TerminalState::Exhausted);
    assert_eq!(outcome.rounds, 5);
    assert_eq!(outcome.eligible_found, 3);
    assert_eq!(outcome.selected.len(), 3);
    assert!(outcome.fewer_than_target);
}

#[test]
fn test_exhausted_with_zero_eligible() {
    let config = ExpansionConfig {
        initial_candidates: 10,
        step: 10,
        max_candidates: 10,
        target_matches: 5,
    };
    let mut run = ExpansionRun::new(9, config);
    run.begin().unwrap();

    assert_eq!(round(&mut run, pool(0..10), &[]), CheckOutcome::Exhausted);

    let outcome = run.finish().unwrap();
    assert!(outcome.selected.is_empty());
    assert!(outcome.fewer_than_target);
}

#[test]
fn test_step_is_clamped_to_cap() {
    let config = ExpansionConfig {
        initial_candidates: 10,
        step: 15,
        max_candidates: 30,
        target_matches: 5,
    };
    let mut run = ExpansionRun::new(1, config);
    run.begin().unwrap();

    assert_eq!(
        round(&mut run, pool(0..10), &[]),
        CheckOutcome::Expand { next_size: 25 }
    );
    assert_eq!(
        round(&mut run, pool(0..25), &[]),
        CheckOutcome::Expand { next_size: 30 }
    );
    assert_eq!(round(&mut run, pool(0..30), &[]), CheckOutcome::Exhausted);
}

#[test]
fn test_ineligible_and_duplicate_entries_are_not_merged() {
    let mut run = ExpansionRun::new(1, ExpansionConfig::default());
    run.begin().unwrap();
    run.accept_candidates(pool(0..3)).unwrap();
    run.locations_resolved().unwrap();

    let mut rejected = eligible(2, 0.5);
    rejected.verdict = EligibilityVerdict::ineligible(1, 2, "outside");

    run.merge_verdicts(vec![eligible(1, 0.9), eligible(1, 0.9), rejected], 3)
        .unwrap();
    assert_eq!(run.eligible_count(), 1);
}

#[test]
fn test_selection_tie_breaks_on_company_id() {
    let config = ExpansionConfig {
        max_candidates: 10,
        ..Default::default()
    };
    let mut run = ExpansionRun::new(1, config);
    run.begin().unwrap();
    run.accept_candidates(vec![candidate(9, 0.8), candidate(3, 0.8), candidate(5, 0.9)])
        .unwrap();
    run.locations_resolved().unwrap();
    run.merge_verdicts(
        vec![eligible(9, 0.8), eligible(3, 0.8), eligible(5, 0.9)],
        3,
    )
    .unwrap();
    assert_eq!(run.check().unwrap(), CheckOutcome::Exhausted);

    let ids: Vec<_> = run
        .finish()
        .unwrap()
        .selected
        .iter()
        .map(|e| e.company_id())
        .collect();
    assert_eq!(ids, vec![5, 3, 9]);
}

#[test]
fn test_out_of_order_events_are_rejected() {
    let mut run = ExpansionRun::new(1, ExpansionConfig::default());

    let err = run.accept_candidates(vec![]).unwrap_err();
    assert!(matches!(
        err,
        ExpansionError::InvalidTransition {
            state: ExpansionState::Init,
            ..
        }
    ));

    run.begin().unwrap();
    assert!(run.check().is_err());
    assert!(run.begin().is_err());
    assert_eq!(run.state(), ExpansionState::Searching);

    assert!(run.finish().is_err());
}

#[test]
fn test_state_display() {
    assert_eq!(ExpansionState::Exhausted.to_string(), "EXHAUSTED");
    assert!(ExpansionState::Done.is_terminal());
    assert!(!ExpansionState::Check.is_terminal());
}
