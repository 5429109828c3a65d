use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::model::{Company, GeoFit, LocationRecord};

const INCENTIVE: u64 = 77;

fn company(id: u64) -> Company {
    Company {
        id,
        name: format!("Empresa {}", id),
        classification: String::new(),
        activities: String::new(),
        website: None,
        address_hint: None,
    }
}

fn located(id: u64, address: &str) -> (Company, LocationRecord) {
    (company(id), LocationRecord::found(id, address, None, "mock"))
}

fn filter(reasoner: Arc<MockReasoner>) -> EligibilityFilter {
    EligibilityFilter::new(reasoner, "Portugal", Duration::from_millis(200))
}

#[test]
fn test_national_markers() {
    for requirement in [
        "National",
        "nacional",
        "PORTUGAL",
        "Todo o País",
        "all regions",
        "Âmbito nacional",
        "Todo o território nacional",
    ] {
        assert!(is_national_requirement(requirement), "{requirement:?}");
    }

    for requirement in [
        "Norte",
        "Lisboa",
        "Portugal Continental",
        "Algarve e Alentejo",
        "Parque Nacional da Peneda-Gerês",
        "Rede Nacional de Áreas Protegidas do Algarve",
        "",
        "   ",
    ] {
        assert!(!is_national_requirement(requirement), "{requirement:?}");
    }
}

#[test]
fn test_build_prompt() {
    let prompt = build_prompt("Centro", "Portugal", &[(1, "Rua A, Coimbra"), (2, "Rua B, Faro")]);

    assert!(prompt.contains("Required area: Centro"));
    assert!(prompt.contains("Norte, Centro, Lisboa, Alentejo, Algarve, Açores, Madeira"));
    assert!(prompt.contains("1: Rua A, Coimbra\n2: Rua B, Faro"));
    assert!(prompt.contains("\"ambiguous\""));
}

#[test]
fn test_parse_structured_response() {
    let text = r#"Here you go:
    {"1": {"match": "inside", "rationale": "Coimbra is in Centro"},
     "2": {"match": "OUTSIDE", "rationale": "Faro is in Algarve"},
     "3": {"match": "partial"},
     "4": {"match": "ambiguous", "rationale": "two places named Lagoa"},
     "x": {"match": "inside"}}
    thanks"#;

    let matches = parse_response(text).unwrap();
    assert_eq!(matches.len(), 4);
    assert_eq!(
        matches[&1],
        GeoMatch::Inside {
            rationale: "Coimbra is in Centro".to_string()
        }
    );
    assert!(matches!(matches[&2], GeoMatch::Outside { .. }));
    assert!(matches!(matches[&3], GeoMatch::Partial { .. }));
    assert!(matches!(matches[&4], GeoMatch::Ambiguous { .. }));
}

#[test]
fn test_parse_boolean_response() {
    let matches = parse_response(r#"{"10": true, "Company 11": false, "12": "maybe"}"#).unwrap();

    assert_eq!(matches.len(), 2);
    assert!(matches!(matches[&10], GeoMatch::Inside { .. }));
    assert!(matches!(matches[&11], GeoMatch::Outside { .. }));
}

#[test]
fn test_parse_invalid_response() {
    assert!(matches!(
        parse_response("I cannot answer that."),
        Err(ReasonerError::InvalidResponse { .. })
    ));
    assert!(matches!(
        parse_response("} backwards {"),
        Err(ReasonerError::InvalidResponse { .. })
    ));
    assert!(matches!(
        parse_response("{not json}"),
        Err(ReasonerError::InvalidResponse { .. })
    ));
}

#[tokio::test]
async fn test_filter_maps_match_levels() {
    let reasoner = Arc::new(MockReasoner::fixed(
        r#"{"1": {"match": "inside", "rationale": "in Centro"},
            "2": {"match": "partial", "rationale": "border"},
            "3": {"match": "outside", "rationale": "Algarve"},
            "4": {"match": "ambiguous", "rationale": "Lagoa"}}"#,
    ));
    let candidates = vec![
        located(1, "Coimbra"),
        located(2, "Pombal"),
        located(3, "Faro"),
        located(4, "Lagoa"),
        located(5, "Leiria"),
    ];

    let verdicts = filter(reasoner.clone())
        .filter_batch(INCENTIVE, "Centro", &candidates)
        .await;

    assert_eq!(verdicts.len(), 5);
    assert!(verdicts[&1].eligible);
    assert_eq!(verdicts[&1].geo_fit, GeoFit::Inside);
    assert!(verdicts[&2].eligible);
    assert_eq!(verdicts[&2].geo_fit, GeoFit::Partial);
    assert!(!verdicts[&3].eligible);
    assert!(!verdicts[&4].eligible);
    assert!(verdicts[&4].rationale.starts_with("ambiguous"));
    // Omitted by the reasoner.
    assert!(!verdicts[&5].eligible);
    assert!(verdicts.values().all(|v| v.incentive_id == INCENTIVE));
    assert_eq!(reasoner.call_count(), 1);
}

#[tokio::test]
async fn test_filter_unresolved_never_reach_reasoner() {
    let reasoner = Arc::new(MockReasoner::fixed(r#"{"1": true}"#));
    let candidates = vec![
        located(1, "Braga"),
        (company(2), LocationRecord::not_found(2, "mock")),
        (company(3), LocationRecord::error(3, "mock", "timed out")),
    ];

    let verdicts = filter(reasoner.clone())
        .filter_batch(INCENTIVE, "Norte", &candidates)
        .await;

    assert_eq!(verdicts.len(), 3);
    assert!(verdicts[&1].eligible);
    assert!(!verdicts[&2].eligible);
    assert!(verdicts[&2].rationale.contains("not found"));
    assert!(!verdicts[&3].eligible);
    assert!(verdicts[&3].rationale.contains("timed out"));

    let prompts = reasoner.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(!prompts[0].contains("2: "));
    assert!(!prompts[0].contains("3: "));
}

#[tokio::test]
async fn test_filter_national_skips_reasoner() {
    let reasoner = Arc::new(MockReasoner::failing());
    let candidates = vec![
        located(1, "Porto"),
        located(2, "Funchal"),
        (company(3), LocationRecord::not_found(3, "mock")),
    ];

    let verdicts = filter(reasoner.clone())
        .filter_batch(INCENTIVE, "Nacional", &candidates)
        .await;

    assert!(verdicts[&1].eligible);
    assert_eq!(verdicts[&2].geo_fit, GeoFit::Inside);
    assert!(!verdicts[&3].eligible);
    assert_eq!(reasoner.call_count(), 0);
}

#[tokio::test]
async fn test_filter_named_national_area_uses_reasoner() {
    let reasoner = Arc::new(MockReasoner::fixed(
        r#"{"1": {"match": "outside", "rationale": "Lisboa is not in the park"}}"#,
    ));
    let candidates = vec![located(1, "Av. da Liberdade, Lisboa")];

    let verdicts = filter(reasoner.clone())
        .filter_batch(INCENTIVE, "Parque Nacional da Peneda-Gerês", &candidates)
        .await;

    assert!(!verdicts[&1].eligible);
    assert_eq!(verdicts[&1].geo_fit, GeoFit::Outside);
    assert_eq!(reasoner.call_count(), 1);
}

#[tokio::test]
async fn test_filter_blank_requirement_is_conservative() {
    let reasoner = Arc::new(MockReasoner::fixed(r#"{"1": true, "2": true}"#));
    let candidates = vec![located(1, "Porto"), located(2, "Faro")];

    let verdicts = filter(reasoner.clone())
        .filter_batch(INCENTIVE, "  ", &candidates)
        .await;

    assert_eq!(verdicts.len(), 2);
    assert!(verdicts.values().all(|v| !v.eligible));
    assert!(verdicts[&1].rationale.contains("no geographic requirement"));
    assert_eq!(reasoner.call_count(), 0);
}

#[tokio::test]
async fn test_filter_reasoner_failure_is_conservative() {
    let reasoner = Arc::new(MockReasoner::failing());
    let candidates = vec![located(1, "Evora"), located(2, "Beja")];

    let verdicts = filter(reasoner)
        .filter_batch(INCENTIVE, "Alentejo", &candidates)
        .await;

    assert_eq!(verdicts.len(), 2);
    assert!(verdicts.values().all(|v| !v.eligible));
    assert!(verdicts[&1].rationale.contains("eligibility check failed"));
}

#[tokio::test]
async fn test_filter_reasoner_timeout() {
    let reasoner =
        Arc::new(MockReasoner::fixed(r#"{"1": true}"#).with_delay(Duration::from_secs(30)));
    let filter = EligibilityFilter::new(reasoner, "Portugal", Duration::from_millis(20));

    let verdicts = filter
        .filter_batch(INCENTIVE, "Lisboa", &[located(1, "Sintra")])
        .await;

    assert!(!verdicts[&1].eligible);
    assert!(verdicts[&1].rationale.contains("timed out"));
}

#[tokio::test]
async fn test_filter_unparsable_response() {
    let reasoner = Arc::new(MockReasoner::fixed("All of them are in Lisboa."));

    let verdicts = filter(reasoner)
        .filter_batch(INCENTIVE, "Lisboa", &[located(1, "Oeiras")])
        .await;

    assert!(!verdicts[&1].eligible);
}

#[tokio::test]
async fn test_filter_duplicate_ids() {
    let reasoner = Arc::new(MockReasoner::fixed(r#"{"1": true}"#));
    let candidates = vec![located(1, "Guarda"), located(1, "Guarda")];

    let verdicts = filter(reasoner.clone())
        .filter_batch(INCENTIVE, "Centro", &candidates)
        .await;

    assert_eq!(verdicts.len(), 1);
    assert_eq!(reasoner.prompts()[0].matches("1: Guarda").count(), 1);
}
