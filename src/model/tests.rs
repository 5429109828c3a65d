use super::*;
use rkyv::rancor::Error;
use rkyv::{access, from_bytes, to_bytes};

fn company(website: Option<&str>) -> Company {
    Company {
        id: 7,
        name: "Metalurgica do Norte, Lda".to_string(),
        classification: "25110 Fabricacao de estruturas metalicas".to_string(),
        activities: "Serralharia civil e estruturas".to_string(),
        website: website.map(str::to_string),
        address_hint: None,
    }
}

#[test]
fn test_has_website() {
    assert!(company(Some("https://example.pt")).has_website());
    assert!(!company(None).has_website());
    assert!(!company(Some("")).has_website());
    assert!(!company(Some("  N/A ")).has_website());
}

#[test]
fn test_rerank_text_skips_empty_parts() {
    let mut c = company(None);
    c.classification = String::new();

    assert_eq!(
        c.rerank_text(),
        "Metalurgica do Norte, Lda Serralharia civil e estruturas"
    );
}

#[test]
fn test_activity_snippet_truncates_on_char_boundary() {
    let mut c = company(None);
    c.activities = "ação".repeat(100);

    let snippet = c.activity_snippet(10);
    assert_eq!(snippet.chars().count(), 13);
    assert!(snippet.ends_with("..."));

    c.activities = "curto".to_string();
    assert_eq!(c.activity_snippet(200), "curto");
}

#[test]
fn test_incentive_texts() {
    let incentive = Incentive {
        id: 1,
        title: "Apoio a PME".to_string(),
        sector: "Industria".to_string(),
        description: None,
        geo_requirement: "Norte".to_string(),
        eligible_actions: vec!["Digitalizacao".to_string(), " ".to_string()],
        total_budget: Some(1_000_000.0),
    };

    assert_eq!(incentive.sector_text(), "Industria Digitalizacao");
    assert_eq!(incentive.direction_text(), "Apoio a PME Industria Digitalizacao");
}

#[test]
fn test_incentive_json_defaults() {
    let incentive: Incentive = serde_json::from_str(r#"{"id": 3, "title": "T"}"#).unwrap();

    assert!(incentive.sector.is_empty());
    assert!(incentive.geo_requirement.is_empty());
    assert!(incentive.eligible_actions.is_empty());
    assert!(incentive.total_budget.is_none());
}

#[test]
fn test_geo_fit_values() {
    assert_eq!(GeoFit::Inside.value(), 1.0);
    assert_eq!(GeoFit::Partial.value(), 0.5);
    assert_eq!(GeoFit::Outside.value(), 0.0);
}

#[test]
fn test_verdict_constructors() {
    let v = EligibilityVerdict::eligible(1, 2, GeoFit::Partial, "border");
    assert!(v.eligible);

    let v = EligibilityVerdict::ineligible(1, 2, "outside");
    assert!(!v.eligible);
    assert_eq!(v.geo_fit, GeoFit::Outside);
}

#[test]
fn test_location_record_status_helpers() {
    let found = LocationRecord::found(1, "Rua A, Porto", Some((41.1, -8.6)), "test");
    assert!(found.is_resolved());
    assert!(found.is_cacheable());
    assert_eq!(found.coordinates(), Some((41.1, -8.6)));

    let cached = found.clone().into_cached();
    assert_eq!(cached.status, ResolutionStatus::ResolvedCached);
    assert_eq!(cached.for_storage().status, ResolutionStatus::ResolvedFresh);

    let missing = LocationRecord::not_found(2, "test");
    assert!(!missing.is_resolved());
    assert!(missing.is_cacheable());

    let failed = LocationRecord::error(3, "test", "timeout");
    assert!(!failed.is_resolved());
    assert!(!failed.is_cacheable());
    assert_eq!(failed.detail.as_deref(), Some("timeout"));
}

#[test]
fn test_location_record_blank_address_is_unresolved() {
    let record = LocationRecord::found(1, "  ", None, "test");
    assert!(!record.is_resolved());
}

#[test]
fn test_location_record_rkyv_archive() {
    let record = LocationRecord::found(42, "Av. da Liberdade, Lisboa", None, "google_places");

    let bytes = to_bytes::<Error>(&record).expect("serialization should succeed");
    let archived =
        access::<ArchivedLocationRecord, Error>(&bytes).expect("archive access should succeed");
    assert_eq!(archived.company_id, record.company_id);

    let restored: LocationRecord =
        from_bytes::<LocationRecord, Error>(&bytes).expect("deserialization should succeed");
    assert_eq!(restored, record);
}

#[test]
fn test_resolution_status_display() {
    assert_eq!(ResolutionStatus::ResolvedCached.to_string(), "resolved-cached");
    assert_eq!(
        serde_json::to_string(&ResolutionStatus::NotFound).unwrap(),
        "\"not_found\""
    );
}
