use super::IntegrationHarness;
use anyhow::Result;
use chrono::Utc;
use cuentame::model::{
    CaseStatus, ConflictCase, ProtocolTrack, RiskLevel, UserProfile, UserRole,
};
use std::fs;

fn sample_case(code: &str) -> ConflictCase {
    let now = Utc::now();
    ConflictCase {
        id: ConflictCase::generate_id(),
        reporter_code: code.into(),
        reporter_role: UserRole::Student,
        created_at: now,
        updated_at: now,
        status: CaseStatus::Open,
        typology: "Conflicto leve entre pares".into(),
        risk_level: RiskLevel::Low,
        summary: "Desacuerdo puntual entre compañeros.".into(),
        recommendations: Vec::new(),
        assigned_protocol: ProtocolTrack::Tutoring,
        assigned_to: "DECE (Psicólogo Educativo)".into(),
        route_description: "Ruta: DECE + Seguimiento interno".into(),
        messages: Vec::new(),
        interventions: Vec::new(),
    }
}

#[test]
fn profile_round_trips_by_code_case_insensitively() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();

    let mut profile = UserProfile::new("Estudiante Demo", "EST-2024-A", "123", UserRole::Student);
    profile.grade = Some("10".into());
    store.save_profile(&profile)?;

    let found = store.profile_by_code("est-2024-a")?.expect("profile lookup");
    assert_eq!(found, profile);
    assert!(store.profile_by_code("EST-2024-Z")?.is_none());
    Ok(())
}

#[test]
fn save_profile_upsert_is_idempotent() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();

    let mut profile = UserProfile::new("Padre Demo", "FAM-2024-B", "123", UserRole::Parent);
    store.save_profile(&profile)?;
    store.save_profile(&profile)?;
    assert_eq!(store.list_profiles()?.len(), 1);

    profile.phone = "555-0000".into();
    store.save_profile(&profile)?;
    let profiles = store.list_profiles()?;
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].phone, "555-0000");
    Ok(())
}

#[test]
fn duplicate_access_codes_are_rejected() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();

    let first = UserProfile::new("Estudiante Uno", "EST-2024-A", "123", UserRole::Student);
    store.save_profile(&first)?;

    let clash = UserProfile::new("Estudiante Dos", "est-2024-a", "456", UserRole::Student);
    let err = store.save_profile(&clash).unwrap_err();
    assert!(err.to_string().contains("already assigned"));
    assert_eq!(store.list_profiles()?.len(), 1);
    Ok(())
}

#[test]
fn case_round_trips_and_upserts_by_id() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();

    let mut case = sample_case("EST-2024-A");
    store.save_case(&case)?;
    store.save_case(&case)?;
    assert_eq!(store.list_cases()?.len(), 1);
    assert_eq!(store.case_by_id(&case.id)?.as_ref(), Some(&case));

    case.status = CaseStatus::InProgress;
    store.save_case(&case)?;
    let stored = store.case_by_id(&case.id)?.expect("case lookup");
    assert_eq!(stored.status, CaseStatus::InProgress);
    assert_eq!(store.list_cases()?.len(), 1);

    assert_eq!(store.cases_by_code("est-2024-a")?.len(), 1);
    assert!(store.cases_by_code("FAM-2024-B")?.is_empty());
    Ok(())
}

#[test]
fn demo_accounts_seed_only_on_first_initialization() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store_with_seed(true);
    assert_eq!(store.list_profiles()?.len(), 5);
    assert!(store.profile_by_code("ADM-MASTER")?.is_some());

    // Wiping the collection and reopening must not re-seed.
    let store = harness.store_with_seed(true);
    let mut profiles = store.list_profiles()?;
    let keep = profiles.remove(0);
    fs::write(
        harness.paths.profiles_path(),
        serde_json::to_vec_pretty(&[&keep])?,
    )?;
    let store = harness.store_with_seed(true);
    assert_eq!(store.list_profiles()?.len(), 1);
    Ok(())
}

#[test]
fn corrupt_collection_surfaces_an_error() {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    fs::write(harness.paths.profiles_path(), b"{not json").unwrap();
    let err = store.list_profiles().unwrap_err();
    assert!(err.to_string().contains("parse"));
}

#[test]
fn missing_collection_reads_as_empty() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    assert!(store.list_profiles()?.is_empty());
    assert!(store.list_cases()?.is_empty());
    Ok(())
}
