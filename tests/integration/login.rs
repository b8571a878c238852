use super::IntegrationHarness;
use anyhow::Result;
use cuentame::audit::EventType;
use cuentame::intake::{login, register_reporter};
use cuentame::model::{UserProfile, UserRole};

#[test]
fn login_requires_matching_code_and_password() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let audit = harness.audit();

    let profile = UserProfile::new("Estudiante Demo", "EST-2024-A", "123", UserRole::Student);
    store.save_profile(&profile)?;

    // Code matching is case-insensitive; password matching is exact.
    assert!(login(&store, &audit, "est-2024-a", "123")?.is_some());
    assert!(login(&store, &audit, "EST-2024-A", "123")?.is_some());
    assert!(login(&store, &audit, "EST-2024-A", "1234")?.is_none());
    assert!(login(&store, &audit, "EST-2024-A", "123 ")?.is_none());
    assert!(login(&store, &audit, "EST-2024-B", "123")?.is_none());

    let events = audit.read_all()?;
    let succeeded = events
        .iter()
        .filter(|e| e.event_type == EventType::LoginSucceeded)
        .count();
    let failed = events
        .iter()
        .filter(|e| e.event_type == EventType::LoginFailed)
        .count();
    assert_eq!(succeeded, 2);
    assert_eq!(failed, 3);
    Ok(())
}

#[test]
fn registered_reporters_can_log_in_with_their_generated_code() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let audit = harness.audit();

    let profile = register_reporter(
        &store,
        &audit,
        "Nuevo Estudiante",
        UserRole::Student,
        "s3creta",
        Some("9".into()),
    )?;
    assert!(profile.access_code.starts_with("EST-"));

    let logged_in = login(&store, &audit, &profile.access_code.to_lowercase(), "s3creta")?
        .expect("registered reporter can log in");
    assert_eq!(logged_in.id, profile.id);
    assert_eq!(logged_in.grade.as_deref(), Some("9"));
    Ok(())
}
