use super::support::{bullying_classification, ScriptedClassifier};
use super::IntegrationHarness;
use anyhow::Result;
use cuentame::casework::CaseworkService;
use cuentame::classify::{ClassificationOutcome, ClassificationResult, Typology};
use cuentame::intake::{login, IntakeSession};
use cuentame::model::{
    CaseStatus, NotificationKind, ProtocolTrack, RiskLevel, UserProfile, UserRole,
};
use cuentame::reports::ClosureReportService;

#[test]
fn full_reporting_flow_from_login_to_closure() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let audit = harness.audit();

    let profile = UserProfile::new("Estudiante Prueba", "EST-TEST", "123", UserRole::Student);
    store.save_profile(&profile)?;

    let reporter = login(&store, &audit, "EST-TEST", "123")?.expect("login succeeds");

    // The scripted adapter claims High risk for bullying; the manual's
    // typology table must win at case creation.
    let classifier = ScriptedClassifier::new(
        ["¿Puedes contarme más sobre lo que pasa?"],
        bullying_classification(),
    );
    let mut session = IntakeSession::begin(&store, &classifier, &audit, reporter);
    let reply = session.send("Unos compañeros me molestan todos los días en clase.");
    assert_eq!(reply, "¿Puedes contarme más sobre lo que pasa?");
    assert_eq!(session.transcript().len(), 3);

    let (case, outcome) = session.finalize()?;
    assert!(matches!(outcome, ClassificationOutcome::Classified(_)));
    assert_eq!(case.typology, Typology::Bullying.label());
    assert_eq!(case.risk_level, RiskLevel::Medium);
    assert_eq!(case.assigned_protocol, ProtocolTrack::Direction);
    assert!(case.assigned_to.contains("Dirección"));
    assert_eq!(case.status, CaseStatus::Open);
    assert_eq!(case.messages.len(), 3);
    assert!(case.interventions.is_empty());

    // Psychographics detected during intake land on the reporter profile.
    let enriched = store.profile_by_code("EST-TEST")?.unwrap();
    let tags = enriched.psychographics.expect("psychographics merged");
    assert_eq!(tags.interests, vec!["dibujo"]);

    // Staff records one intervention and closes through the report.
    let casework = CaseworkService::new(&store, &audit);
    let updated = casework.add_intervention(
        &case.id,
        "Entrevista inicial con el estudiante",
        "Psicóloga Escolar",
        CaseStatus::InProgress,
        None,
    )?;
    assert_eq!(updated.interventions.len(), 1);

    let reports = ClosureReportService::new(&store, &harness.paths, &audit);
    let report = reports.generate(&case.id)?;
    assert!(report.path.exists());

    let closed = store.case_by_id(&case.id)?.unwrap();
    assert_eq!(closed.status, CaseStatus::Closed);
    assert_eq!(closed.interventions.len(), 1);

    // The reporter's inbox threads both updates under the case id.
    let inbox = store.profile_by_code("EST-TEST")?.unwrap().notifications;
    let thread: Vec<_> = inbox
        .iter()
        .filter(|n| n.related_case_id.as_deref() == Some(case.id.as_str()))
        .collect();
    assert_eq!(thread.len(), 2);
    assert!(thread.iter().all(|n| n.kind == NotificationKind::Info));
    Ok(())
}

#[test]
fn adapter_failure_still_opens_a_manual_review_case() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let audit = harness.audit();

    let profile = UserProfile::new("Estudiante Prueba", "EST-TEST", "123", UserRole::Student);
    store.save_profile(&profile)?;
    let reporter = login(&store, &audit, "est-test", "123")?.unwrap();

    let classifier = ScriptedClassifier::failing();
    let mut session = IntakeSession::begin(&store, &classifier, &audit, reporter);
    let reply = session.send("Necesito ayuda.");
    assert_eq!(reply, cuentame::classify::CHAT_FALLBACK_REPLY);

    let (case, outcome) = session.finalize()?;
    assert!(outcome.is_degraded());
    assert_eq!(case.typology, Typology::MinorPeerConflict.label());
    // The degraded fallback keeps its Medium override to force staff triage.
    assert_eq!(case.risk_level, RiskLevel::Medium);
    assert_eq!(case.assigned_protocol, ProtocolTrack::Direction);
    assert!(case.summary.contains("Revisión manual"));
    assert_eq!(store.list_cases()?.len(), 1);

    let degraded_events = audit
        .read_all()?
        .into_iter()
        .filter(|e| e.event_type == cuentame::audit::EventType::ClassificationDegraded)
        .count();
    assert_eq!(degraded_events, 1);
    Ok(())
}

#[test]
fn dashboard_filters_select_exactly_the_matching_cases() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let audit = harness.audit();

    let profile = UserProfile::new("Estudiante Prueba", "EST-TEST", "123", UserRole::Student);
    store.save_profile(&profile)?;
    let reporter = login(&store, &audit, "EST-TEST", "123")?.unwrap();

    let classifier = ScriptedClassifier::new([], bullying_classification());
    let mut session = IntakeSession::begin(&store, &classifier, &audit, reporter.clone());
    session.send("Me molestan en clase.");
    let (bullying_case, _) = session.finalize()?;

    let critical = ClassificationResult {
        typology: Typology::SuicidalIdeation,
        risk_level: RiskLevel::Critical,
        summary: "Expresiones de autolesión recientes.".into(),
        recommendations: vec!["Activar equipo de crisis".into()],
        psychographics: Default::default(),
    };
    let classifier = ScriptedClassifier::new([], critical);
    let mut session = IntakeSession::begin(&store, &classifier, &audit, reporter);
    session.send("Ya no quiero seguir.");
    let (critical_case, _) = session.finalize()?;

    let casework = CaseworkService::new(&store, &audit);
    casework.add_intervention(
        &critical_case.id,
        "Contención inmediata",
        "Psicóloga Escolar",
        CaseStatus::InProgress,
        None,
    )?;

    let open = casework.cases_with_status(CaseStatus::Open)?;
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, bullying_case.id);

    let in_progress = casework.cases_with_status(CaseStatus::InProgress)?;
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].id, critical_case.id);

    let medium = casework.cases_with_risk(RiskLevel::Medium)?;
    assert_eq!(medium.len(), 1);
    assert_eq!(medium[0].id, bullying_case.id);

    let critical_cases = casework.cases_with_risk(RiskLevel::Critical)?;
    assert_eq!(critical_cases.len(), 1);
    assert_eq!(critical_cases[0].id, critical_case.id);
    Ok(())
}

#[test]
fn staff_request_reaches_the_reporter_and_accepts_a_reply() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let audit = harness.audit();

    let profile = UserProfile::new("Estudiante Prueba", "EST-TEST", "123", UserRole::Student);
    store.save_profile(&profile)?;
    let reporter = login(&store, &audit, "EST-TEST", "123")?.unwrap();

    let classifier = ScriptedClassifier::new([], bullying_classification());
    let mut session = IntakeSession::begin(&store, &classifier, &audit, reporter);
    session.send("Me molestan en el recreo.");
    let (case, _) = session.finalize()?;

    let casework = CaseworkService::new(&store, &audit);
    let request = casework
        .request_information(&case.id, "¿Podrías indicar en qué horario ocurre?")?
        .expect("reporter profile exists");
    assert_eq!(request.kind, NotificationKind::Request);

    let updated = casework
        .record_reply("EST-TEST", &request.id, "Siempre en el segundo recreo.")?
        .expect("reply recorded");
    let answered = updated
        .notifications
        .iter()
        .find(|n| n.id == request.id)
        .unwrap();
    assert!(answered.read);
    assert_eq!(
        answered.reply.as_deref(),
        Some("Siempre en el segundo recreo.")
    );

    let thread = casework.case_thread(&case.id)?;
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].id, request.id);
    Ok(())
}
