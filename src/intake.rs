//! Reporter-facing intake: authentication, the agent conversation, and the
//! hand-off that turns a finished conversation into an open case.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;

use crate::audit::{AuditLog, EventType};
use crate::classify::{
    classify_or_fallback, reply_or_fallback, ClassificationOutcome, ConflictClassifier,
};
use crate::model::{ChatMessage, ChatSender, ConflictCase, CaseStatus, UserProfile, UserRole};
use crate::store::{generate_access_code, DirectoryStore};
use crate::workflow::route;

/// Opening message of every intake conversation.
pub const WELCOME_MESSAGE: &str = "¡Hola! Soy tu Agente Escolar. Estoy aquí para escucharte en \
este espacio seguro.\n\nPara empezar, ¿cómo te gustaría que te llame y con qué género te \
identificas? (Por favor, elige un apodo o nombre ficticio; es preferible no usar tu nombre real \
completo por temas de anonimidad).";

/// Authenticates by access code (case-insensitive) and password.
///
/// No lockout or rate limiting is applied; both attempts and outcomes land in
/// the audit log instead.
pub fn login(
    store: &DirectoryStore,
    audit: &AuditLog,
    code: &str,
    password: &str,
) -> Result<Option<UserProfile>> {
    let profile = store
        .profile_by_code(code)?
        .filter(|p| p.verify_password(password));
    match &profile {
        Some(p) => {
            audit.append(
                EventType::LoginSucceeded,
                json!({ "access_code": p.access_code, "role": p.role }),
            )?;
        }
        None => {
            audit.append(EventType::LoginFailed, json!({ "access_code": code }))?;
        }
    }
    Ok(profile)
}

/// Creates a reporter account with a freshly generated access code.
pub fn register_reporter(
    store: &DirectoryStore,
    audit: &AuditLog,
    full_name: &str,
    role: UserRole,
    password: &str,
    grade: Option<String>,
) -> Result<UserProfile> {
    // Collisions are vanishingly rare; retry a couple of times before
    // surfacing the store's rejection.
    let mut last_err = None;
    for _ in 0..3 {
        let code = generate_access_code(role);
        let mut profile = UserProfile::new(full_name, code, password, role);
        profile.grade = grade.clone();
        match store.save_profile(&profile) {
            Ok(()) => {
                audit.append(
                    EventType::ProfileCreated,
                    json!({ "access_code": profile.access_code, "role": role }),
                )?;
                return Ok(profile);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.context("Failed to allocate a unique access code")?)
}

/// One reporter's conversation with the intake agent, from greeting to the
/// opened case.
pub struct IntakeSession<'a> {
    store: &'a DirectoryStore,
    classifier: &'a dyn ConflictClassifier,
    audit: &'a AuditLog,
    reporter: UserProfile,
    transcript: Vec<ChatMessage>,
}

impl<'a> IntakeSession<'a> {
    /// Starts a session with the agent's welcome message already on the
    /// transcript.
    pub fn begin(
        store: &'a DirectoryStore,
        classifier: &'a dyn ConflictClassifier,
        audit: &'a AuditLog,
        reporter: UserProfile,
    ) -> Self {
        let transcript = vec![ChatMessage::new(ChatSender::Agent, WELCOME_MESSAGE)];
        Self {
            store,
            classifier,
            audit,
            reporter,
            transcript,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn reporter(&self) -> &UserProfile {
        &self.reporter
    }

    /// Sends one reporter turn and returns the agent's continuation. Adapter
    /// failures degrade to a fixed apology line; the conversation never
    /// blocks on the external model.
    pub fn send(&mut self, text: impl Into<String>) -> String {
        let user_turn = ChatMessage::new(ChatSender::User, text);
        let agent_text = reply_or_fallback(self.classifier, &self.transcript, &user_turn.text);
        self.transcript.push(user_turn);
        self.transcript
            .push(ChatMessage::new(ChatSender::Agent, agent_text.clone()));
        agent_text
    }

    /// Classifies the transcript, routes the protocol, merges psychographics
    /// into the reporter profile, and opens the case.
    ///
    /// The case is created even when classification degrades to the
    /// manual-review fallback; degradation is audited and returned alongside
    /// the case so callers can tell the two apart.
    pub fn finalize(&mut self) -> Result<(ConflictCase, ClassificationOutcome)> {
        let outcome = classify_or_fallback(self.classifier, &self.transcript);
        if let ClassificationOutcome::Degraded { reason, .. } = &outcome {
            self.audit.append(
                EventType::ClassificationDegraded,
                json!({ "access_code": self.reporter.access_code, "reason": reason }),
            )?;
        }
        let classification = outcome.result();

        // The manual pins risk to typology for real classifications; the
        // degraded fallback keeps its Medium override so the case lands in
        // front of staff for manual triage.
        let risk_level = match &outcome {
            ClassificationOutcome::Classified(result) => result.typology.canonical_risk(),
            ClassificationOutcome::Degraded { result, .. } => result.risk_level,
        };

        let assignment = route(risk_level, classification.typology);

        self.reporter.psychographics = Some(classification.psychographics.clone());
        self.store.save_profile(&self.reporter)?;

        let now = Utc::now();
        let case = ConflictCase {
            id: ConflictCase::generate_id(),
            reporter_code: self.reporter.access_code.clone(),
            reporter_role: self.reporter.role,
            created_at: now,
            updated_at: now,
            status: CaseStatus::Open,
            typology: classification.typology.label().to_string(),
            risk_level,
            summary: classification.summary.clone(),
            recommendations: classification.recommendations.clone(),
            assigned_protocol: assignment.protocol,
            assigned_to: assignment.assigned_to,
            route_description: assignment.route_description,
            messages: self.transcript.clone(),
            interventions: Vec::new(),
        };
        self.store.save_case(&case)?;
        self.audit.append(
            EventType::CaseOpened,
            json!({
                "case_id": case.id,
                "typology": case.typology,
                "risk_level": case.risk_level,
                "protocol": case.assigned_protocol,
                "degraded": outcome.is_degraded(),
            }),
        )?;
        Ok((case, outcome))
    }
}
