//! Staff-side case management: interventions, status changes, and the
//! notification thread back to the reporter.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;

use crate::audit::{AuditLog, EventType};
use crate::model::{
    CaseStatus, ConflictCase, InterventionRecord, NotificationKind, RiskLevel, UserNotification,
    UserProfile,
};
use crate::store::DirectoryStore;
use uuid::Uuid;

/// Facade the staff dashboard drives.
pub struct CaseworkService<'a> {
    store: &'a DirectoryStore,
    audit: &'a AuditLog,
}

impl<'a> CaseworkService<'a> {
    pub fn new(store: &'a DirectoryStore, audit: &'a AuditLog) -> Self {
        Self { store, audit }
    }

    pub fn list_cases(&self) -> Result<Vec<ConflictCase>> {
        self.store.list_cases()
    }

    pub fn cases_with_status(&self, status: CaseStatus) -> Result<Vec<ConflictCase>> {
        Ok(self
            .store
            .list_cases()?
            .into_iter()
            .filter(|c| c.status == status)
            .collect())
    }

    pub fn cases_with_risk(&self, risk: RiskLevel) -> Result<Vec<ConflictCase>> {
        Ok(self
            .store
            .list_cases()?
            .into_iter()
            .filter(|c| c.risk_level == risk)
            .collect())
    }

    /// Appends an intervention record, moves the case to `new_status`, and
    /// notifies the reporter with a read-only update tied to the case.
    ///
    /// Interventions are history: they are never edited or removed, and the
    /// routing fields set at creation are left untouched.
    pub fn add_intervention(
        &self,
        case_id: &str,
        action_taken: &str,
        responsible: &str,
        new_status: CaseStatus,
        outcome: Option<String>,
    ) -> Result<ConflictCase> {
        let mut case = self
            .store
            .case_by_id(case_id)?
            .with_context(|| format!("Case {case_id} not found"))?;
        let mut record = InterventionRecord::new(action_taken, responsible);
        record.outcome = outcome;
        case.interventions.push(record);
        case.status = new_status;
        case.updated_at = Utc::now();
        self.store.save_case(&case)?;

        self.store.append_notification(
            &case.reporter_code,
            format!("Actualización de Caso #{}", case.id),
            format!(
                "Se ha registrado una nueva acción: \"{action_taken}\". El estado del caso es: {}.",
                new_status.label()
            ),
            NotificationKind::Info,
            Some(case.id.clone()),
        )?;
        self.audit.append(
            EventType::InterventionRecorded,
            json!({ "case_id": case.id, "responsible": responsible, "status": new_status }),
        )?;
        Ok(case)
    }

    /// Sends the reporter a question that expects an answer through
    /// `DirectoryStore::record_reply`. Returns `None` when the reporter
    /// profile no longer exists.
    pub fn request_information(
        &self,
        case_id: &str,
        message: &str,
    ) -> Result<Option<UserNotification>> {
        let case = self
            .store
            .case_by_id(case_id)?
            .with_context(|| format!("Case {case_id} not found"))?;
        let note = self.store.append_notification(
            &case.reporter_code,
            format!("Mensaje del Encargado - Caso #{}", case.id),
            message,
            NotificationKind::Request,
            Some(case.id.clone()),
        )?;
        if let Some(note) = &note {
            self.audit.append(
                EventType::NotificationSent,
                json!({ "case_id": case.id, "notification_id": note.id, "kind": note.kind }),
            )?;
        }
        Ok(note)
    }

    /// Records a reporter's answer to a pending request and audits it.
    pub fn record_reply(
        &self,
        code: &str,
        notification_id: &Uuid,
        text: &str,
    ) -> Result<Option<UserProfile>> {
        let updated = self.store.record_reply(code, notification_id, text)?;
        if updated.is_some() {
            self.audit.append(
                EventType::ReplyRecorded,
                json!({ "access_code": code, "notification_id": notification_id }),
            )?;
        }
        Ok(updated)
    }

    /// The notification thread of one case, newest first: every message sent
    /// to the reporter carrying this case id, whether read-only or awaiting a
    /// reply.
    pub fn case_thread(&self, case_id: &str) -> Result<Vec<UserNotification>> {
        let case = self
            .store
            .case_by_id(case_id)?
            .with_context(|| format!("Case {case_id} not found"))?;
        let Some(profile) = self.store.profile_by_code(&case.reporter_code)? else {
            return Ok(Vec::new());
        };
        Ok(profile
            .notifications
            .into_iter()
            .filter(|n| n.related_case_id.as_deref() == Some(case_id))
            .collect())
    }
}
