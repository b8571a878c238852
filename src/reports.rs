//! Closure report generation (the end of a case's life).
//!
//! The report is the one place the two collections are joined: it
//! de-anonymizes the reporter for the institutional record. The section
//! order is a contract with downstream audit — profile, conflict detail,
//! recommendations, transcript, interventions — and must stay complete.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

use crate::audit::{AuditLog, EventType};
use crate::config::WorkspacePaths;
use crate::model::{CaseStatus, ChatSender, ConflictCase, NotificationKind, UserProfile};
use crate::store::DirectoryStore;

/// Outcome of generating a closure report.
#[derive(Debug, Clone)]
pub struct ClosureReport {
    pub case_id: String,
    pub audit_code: String,
    pub generated_at: DateTime<Utc>,
    pub path: PathBuf,
    pub document: String,
}

/// Builds closure reports and performs the closure side effects.
pub struct ClosureReportService<'a> {
    store: &'a DirectoryStore,
    paths: &'a WorkspacePaths,
    audit: &'a AuditLog,
}

impl<'a> ClosureReportService<'a> {
    pub fn new(store: &'a DirectoryStore, paths: &'a WorkspacePaths, audit: &'a AuditLog) -> Self {
        Self {
            store,
            paths,
            audit,
        }
    }

    /// Renders and writes the confidential closure report for a case,
    /// transitioning it to `Closed` (the only automatic status transition in
    /// the system) and notifying the reporter.
    ///
    /// A reporter profile that cannot be de-anonymized is a hard error; an
    /// incomplete institutional record must never be produced silently.
    pub fn generate(&self, case_id: &str) -> Result<ClosureReport> {
        let mut case = self
            .store
            .case_by_id(case_id)?
            .with_context(|| format!("Case {case_id} not found"))?;
        let profile = self
            .store
            .profile_by_code(&case.reporter_code)?
            .with_context(|| {
                format!("Cannot de-anonymize reporter {} for the report", case.reporter_code)
            })?;

        let generated_at = Utc::now();
        let body = render_report_body(&case, &profile);
        let audit_code = audit_code_for(&body);
        let document = format!(
            "INFORME CONFIDENCIAL DE CIERRE - CUÉNTAME\n\
             ID Caso: {}\n\
             Código Auditoría: {}\n\
             Fecha Generación: {}\n\n{}",
            case.id,
            audit_code,
            generated_at.format("%Y-%m-%d %H:%M UTC"),
            body
        );

        fs::create_dir_all(&self.paths.reports_dir)?;
        let path = self
            .paths
            .reports_dir
            .join(format!("Informe_Cierre_{}.txt", case.id));
        fs::write(&path, &document)
            .with_context(|| format!("Failed to write closure report {:?}", path))?;

        if case.status != CaseStatus::Closed {
            case.status = CaseStatus::Closed;
            case.updated_at = generated_at;
            self.store.save_case(&case)?;
            self.store.append_notification(
                &case.reporter_code,
                format!("Caso Cerrado #{}", case.id),
                "El protocolo ha finalizado y el caso se ha marcado como CERRADO.",
                NotificationKind::Info,
                Some(case.id.clone()),
            )?;
            self.audit
                .append(EventType::CaseClosed, json!({ "case_id": case.id }))?;
        }
        self.audit.append(
            EventType::ReportGenerated,
            json!({ "case_id": case.id, "audit_code": audit_code, "path": path }),
        )?;

        Ok(ClosureReport {
            case_id: case.id,
            audit_code,
            generated_at,
            path,
            document,
        })
    }
}

/// Renders the five contract sections in their required relative order.
fn render_report_body(case: &ConflictCase, profile: &UserProfile) -> String {
    let mut out = String::new();

    out.push_str("1. Perfil del Estudiante (Desanonimizado)\n");
    out.push_str(&format!("Nombre: {}\n", profile.full_name));
    out.push_str(&format!(
        "Grado: {}\n",
        profile.grade.as_deref().unwrap_or("N/A")
    ));
    out.push_str("Perfil Psicográfico (Detectado por IA):\n");
    match &profile.psychographics {
        Some(tags) => {
            out.push_str(&format!("Intereses: {}\n", join_or_na(&tags.interests)));
            out.push_str(&format!("Valores: {}\n", join_or_na(&tags.values)));
            out.push_str(&format!(
                "Rasgos: {}\n",
                join_or_na(&tags.personality_traits)
            ));
        }
        None => out.push_str("Sin perfilado registrado.\n"),
    }

    out.push_str("\n2. Detalle del Conflicto\n");
    out.push_str(&format!("Tipología: {}\n", case.typology));
    out.push_str(&format!("Nivel de Riesgo: {}\n", case.risk_level.label()));
    out.push_str(&format!("{}\n", case.summary));

    out.push_str("\n3. Recomendaciones Técnicas (IA)\n");
    if case.recommendations.is_empty() {
        out.push_str("No hay recomendaciones registradas.\n");
    } else {
        for rec in &case.recommendations {
            out.push_str(&format!("- {rec}\n"));
        }
    }

    out.push_str("\n4. Transcripción del Chat (Evidencia)\n");
    if case.messages.is_empty() {
        out.push_str("No hay historial de chat disponible.\n");
    } else {
        for msg in &case.messages {
            let side = match msg.sender {
                ChatSender::User => "USUARIO",
                ChatSender::Agent => "AGENTE",
            };
            out.push_str(&format!(
                "[{}] {side}: {}\n",
                msg.timestamp.format("%Y-%m-%d %H:%M"),
                msg.text
            ));
        }
    }

    out.push_str("\n5. Historial de Intervención\n");
    if case.interventions.is_empty() {
        out.push_str("No hay intervenciones registradas.\n");
    } else {
        for record in &case.interventions {
            out.push_str(&format!(
                "{} ({}) - {}{}\n",
                record.date.format("%Y-%m-%d"),
                record.responsible,
                record.action_taken,
                record
                    .outcome
                    .as_deref()
                    .map(|o| format!(" [Resultado: {o}]"))
                    .unwrap_or_default()
            ));
        }
    }

    out
}

fn join_or_na(items: &[String]) -> String {
    if items.is_empty() {
        "N/A".into()
    } else {
        items.join(", ")
    }
}

/// Short digest tying the audit code to the exact rendered content.
fn audit_code_for(body: &str) -> String {
    let digest = Sha256::digest(body.as_bytes());
    let hex = format!("{:x}", digest);
    format!("AUD-{}", &hex[..12].to_uppercase())
}
