//! Append-only audit trail for institutional review.
//!
//! Every significant mutation (account creation, logins, case lifecycle,
//! notifications, degraded classifications) is recorded as one JSONL event so
//! the history of a case can be reconstructed without touching the
//! collections themselves.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::WorkspacePaths;

/// Type of audit events that can be logged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ProfileCreated,
    LoginSucceeded,
    LoginFailed,
    CaseOpened,
    ClassificationDegraded,
    InterventionRecorded,
    NotificationSent,
    ReplyRecorded,
    CaseClosed,
    ReportGenerated,
}

/// General-purpose audit event stored as JSONL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

/// Wraps the event log path for a workspace.
pub struct AuditLog {
    events_path: PathBuf,
}

impl AuditLog {
    pub fn for_workspace(paths: &WorkspacePaths) -> Self {
        Self {
            events_path: paths.events_path(),
        }
    }

    pub fn append(&self, event_type: EventType, details: serde_json::Value) -> Result<Uuid> {
        let event = AuditEvent {
            event_id: Uuid::new_v4(),
            event_type,
            timestamp: Utc::now(),
            details,
        };
        if let Some(parent) = self.events_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)
            .with_context(|| format!("Failed to open audit log {:?}", self.events_path))?;
        let line = serde_json::to_string(&event)?;
        writeln!(file, "{line}")?;
        Ok(event.event_id)
    }

    /// Reads the full event history, oldest first.
    pub fn read_all(&self) -> Result<Vec<AuditEvent>> {
        if !self.events_path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.events_path)
            .with_context(|| format!("Failed to read audit log {:?}", self.events_path))?;
        let mut events = Vec::new();
        for line in data.lines().filter(|l| !l.trim().is_empty()) {
            let event: AuditEvent =
                serde_json::from_str(line).context("Failed to parse audit event line")?;
            events.push(event);
        }
        Ok(events)
    }
}
