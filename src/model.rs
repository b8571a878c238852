//! Shared records for the CUÉNTAME conflict-reporting core.
//!
//! Profiles and cases are independent top-level collections. A case refers to
//! its reporter only through the pseudonymous access code, never the internal
//! profile id, so broad-access consumers of the case collection never see
//! identifying data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Account role, fixed at creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Student,
    Parent,
    Teacher,
    Staff,
    Admin,
}

impl UserRole {
    /// Reporter roles file cases; staff/admin manage them.
    pub fn is_reporter(&self) -> bool {
        matches!(self, Self::Student | Self::Parent | Self::Teacher)
    }

    /// Prefix used when generating access codes for this role.
    pub fn code_prefix(&self) -> &'static str {
        match self {
            Self::Student => "EST",
            Self::Parent => "FAM",
            Self::Teacher => "DOC",
            Self::Staff => "STAFF",
            Self::Admin => "ADM",
        }
    }
}

/// Lifecycle state of a case. No transition graph is enforced; `Closed` is
/// the only state the system sets on its own (during report generation).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CaseStatus {
    #[serde(rename = "ABIERTO")]
    Open,
    #[serde(rename = "EN_PROCESO")]
    InProgress,
    #[serde(rename = "RESUELTO")]
    Resolved,
    #[serde(rename = "CERRADO")]
    Closed,
}

impl CaseStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "ABIERTO",
            Self::InProgress => "EN_PROCESO",
            Self::Resolved => "RESUELTO",
            Self::Closed => "CERRADO",
        }
    }
}

/// Severity classification driving protocol routing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    #[serde(rename = "BAJO")]
    Low,
    #[serde(rename = "MEDIO")]
    Medium,
    #[serde(rename = "ALTO")]
    High,
    #[serde(rename = "CRÍTICO")]
    Critical,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "BAJO",
            Self::Medium => "MEDIO",
            Self::High => "ALTO",
            Self::Critical => "CRÍTICO",
        }
    }
}

/// Institutional response track assigned to a case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProtocolTrack {
    #[serde(rename = "TUTORÍA")]
    Tutoring,
    #[serde(rename = "PSICOLOGÍA")]
    Psychology,
    #[serde(rename = "DIRECCIÓN")]
    Direction,
    #[serde(rename = "AUTORIDADES_EXTERNAS")]
    ExternalAuthorities,
}

impl ProtocolTrack {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tutoring => "TUTORÍA",
            Self::Psychology => "PSICOLOGÍA",
            Self::Direction => "DIRECCIÓN",
            Self::ExternalAuthorities => "AUTORIDADES_EXTERNAS",
        }
    }
}

/// Behavioral and interest tags inferred by the classifier; never entered by
/// hand and absent on a profile until its first classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PsychographicProfile {
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub motivations: Vec<String>,
    #[serde(default)]
    pub lifestyle: Vec<String>,
    #[serde(default)]
    pub personality_traits: Vec<String>,
}

/// Whether a notification is read-only or expects an answer from the reporter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Info,
    Request,
}

/// A message delivered to a user's inbox, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserNotification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub read: bool,
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_case_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_date: Option<DateTime<Utc>>,
}

impl UserNotification {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        related_case_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            message: message.into(),
            date: Utc::now(),
            read: false,
            kind,
            related_case_id,
            reply: None,
            reply_date: None,
        }
    }
}

/// Static descriptive data about the account holder, editable only by the
/// owner or an admin process.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Demographics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian_name: Option<String>,
}

/// One reporter or staff account (restricted-access collection).
///
/// `access_code` is both the login handle and the only foreign key case
/// records carry; it must be unique case-insensitively across all profiles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub access_code: String,
    /// Lowercase hex SHA-256 of the assigned password.
    pub password_digest: String,
    pub role: UserRole,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(default)]
    pub demographics: Demographics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psychographics: Option<PsychographicProfile>,
    #[serde(default)]
    pub notifications: Vec<UserNotification>,
}

impl UserProfile {
    pub fn new(
        full_name: impl Into<String>,
        access_code: impl Into<String>,
        password: &str,
        role: UserRole,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            access_code: access_code.into(),
            password_digest: password_digest(password),
            role,
            phone: "N/A".into(),
            grade: None,
            age: None,
            demographics: Demographics::default(),
            psychographics: None,
            notifications: Vec::new(),
        }
    }

    pub fn verify_password(&self, candidate: &str) -> bool {
        self.password_digest == password_digest(candidate)
    }

    pub fn unread_notifications(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}

/// Computes the lowercase hex SHA-256 digest stored for a password.
pub fn password_digest(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    format!("{:x}", digest)
}

/// Side of a chat turn in the intake transcript.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChatSender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai")]
    Agent,
}

/// One turn of the intake conversation. Captured transcripts are immutable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: ChatSender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: ChatSender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One staff action recorded against a case. Interventions only grow; they
/// are never edited, deleted, or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterventionRecord {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub action_taken: String,
    pub responsible: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

impl InterventionRecord {
    pub fn new(action_taken: impl Into<String>, responsible: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            action_taken: action_taken.into(),
            responsible: responsible.into(),
            outcome: None,
        }
    }
}

/// One reported incident (broad-access, anonymized collection).
///
/// `typology`, `risk_level`, and the routing fields are set once at creation
/// and never revised afterwards; `messages` is the transcript frozen at
/// submission time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictCase {
    pub id: String,
    /// Pseudonymous link to the reporting profile.
    pub reporter_code: String,
    /// Role snapshot taken when the case was opened.
    pub reporter_role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: CaseStatus,
    pub typology: String,
    pub risk_level: RiskLevel,
    pub summary: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub assigned_protocol: ProtocolTrack,
    pub assigned_to: String,
    pub route_description: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub interventions: Vec<InterventionRecord>,
}

impl ConflictCase {
    /// Case ids carry a readable prefix; the tail is a uuid fragment.
    pub fn generate_id() -> String {
        let raw = Uuid::new_v4().simple().to_string();
        format!("CAS-{}", &raw[..12].to_uppercase())
    }
}
