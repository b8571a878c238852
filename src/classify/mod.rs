//! Classification adapter boundary.
//!
//! The external model sits behind the narrow [`ConflictClassifier`] trait so
//! no business logic binds to a specific provider. Adapter failures never
//! reach the reporter: conversation turns degrade to a fixed apology line and
//! classification degrades to a manual-review record, each surfaced as a
//! named outcome rather than indistinguishable success data.

pub mod gemini;

pub use gemini::GeminiClassifier;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::model::{ChatMessage, PsychographicProfile, RiskLevel};

/// The ten official incident categories from the institutional manual.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Typology {
    #[serde(rename = "Conflicto leve entre pares")]
    MinorPeerConflict,
    #[serde(rename = "Acoso escolar (bullying)")]
    Bullying,
    #[serde(rename = "Violencia física grave")]
    SeriousPhysicalViolence,
    #[serde(rename = "Violencia sexual")]
    SexualViolence,
    #[serde(rename = "Violencia intrafamiliar detectada")]
    DomesticViolence,
    #[serde(rename = "Discriminación o xenofobia")]
    Discrimination,
    #[serde(rename = "Ideación suicida o autolesiones")]
    SuicidalIdeation,
    #[serde(rename = "Violencia digital")]
    DigitalViolence,
    #[serde(rename = "Abandono escolar o negligencia")]
    Neglect,
    #[serde(rename = "Conflicto docente-estudiante")]
    TeacherStudentConflict,
}

impl Typology {
    pub const ALL: [Typology; 10] = [
        Typology::MinorPeerConflict,
        Typology::Bullying,
        Typology::SeriousPhysicalViolence,
        Typology::SexualViolence,
        Typology::DomesticViolence,
        Typology::Discrimination,
        Typology::SuicidalIdeation,
        Typology::DigitalViolence,
        Typology::Neglect,
        Typology::TeacherStudentConflict,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::MinorPeerConflict => "Conflicto leve entre pares",
            Self::Bullying => "Acoso escolar (bullying)",
            Self::SeriousPhysicalViolence => "Violencia física grave",
            Self::SexualViolence => "Violencia sexual",
            Self::DomesticViolence => "Violencia intrafamiliar detectada",
            Self::Discrimination => "Discriminación o xenofobia",
            Self::SuicidalIdeation => "Ideación suicida o autolesiones",
            Self::DigitalViolence => "Violencia digital",
            Self::Neglect => "Abandono escolar o negligencia",
            Self::TeacherStudentConflict => "Conflicto docente-estudiante",
        }
    }

    /// Parses the exact official label; anything else is rejected so an
    /// adapter cannot smuggle a typology outside the closed set.
    pub fn parse_label(label: &str) -> Option<Typology> {
        Self::ALL.iter().copied().find(|t| t.label() == label)
    }

    /// The fixed typology-to-risk table the protocol manual prescribes. The
    /// adapter is instructed to follow it; callers enforce it regardless.
    pub fn canonical_risk(&self) -> RiskLevel {
        match self {
            Self::MinorPeerConflict => RiskLevel::Low,
            Self::Bullying
            | Self::Discrimination
            | Self::DigitalViolence
            | Self::Neglect
            | Self::TeacherStudentConflict => RiskLevel::Medium,
            Self::SeriousPhysicalViolence | Self::DomesticViolence => RiskLevel::High,
            Self::SexualViolence | Self::SuicidalIdeation => RiskLevel::Critical,
        }
    }

    /// Whether the public-health route addendum applies. Structured flag
    /// replacing the substring match on the typology text.
    pub fn involves_self_harm(&self) -> bool {
        matches!(self, Self::SuicidalIdeation)
    }
}

/// Output of one classification request over a full transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub typology: Typology,
    pub risk_level: RiskLevel,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub psychographics: PsychographicProfile,
}

/// Narrow seam in front of the external conversational model.
pub trait ConflictClassifier {
    /// Single-turn continuation of the intake conversation.
    fn reply(&self, history: &[ChatMessage], new_text: &str) -> Result<String>;

    /// Constrained classification of the full transcript.
    fn classify(&self, history: &[ChatMessage]) -> Result<ClassificationResult>;
}

/// Result of a classification attempt, keeping degraded fallbacks
/// distinguishable from real adapter output.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationOutcome {
    Classified(ClassificationResult),
    Degraded {
        result: ClassificationResult,
        reason: String,
    },
}

impl ClassificationOutcome {
    pub fn result(&self) -> &ClassificationResult {
        match self {
            Self::Classified(result) | Self::Degraded { result, .. } => result,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Fixed line returned to the reporter when the conversation adapter fails.
pub const CHAT_FALLBACK_REPLY: &str = "Hubo un error de conexión momentáneo.";

/// The manual-review record substituted when classification fails. The case
/// must always be created, so the degraded record deliberately pins Medium
/// risk to force staff triage.
pub fn fallback_classification() -> ClassificationResult {
    ClassificationResult {
        typology: Typology::MinorPeerConflict,
        risk_level: RiskLevel::Medium,
        summary: "Error en clasificación automática. Revisión manual requerida.".into(),
        recommendations: vec![
            "Revisar caso manualmente".into(),
            "Entrevistar al estudiante".into(),
        ],
        psychographics: PsychographicProfile::default(),
    }
}

/// Runs the adapter, converting any error into the fixed apology line.
pub fn reply_or_fallback(
    classifier: &dyn ConflictClassifier,
    history: &[ChatMessage],
    new_text: &str,
) -> String {
    match classifier.reply(history, new_text) {
        Ok(text) => text,
        Err(_) => CHAT_FALLBACK_REPLY.to_string(),
    }
}

/// Runs the adapter, converting any error into the named degraded outcome.
pub fn classify_or_fallback(
    classifier: &dyn ConflictClassifier,
    history: &[ChatMessage],
) -> ClassificationOutcome {
    match classifier.classify(history) {
        Ok(result) => ClassificationOutcome::Classified(result),
        Err(err) => ClassificationOutcome::Degraded {
            result: fallback_classification(),
            reason: format!("{err:#}"),
        },
    }
}
