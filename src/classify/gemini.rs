//! Gemini-backed implementation of the classification adapter.
//!
//! Requests are synchronous with a configured wall-clock timeout, since a
//! hung model call must never wedge an intake session. Responses are treated
//! as untrusted input: the typology label is validated against the closed
//! enum and the risk level is pinned to the manual's typology-to-risk table.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::classify::{ClassificationResult, ConflictClassifier, Typology};
use crate::config::ClassifierSettings;
use crate::model::{ChatMessage, ChatSender, PsychographicProfile};

/// Standing line used when the model returns an empty continuation.
const EMPTY_REPLY_PROMPT: &str = "Entendido. ¿Podrías darme un detalle más?";

const CHAT_SYSTEM_INSTRUCTION: &str = "\
Eres el \"Agente escolar\", un asistente empático y asertivo del sistema \"CUÉNTAME\".
Tu misión tiene dos pilares: 1) Recopilar información para triaje y 2) Ofrecer contención emocional y estrategias.
- El chat inició pidiendo: Alias y Género. Si el usuario responde, saluda y PREGUNTA: \"¿Prefieres las preguntas una por una o en bloques?\".
- Sé positivo, valida sentimientos y busca fortalezas en el usuario.
- Si detectas un conflicto LEVE o MEDIO, propón estrategias de afrontamiento, pero tu objetivo principal es clasificar el riesgo.
- Intenta cerrar el ciclo en 5-7 interacciones.";

/// HTTP client for the generative-language API.
pub struct GeminiClassifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClassifier {
    /// Builds a client from the installation config, reading the API key
    /// from the configured environment variable.
    pub fn from_config(settings: &ClassifierSettings) -> Result<Self> {
        let api_key = env::var(&settings.api_key_env).with_context(|| {
            format!("Classifier API key not set in env var {}", settings.api_key_env)
        })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client for the classifier")?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
        })
    }

    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .context("Classifier request failed")?;
        if !response.status().is_success() {
            bail!("Classifier endpoint returned status {}", response.status());
        }
        let body: GenerateResponse = response
            .json()
            .context("Failed to parse classifier response envelope")?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();
        Ok(text)
    }
}

impl ConflictClassifier for GeminiClassifier {
    fn reply(&self, history: &[ChatMessage], new_text: &str) -> Result<String> {
        let mut contents: Vec<Content> = history.iter().map(Content::from_message).collect();
        contents.push(Content::user(new_text));
        let request = GenerateRequest {
            contents,
            system_instruction: Some(Content::bare(CHAT_SYSTEM_INSTRUCTION)),
            generation_config: None,
        };
        let text = self.generate(&request)?;
        if text.trim().is_empty() {
            return Ok(EMPTY_REPLY_PROMPT.to_string());
        }
        Ok(text)
    }

    fn classify(&self, history: &[ChatMessage]) -> Result<ClassificationResult> {
        let transcript = history
            .iter()
            .map(|m| {
                let side = match m.sender {
                    ChatSender::User => "USUARIO",
                    ChatSender::Agent => "AGENTE",
                };
                format!("{side}: {}", m.text)
            })
            .collect::<Vec<_>>()
            .join("\n");
        let request = GenerateRequest {
            contents: vec![Content::user(&classification_prompt(&transcript))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".into(),
                response_schema: classification_schema(),
            }),
        };
        let text = self.generate(&request)?;
        let raw: RawClassification = serde_json::from_str(&text)
            .context("Classifier returned a payload outside the constrained schema")?;

        let typology = Typology::parse_label(&raw.typology).with_context(|| {
            format!("Classifier returned unknown typology {:?}", raw.typology)
        })?;
        // The manual pins risk to typology; the provider's judgment of
        // severity is advisory only.
        let risk_level = typology.canonical_risk();
        Ok(ClassificationResult {
            typology,
            risk_level,
            summary: raw.summary,
            recommendations: raw.recommendations,
            psychographics: PsychographicProfile {
                interests: raw.psychographics.interests,
                values: raw.psychographics.values,
                motivations: raw.psychographics.motivations,
                lifestyle: raw.psychographics.lifestyle,
                personality_traits: raw.psychographics.personality_traits,
            },
        })
    }
}

fn classification_prompt(transcript: &str) -> String {
    let table = Typology::ALL
        .iter()
        .map(|t| format!("   - \"{}\" -> Riesgo {}", t.label(), t.canonical_risk().label()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Analiza esta conversación de reporte escolar.\n\n\
         1. CLASIFICACIÓN (Sigue ESTRICTAMENTE esta tabla lógica):\n{table}\n\n\
         2. RECOMENDACIONES TÉCNICAS:\n\
            - Genera 3 a 5 recomendaciones accionables dirigidas al EQUIPO TÉCNICO (Psicólogo, Inspector, Director).\n\
            - NO des consejos al alumno.\n\n\
         3. PERFILADO: Extrae intereses, valores y estilo de vida implícitos.\n\n\
         TRANSCRIPCIÓN:\n{transcript}"
    )
}

fn classification_schema() -> serde_json::Value {
    let typologies: Vec<&str> = Typology::ALL.iter().map(|t| t.label()).collect();
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "typology": { "type": "STRING", "enum": typologies },
            "riskLevel": { "type": "STRING", "enum": ["BAJO", "MEDIO", "ALTO", "CRÍTICO"] },
            "summary": { "type": "STRING" },
            "recommendations": { "type": "ARRAY", "items": { "type": "STRING" } },
            "psychographics": {
                "type": "OBJECT",
                "properties": {
                    "interests": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "values": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "motivations": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "lifestyle": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "personalityTraits": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "required": ["interests", "values", "motivations", "lifestyle", "personalityTraits"]
            }
        },
        "required": ["typology", "riskLevel", "summary", "recommendations", "psychographics"]
    })
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

impl Content {
    fn user(text: &str) -> Self {
        Self {
            role: Some("user".into()),
            parts: vec![Part { text: text.into() }],
        }
    }

    fn bare(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part { text: text.into() }],
        }
    }

    fn from_message(message: &ChatMessage) -> Self {
        let role = match message.sender {
            ChatSender::User => "user",
            ChatSender::Agent => "model",
        };
        Self {
            role: Some(role.into()),
            parts: vec![Part {
                text: message.text.clone(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClassification {
    typology: String,
    #[allow(dead_code)]
    risk_level: String,
    summary: String,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    psychographics: RawPsychographics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPsychographics {
    #[serde(default)]
    interests: Vec<String>,
    #[serde(default)]
    values: Vec<String>,
    #[serde(default)]
    motivations: Vec<String>,
    #[serde(default)]
    lifestyle: Vec<String>,
    #[serde(default)]
    personality_traits: Vec<String>,
}
