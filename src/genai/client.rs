// src/genai/client.rs
//! Generative Content Client: model-candidate resolution, a single
//! `generate` entry point, response normalization, and uniform error
//! classification. All provider interactions go through the
//! [`ModelProvider`] trait so tests can swap in deterministic stubs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::genai::token::TokenCache;

/// Fixed fallback models tried after the preferred name (trial order).
pub const FALLBACK_MODELS: [&str; 3] = [
    "gemini-1.5-pro-002",
    "gemini-1.5-flash-002",
    "gemini-1.0-pro-002",
];

/// Fixed content-safety thresholds applied to every request.
const SAFETY_SETTINGS: [(&str, &str); 2] = [
    ("HARM_CATEGORY_HARASSMENT", "BLOCK_MEDIUM_AND_ABOVE"),
    ("HARM_CATEGORY_HATE_SPEECH", "BLOCK_MEDIUM_AND_ABOVE"),
];

const UNPARSEABLE_TEXT: &str = "The model response could not be interpreted.";

/// Bounded generation options. Defaults match the service contract.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 1024,
        }
    }
}

impl GenerationOptions {
    pub fn with_max_tokens(max_output_tokens: u32) -> Self {
        Self {
            max_output_tokens,
            ..Self::default()
        }
    }
}

/// Normalized shape every generative call returns, regardless of provider
/// response structure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub text: String,
    pub finish_reason: String,
    pub safety_ratings: Vec<SafetyRating>,
    pub raw: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
}

/// Wire request for a `generateContent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

impl GenerationRequest {
    pub fn new(prompt: &str, options: &GenerationOptions) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                top_k: options.top_k,
                max_output_tokens: options.max_output_tokens,
            },
            safety_settings: SAFETY_SETTINGS
                .into_iter()
                .map(|(category, threshold)| SafetySetting {
                    category,
                    threshold,
                })
                .collect(),
        }
    }
}

/// Transport-level failure from a provider call, before classification.
#[derive(Debug)]
pub enum ProviderError {
    Status { status: u16, message: String },
    Dns(String),
    Timeout(String),
    Other(String),
}

/// Low-level provider: performs one real `generateContent` call. Separated
/// from the client so tests reuse the candidate/normalization logic with
/// stub providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn generate_content(
        &self,
        token: &str,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<Value, ProviderError>;

    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynModelProvider = Arc<dyn ModelProvider>;

/// Ordered candidate list: preferred model, a `-002` variant when the name
/// lacks a trailing 3-digit version suffix, then the fixed fallbacks.
/// De-duplicated preserving first occurrence.
pub fn candidate_models(preferred: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(2 + FALLBACK_MODELS.len());
    let mut push = |name: String| {
        if !out.iter().any(|m| m == &name) {
            out.push(name);
        }
    };

    let preferred = preferred.trim();
    if !preferred.is_empty() {
        push(preferred.to_string());
        if !has_version_suffix(preferred) {
            push(format!("{preferred}-002"));
        }
    }
    for fallback in FALLBACK_MODELS {
        push(fallback.to_string());
    }
    out
}

fn has_version_suffix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 4
        && bytes[bytes.len() - 4] == b'-'
        && bytes[bytes.len() - 3..]
            .iter()
            .all(|b| b.is_ascii_digit())
}

/// Map a provider failure onto the closed error taxonomy.
pub fn classify_provider_error(err: ProviderError) -> EngineError {
    match err {
        ProviderError::Status { status: 401, message } => EngineError::Authentication(message),
        ProviderError::Status { status: 403, message } => EngineError::Permission(message),
        ProviderError::Status { status: 429, message } => EngineError::RateLimited(message),
        ProviderError::Status { status, message } => EngineError::Provider { status, message },
        ProviderError::Dns(message) => EngineError::Network(message),
        ProviderError::Timeout(message) => EngineError::Timeout(message),
        ProviderError::Other(message) => EngineError::Other(anyhow::anyhow!(message)),
    }
}

/// Normalize a raw provider response into [`GenerationResult`]. Structural
/// mismatch falls back to a stringified-raw result rather than an error.
pub fn normalize_response(raw: Value) -> GenerationResult {
    #[derive(Deserialize)]
    struct Known {
        candidates: Vec<Candidate>,
    }
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Candidate {
        #[serde(default)]
        content: Option<Content>,
        #[serde(default)]
        finish_reason: Option<String>,
        #[serde(default)]
        safety_ratings: Vec<SafetyRating>,
    }
    #[derive(Deserialize)]
    struct Content {
        #[serde(default)]
        parts: Vec<Part>,
    }
    #[derive(Deserialize)]
    struct Part {
        #[serde(default)]
        text: Option<String>,
    }

    if let Ok(known) = serde_json::from_value::<Known>(raw.clone()) {
        if let Some(candidate) = known.candidates.into_iter().next() {
            let text = candidate
                .content
                .map(|c| {
                    c.parts
                        .into_iter()
                        .filter_map(|p| p.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default()
                .trim()
                .to_string();
            return GenerationResult {
                text,
                finish_reason: candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".into()),
                safety_ratings: candidate.safety_ratings,
                raw,
            };
        }
    }

    // Unrecognized shape: keep whatever the provider sent, stringified.
    match serde_json::to_string(&raw) {
        Ok(text) => GenerationResult {
            text,
            finish_reason: "UNKNOWN".to_string(),
            safety_ratings: Vec::new(),
            raw,
        },
        Err(_) => GenerationResult {
            text: UNPARSEABLE_TEXT.to_string(),
            finish_reason: "ERROR".to_string(),
            safety_ratings: Vec::new(),
            raw,
        },
    }
}

/// The single entry point for generative calls.
pub struct GenAiClient {
    provider: DynModelProvider,
    tokens: TokenCache,
    preferred_model: String,
}

impl GenAiClient {
    pub fn new(provider: DynModelProvider, tokens: TokenCache, preferred_model: impl Into<String>) -> Self {
        Self {
            provider,
            tokens,
            preferred_model: preferred_model.into(),
        }
    }

    /// Resolve a usable model and generate. A "not found" reply advances to
    /// the next candidate; any other failure aborts immediately, classified.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResult, EngineError> {
        let token = self.tokens.get().await?;
        let request = GenerationRequest::new(prompt, options);
        let candidates = candidate_models(&self.preferred_model);

        let mut tried = Vec::with_capacity(candidates.len());
        for model in &candidates {
            tried.push(model.clone());
            match self.provider.generate_content(&token, model, &request).await {
                Ok(raw) => {
                    counter!("genai_generate_total").increment(1);
                    debug!(model = %model, provider = self.provider.name(), "generation succeeded");
                    return Ok(normalize_response(raw));
                }
                Err(ProviderError::Status { status: 404, .. }) => {
                    counter!("genai_model_fallbacks_total").increment(1);
                    warn!(model = %model, "model not found, trying next candidate");
                    continue;
                }
                Err(other) => return Err(classify_provider_error(other)),
            }
        }
        Err(EngineError::NoUsableModel { tried })
    }

    pub fn preferred_model(&self) -> &str {
        &self.preferred_model
    }
}

/// Provider calling the Vertex AI `generateContent` endpoint over HTTPS.
pub struct VertexProvider {
    http: reqwest::Client,
    project: String,
    location: String,
}

impl VertexProvider {
    pub fn new(project: impl Into<String>, location: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("career-signal-engine/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            project: project.into(),
            location: location.into(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "https://{loc}-aiplatform.googleapis.com/v1/projects/{proj}/locations/{loc}/publishers/google/models/{model}:generateContent",
            loc = self.location,
            proj = self.project,
        )
    }
}

#[async_trait]
impl ModelProvider for VertexProvider {
    async fn generate_content(
        &self,
        token: &str,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<Value, ProviderError> {
        let resp = self
            .http
            .post(self.endpoint(model))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: extract_provider_message(&body),
            });
        }
        resp.json::<Value>().await.map_err(map_transport_error)
    }

    fn name(&self) -> &'static str {
        "vertex"
    }
}

fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else if err.is_connect() {
        // Connection-phase failures cover DNS resolution.
        ProviderError::Dns(err.to_string())
    } else {
        ProviderError::Other(err.to_string())
    }
}

/// Pull `error.message` out of a provider error body, else use the raw body.
fn extract_provider_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrBody {
        error: ErrInner,
    }
    #[derive(Deserialize)]
    struct ErrInner {
        message: String,
    }
    serde_json::from_str::<ErrBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(300).collect())
}
