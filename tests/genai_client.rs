// tests/genai_client.rs
//
// Generative client end-to-end against a scripted provider: candidate
// fallback on not-found, immediate abort on classified errors, response
// normalization, and token reuse across calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use career_signal_engine::error::EngineError;
use career_signal_engine::genai::client::{
    GenerationRequest, ModelProvider, ProviderError,
};
use career_signal_engine::genai::token::{AccessToken, CredentialSource};
use career_signal_engine::genai::{GenAiClient, GenerationOptions, TokenCache};

/// Scripted provider: per-model status code, or a canned success body.
struct ScriptedProvider {
    statuses: HashMap<String, u16>,
    succeed_on: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(statuses: &[(&str, u16)], succeed_on: Option<&str>) -> Self {
        Self {
            statuses: statuses
                .iter()
                .map(|(m, s)| (m.to_string(), *s))
                .collect(),
            succeed_on: succeed_on.map(str::to_string),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn generate_content(
        &self,
        _token: &str,
        model: &str,
        _request: &GenerationRequest,
    ) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push(model.to_string());
        if self.succeed_on.as_deref() == Some(model) {
            return Ok(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "generated text" }] },
                    "finishReason": "STOP",
                    "safetyRatings": []
                }]
            }));
        }
        let status = self.statuses.get(model).copied().unwrap_or(404);
        Err(ProviderError::Status {
            status,
            message: format!("status {status} for {model}"),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct StaticCredentials {
    fetches: AtomicUsize,
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn fetch_token(&self) -> anyhow::Result<AccessToken> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(AccessToken {
            token: "test-token".into(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        })
    }
}

fn client_with(provider: Arc<ScriptedProvider>, preferred: &str) -> (GenAiClient, Arc<StaticCredentials>) {
    let creds = Arc::new(StaticCredentials {
        fetches: AtomicUsize::new(0),
    });
    let client = GenAiClient::new(provider, TokenCache::new(creds.clone()), preferred);
    (client, creds)
}

#[tokio::test]
async fn not_found_advances_through_all_candidates() {
    let provider = Arc::new(ScriptedProvider::new(&[], None));
    let (client, _) = client_with(provider.clone(), "foo");

    let err = client
        .generate("hi", &GenerationOptions::default())
        .await
        .unwrap_err();

    match err {
        EngineError::NoUsableModel { tried } => {
            assert_eq!(
                tried,
                vec![
                    "foo",
                    "foo-002",
                    "gemini-1.5-pro-002",
                    "gemini-1.5-flash-002",
                    "gemini-1.0-pro-002",
                ]
            );
        }
        other => panic!("expected NoUsableModel, got {other:?}"),
    }
    assert_eq!(provider.calls().len(), 5);
}

#[tokio::test]
async fn success_on_a_later_candidate_stops_the_trial() {
    let provider = Arc::new(ScriptedProvider::new(&[], Some("foo-002")));
    let (client, _) = client_with(provider.clone(), "foo");

    let out = client
        .generate("hi", &GenerationOptions::default())
        .await
        .unwrap();
    assert_eq!(out.text, "generated text");
    assert_eq!(out.finish_reason, "STOP");
    assert_eq!(provider.calls(), vec!["foo", "foo-002"]);
}

#[tokio::test]
async fn non_not_found_errors_abort_immediately() {
    let provider = Arc::new(ScriptedProvider::new(&[("foo", 401)], None));
    let (client, _) = client_with(provider.clone(), "foo");

    let err = client
        .generate("hi", &GenerationOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AUTHENTICATION_ERROR");
    assert_eq!(provider.calls().len(), 1, "no further candidates tried");
}

#[tokio::test]
async fn rate_limit_is_classified_not_retried() {
    let provider = Arc::new(ScriptedProvider::new(&[("foo", 429)], None));
    let (client, _) = client_with(provider.clone(), "foo");

    let err = client
        .generate("hi", &GenerationOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "RATE_LIMIT_ERROR");
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn token_is_fetched_once_across_calls() {
    let provider = Arc::new(ScriptedProvider::new(&[], Some("foo")));
    let (client, creds) = client_with(provider, "foo");

    client
        .generate("first", &GenerationOptions::default())
        .await
        .unwrap();
    client
        .generate("second", &GenerationOptions::default())
        .await
        .unwrap();
    assert_eq!(creds.fetches.load(Ordering::SeqCst), 1);
}
