// src/config.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}
fn default_location() -> String {
    "us-central1".to_string()
}

/// Runtime configuration loaded from `config/engine.json`, with `"ENV"`
/// indirection for secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Preferred generative model; fallbacks are resolved at call time.
    #[serde(default = "default_model")]
    pub preferred_model: String,
    pub project: String,
    #[serde(default = "default_location")]
    pub location: String,
    /// Base URL of the analytics-warehouse query endpoint.
    pub warehouse_url: String,
    /// "ENV" means: read from WAREHOUSE_TOKEN.
    pub warehouse_token: String,
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: EngineConfig = serde_json::from_str(&data)?;

        if cfg.warehouse_token.trim().eq_ignore_ascii_case("env") {
            cfg.warehouse_token = env::var("WAREHOUSE_TOKEN")
                .map_err(|_| anyhow::anyhow!("Missing WAREHOUSE_TOKEN env var"))?;
        }
        if cfg.preferred_model.trim().is_empty() {
            cfg.preferred_model = default_model();
        }

        Ok(cfg)
    }

    /// Env-only fallback for deployments without a config file.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            preferred_model: env::var("GENAI_MODEL").unwrap_or_else(|_| default_model()),
            project: env::var("GENAI_PROJECT")
                .map_err(|_| anyhow::anyhow!("Missing GENAI_PROJECT env var"))?,
            location: env::var("GENAI_LOCATION").unwrap_or_else(|_| default_location()),
            warehouse_url: env::var("WAREHOUSE_URL")
                .map_err(|_| anyhow::anyhow!("Missing WAREHOUSE_URL env var"))?,
            warehouse_token: env::var("WAREHOUSE_TOKEN").unwrap_or_default(),
        })
    }
}
