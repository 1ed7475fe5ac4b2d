// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod error;
pub mod keywords;
pub mod metrics;
pub mod overview;
pub mod prefs;
pub mod shaper;
pub mod warehouse;

// Generative model collaborator (client, fallback, token cache)
pub mod genai;

// Prompt-and-parse services composed on top of the client
pub mod insights;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::error::EngineError;
pub use crate::genai::{GenAiClient, GenerationOptions, GenerationResult};
pub use crate::overview::{build_overview, OverviewDocument, Section};
pub use crate::prefs::{Preferences, PreferencesInput};
