// src/genai/mod.rs
//! Generative model collaborator: client, model fallback, token caching.

pub mod client;
pub mod token;

pub use client::{
    candidate_models, GenAiClient, GenerationOptions, GenerationRequest, GenerationResult,
    ModelProvider, ProviderError, VertexProvider,
};
pub use token::{AccessToken, CredentialSource, MetadataCredentialSource, TokenCache};
