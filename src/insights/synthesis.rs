// src/insights/synthesis.rs
//! Two-source synthesis: combine real-time news text and government/policy
//! text into one analysis. Requires at least one of the two inputs.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::genai::{GenAiClient, GenerationOptions};

/// Response-length hint with three fixed token budgets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Detail {
    Short,
    #[default]
    Standard,
    Long,
}

impl Detail {
    pub fn token_budget(self) -> u32 {
        match self {
            Detail::Short => 512,
            Detail::Standard => 1024,
            Detail::Long => 2048,
        }
    }

    fn length_hint(self) -> &'static str {
        match self {
            Detail::Short => "Answer in at most two short paragraphs.",
            Detail::Standard => "Answer in four to six paragraphs.",
            Detail::Long => "Answer in depth, with sections and bullet points where useful.",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub real_time_text: String,
    pub government_text: String,
    pub detail: Detail,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisResult {
    pub synthesis: String,
    pub finish_reason: String,
}

/// Fixed section template; the only variable behavior is the length hint.
pub fn build_synthesis_prompt(req: &SynthesisRequest) -> String {
    let section = |text: &str| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            "(no input provided)".to_string()
        } else {
            trimmed.to_string()
        }
    };
    format!(
        "You are an analyst synthesizing career-market signals from two sources.\n\
         \n\
         === REAL-TIME NEWS ===\n\
         {real_time}\n\
         \n\
         === GOVERNMENT / POLICY ===\n\
         {government}\n\
         \n\
         Synthesize both sources into one coherent analysis of what is\n\
         changing in the job market and what it means for workers. Call out\n\
         agreements and contradictions between the sources explicitly.\n\
         {hint}",
        real_time = section(&req.real_time_text),
        government = section(&req.government_text),
        hint = req.detail.length_hint(),
    )
}

/// Validate, build the prompt, and generate with the detail-sized budget.
pub async fn synthesize(
    client: &GenAiClient,
    req: &SynthesisRequest,
) -> Result<SynthesisResult, EngineError> {
    if req.real_time_text.trim().is_empty() && req.government_text.trim().is_empty() {
        return Err(EngineError::validation(
            "at least one of realTimeText or governmentText is required",
        ));
    }

    let prompt = build_synthesis_prompt(req);
    let options = GenerationOptions::with_max_tokens(req.detail.token_budget());
    let out = client.generate(&prompt, &options).await?;
    Ok(SynthesisResult {
        synthesis: out.text,
        finish_reason: out.finish_reason,
    })
}
