// src/insights/trend_cards.rs
//! Trend "cards": ask the model to reformat top-skill rows into fixed
//! six-line blocks, then split its output on blank-line boundaries. Zero
//! trend rows short-circuit to an empty card list with no model call.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::genai::{GenAiClient, GenerationOptions};
use crate::prefs::TREND_LIMIT_CAP;
use crate::warehouse::{SkillRow, Warehouse};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrendCardsRequest {
    pub days: u32,
    pub limit: u32,
}

impl Default for TrendCardsRequest {
    fn default() -> Self {
        Self { days: 7, limit: 10 }
    }
}

#[derive(Debug, Serialize)]
pub struct TrendCardsResult {
    pub cards: Vec<String>,
}

pub fn build_cards_prompt(rows: &[SkillRow]) -> String {
    let listing = rows
        .iter()
        .map(|r| format!("- {} ({} mentions)", r.skill, r.mentions))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "These skills are trending in career-market news:\n\
         {listing}\n\
         \n\
         For EACH skill, produce exactly six lines in this order:\n\
         1. Skill name\n\
         2. One-line description\n\
         3. Why it is trending now\n\
         4. Typical roles that use it\n\
         5. How to start learning it\n\
         6. Mention count from the list above\n\
         Separate the blocks for different skills with one blank line.\n\
         Output nothing else."
    )
}

/// Split model output into card strings on blank-line boundaries. Handles
/// CRLF and runs of blank lines; empty blocks are dropped.
pub fn split_cards(text: &str) -> Vec<String> {
    let mut cards = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                cards.push(current.trim().to_string());
            }
            current.clear();
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    if !current.trim().is_empty() {
        cards.push(current.trim().to_string());
    }
    cards
}

pub async fn generate_trend_cards(
    warehouse: &dyn Warehouse,
    client: &GenAiClient,
    req: &TrendCardsRequest,
) -> Result<TrendCardsResult, EngineError> {
    let days = req.days.max(1);
    let limit = req.limit.clamp(1, TREND_LIMIT_CAP);

    let rows = warehouse
        .top_skills(days, limit, None)
        .await
        .map_err(EngineError::Other)?;
    if rows.is_empty() {
        return Ok(TrendCardsResult { cards: Vec::new() });
    }

    let prompt = build_cards_prompt(&rows);
    let out = client.generate(&prompt, &GenerationOptions::default()).await?;
    Ok(TrendCardsResult {
        cards: split_cards(&out.text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_handles_crlf_and_blank_runs() {
        let text = "Rust\r\nline2\r\n\r\n\r\nPython\nline2\n\n";
        let cards = split_cards(text);
        assert_eq!(cards.len(), 2);
        assert!(cards[0].starts_with("Rust"));
        assert!(cards[1].starts_with("Python"));
    }

    #[test]
    fn split_of_empty_text_is_empty() {
        assert!(split_cards("").is_empty());
        assert!(split_cards("\n\n  \n").is_empty());
    }

    #[test]
    fn prompt_lists_every_row() {
        let rows = vec![
            SkillRow {
                skill: "rust".into(),
                mentions: 8,
            },
            SkillRow {
                skill: "go".into(),
                mentions: 5,
            },
        ];
        let prompt = build_cards_prompt(&rows);
        assert!(prompt.contains("- rust (8 mentions)"));
        assert!(prompt.contains("- go (5 mentions)"));
    }
}
