// src/insights/roadmap.rs
//! Roadmap generation: strict structured-output prompt, then parse the
//! model's text by locating the outermost JSON object. A parse failure
//! surfaces the raw text for diagnostics instead of swallowing it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;
use crate::genai::{GenAiClient, GenerationOptions};

/// Target title may arrive under any of three aliased fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoadmapRequest {
    pub roadmap_name: String,
    pub title: String,
    pub role: String,
}

impl RoadmapRequest {
    /// First non-empty alias, in declaration order.
    pub fn target(&self) -> Option<&str> {
        [&self.roadmap_name, &self.title, &self.role]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapResult {
    pub target: String,
    pub plan: Value,
}

pub fn build_roadmap_prompt(target: &str) -> String {
    format!(
        "Create a learning roadmap for becoming a {target}.\n\
         \n\
         Respond with ONLY a JSON object, no prose before or after, in this\n\
         exact shape:\n\
         {{\n\
           \"title\": \"<roadmap title>\",\n\
           \"estimatedMonths\": <number>,\n\
           \"phases\": [\n\
             {{\n\
               \"name\": \"<phase name>\",\n\
               \"weeks\": <number>,\n\
               \"skills\": [\"<skill>\", ...],\n\
               \"resources\": [\"<resource>\", ...]\n\
             }}\n\
           ]\n\
         }}"
    )
}

/// Locate the first `{` and last `}` and parse the substring as JSON.
pub fn extract_json_object(text: &str) -> Result<Value, EngineError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let (start, end) = match (start, end) {
        (Some(s), Some(e)) if s < e => (s, e),
        _ => {
            return Err(EngineError::Parse {
                message: "no JSON object found in model output".into(),
                raw: text.to_string(),
            })
        }
    };
    serde_json::from_str(&text[start..=end]).map_err(|e| EngineError::Parse {
        message: e.to_string(),
        raw: text.to_string(),
    })
}

/// Validate the target title, generate, and parse the structured plan.
/// No model call is issued when validation fails.
pub async fn generate_roadmap(
    client: &GenAiClient,
    req: &RoadmapRequest,
) -> Result<RoadmapResult, EngineError> {
    let target = req
        .target()
        .ok_or_else(|| {
            EngineError::validation("a target title is required (roadmapName, title, or role)")
        })?
        .to_string();

    let prompt = build_roadmap_prompt(&target);
    let out = client
        .generate(&prompt, &GenerationOptions::with_max_tokens(2048))
        .await?;
    let plan = extract_json_object(&out.text)?;
    Ok(RoadmapResult { target, plan })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_prefers_roadmap_name_then_title_then_role() {
        let req = RoadmapRequest {
            roadmap_name: "  ".into(),
            title: "ML Engineer".into(),
            role: "ignored".into(),
        };
        assert_eq!(req.target(), Some("ML Engineer"));

        let req = RoadmapRequest::default();
        assert_eq!(req.target(), None);
    }

    #[test]
    fn extract_tolerates_prose_around_the_object() {
        let text = "Sure! Here is your roadmap:\n{\"title\":\"Rust Developer\",\"phases\":[]}\nGood luck!";
        let plan = extract_json_object(text).unwrap();
        assert_eq!(plan["title"], "Rust Developer");
    }

    #[test]
    fn extract_failure_carries_the_raw_text() {
        let text = "I cannot produce JSON today.";
        match extract_json_object(text) {
            Err(EngineError::Parse { raw, .. }) => assert_eq!(raw, text),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn extract_failure_on_malformed_object_keeps_raw() {
        let text = "{\"title\": unterminated";
        // No closing brace at all -> "no JSON object" path.
        assert!(matches!(
            extract_json_object(text),
            Err(EngineError::Parse { .. })
        ));

        let text = "{\"title\": } trailing";
        match extract_json_object(text) {
            Err(EngineError::Parse { raw, .. }) => assert!(raw.contains("trailing")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
