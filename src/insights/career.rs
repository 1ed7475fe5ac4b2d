// src/insights/career.rs
//! Career-insight service: deterministic prompt assembly from profile
//! fields plus a trend summary, then one generative call.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::genai::{GenAiClient, GenerationOptions};
use crate::warehouse::{SkillRow, Warehouse};

pub const NO_TREND_DATA: &str = "No market trend data is available for this period.";

/// Free-form profile supplied by the caller. Everything is optional; the
/// prompt renders "not provided" for absent fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CareerProfile {
    /// Free-text narrative about the user's background and goals.
    pub narrative: Option<String>,
    pub skills: Vec<String>,
    pub role: Option<String>,
    pub experience: Option<String>,
    pub interests: Vec<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResult {
    pub insights: String,
    pub finish_reason: String,
    pub trend_summary: String,
}

/// `"<skill> (<mentions> mentions), ..."`, or the fixed no-data sentence
/// for an empty row set.
pub fn trend_summary(rows: &[SkillRow]) -> String {
    if rows.is_empty() {
        return NO_TREND_DATA.to_string();
    }
    rows.iter()
        .map(|r| format!("{} ({} mentions)", r.skill, r.mentions))
        .collect::<Vec<_>>()
        .join(", ")
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or("not provided")
}

fn list(values: &[String]) -> String {
    if values.is_empty() {
        "not provided".to_string()
    } else {
        values.join(", ")
    }
}

/// Deterministic template: consumes the profile and trend rows, returns one
/// generation prompt. No control logic beyond interpolation.
pub fn build_career_prompt(profile: &CareerProfile, trends: &str) -> String {
    format!(
        "You are a career advisor for the technology job market.\n\
         \n\
         Candidate profile:\n\
         - About: {narrative}\n\
         - Current role: {role}\n\
         - Experience: {experience}\n\
         - Skills: {skills}\n\
         - Interests: {interests}\n\
         - Location: {location}\n\
         \n\
         Market trends from recent news coverage:\n\
         {trends}\n\
         \n\
         Write personalized career insights for this candidate. Cover:\n\
         1. How their skills align with the trends above.\n\
         2. Two or three skills worth learning next, with reasons.\n\
         3. Risks or market shifts they should watch.\n\
         Keep it concrete and under 400 words.",
        narrative = field(&profile.narrative),
        role = field(&profile.role),
        experience = field(&profile.experience),
        skills = list(&profile.skills),
        interests = list(&profile.interests),
        location = field(&profile.location),
        trends = trends,
    )
}

/// Query recent trends, build the prompt, and generate. A failing or empty
/// trend query degrades to the fixed no-data sentence instead of aborting.
pub async fn generate_career_insights(
    warehouse: &dyn Warehouse,
    client: &GenAiClient,
    profile: &CareerProfile,
) -> Result<InsightResult, EngineError> {
    let rows = match warehouse.top_skills(7, 10, None).await {
        Ok(rows) => rows,
        Err(e) => {
            debug!(error = %e, "trend query failed, using no-data summary");
            Vec::new()
        }
    };
    let summary = trend_summary(&rows);
    let prompt = build_career_prompt(profile, &summary);

    let out = client.generate(&prompt, &GenerationOptions::default()).await?;
    Ok(InsightResult {
        insights: out.text,
        finish_reason: out.finish_reason,
        trend_summary: summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_summary_formats_rows() {
        let rows = vec![
            SkillRow {
                skill: "rust".into(),
                mentions: 42,
            },
            SkillRow {
                skill: "python".into(),
                mentions: 17,
            },
        ];
        assert_eq!(
            trend_summary(&rows),
            "rust (42 mentions), python (17 mentions)"
        );
    }

    #[test]
    fn trend_summary_empty_uses_fixed_sentence() {
        assert_eq!(trend_summary(&[]), NO_TREND_DATA);
    }

    #[test]
    fn prompt_is_deterministic_and_marks_missing_fields() {
        let profile = CareerProfile {
            role: Some("data scientist".into()),
            skills: vec!["python".into(), "ml".into()],
            ..Default::default()
        };
        let a = build_career_prompt(&profile, NO_TREND_DATA);
        let b = build_career_prompt(&profile, NO_TREND_DATA);
        assert_eq!(a, b);
        assert!(a.contains("Current role: data scientist"));
        assert!(a.contains("Skills: python, ml"));
        assert!(a.contains("Location: not provided"));
        assert!(a.contains(NO_TREND_DATA));
    }
}
