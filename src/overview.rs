// src/overview.rs
//! Aggregation Orchestrator: issues the nine warehouse queries for a
//! personalized overview concurrently and assembles one nested document.
//! Each section holds either its rows or a per-section error, so a single
//! failing query degrades only its own slot.

use metrics::counter;
use serde::Serialize;
use tracing::warn;

use crate::keywords;
use crate::prefs::Preferences;
use crate::shaper::ShapedCard;
use crate::warehouse::{ArticleRecord, SkillRow, SourceRow, VolumeRow, Warehouse};

/// One independently-settled result slot of the overview.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Section<T> {
    Ok(T),
    Failed { error: String },
}

impl<T> Section<T> {
    fn settle(result: anyhow::Result<T>, name: &'static str) -> Self {
        match result {
            Ok(value) => Section::Ok(value),
            Err(e) => {
                warn!(section = name, error = %e, "overview section failed");
                counter!("overview_section_failures_total").increment(1);
                // Top-level message only; no error chains or backtraces.
                Section::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Section::Ok(_))
    }
}

#[derive(Debug, Serialize)]
pub struct TrendingSkills {
    pub general: Section<Vec<SkillRow>>,
    pub personalized: Section<Vec<SkillRow>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryNews {
    pub personalized: Section<Vec<ShapedCard>>,
    pub profile_related: Section<Vec<ShapedCard>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInsights {
    pub top_sources: Section<Vec<SourceRow>>,
    pub volume_by_day: Section<Vec<VolumeRow>>,
}

/// The assembled personalized-overview document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewDocument {
    pub trending_skills: TrendingSkills,
    pub industry_news: IndustryNews,
    pub top_sources: Section<Vec<SourceRow>>,
    pub market_insights: MarketInsights,
    pub government_policies_and_regulations: Section<Vec<ShapedCard>>,
    pub emerging_technologies: Section<Vec<ArticleRecord>>,
}

/// Derive keyword sets, fan out all nine queries together, and assemble.
/// Never fails as a whole; failures live inside the affected sections.
pub async fn build_overview(warehouse: &dyn Warehouse, prefs: &Preferences) -> OverviewDocument {
    let general = keywords::general_keywords(prefs);
    let policy = keywords::policy_keywords(prefs);
    let emerging = keywords::emerging_keywords(prefs);

    let days = prefs.days;
    let limit = prefs.limit;
    let trend_limit = prefs.trend_limit();
    let section_limit = prefs.section_limit();
    let skills = prefs.skills_lowercase();

    let (
        general_skills,
        personal_skills,
        personalized_news,
        top_sources,
        profile_news,
        policy_news,
        emerging_news,
        insight_sources,
        volume,
    ) = tokio::join!(
        warehouse.top_skills(days, trend_limit, None),
        warehouse.top_skills(days, trend_limit, Some(&skills)),
        warehouse.articles_by_keywords(general.as_slice(), days, limit),
        warehouse.top_sources(days, limit),
        warehouse.articles_by_tags(&skills, days, section_limit),
        warehouse.articles_by_keywords(policy.as_slice(), days, section_limit),
        warehouse.articles_by_keywords(emerging.as_slice(), days, section_limit),
        warehouse.top_sources(days, 5),
        warehouse.volume_by_day(days),
    );

    let shape_all = |rows: Vec<ArticleRecord>| {
        rows.iter().map(ShapedCard::from_article).collect::<Vec<_>>()
    };
    let shape_policy = |rows: Vec<ArticleRecord>| {
        rows.iter()
            .map(ShapedCard::policy_from_article)
            .collect::<Vec<_>>()
    };

    OverviewDocument {
        trending_skills: TrendingSkills {
            general: Section::settle(general_skills, "trendingSkills.general"),
            personalized: Section::settle(personal_skills, "trendingSkills.personalized"),
        },
        industry_news: IndustryNews {
            personalized: Section::settle(
                personalized_news.map(shape_all),
                "industryNews.personalized",
            ),
            profile_related: Section::settle(
                profile_news.map(shape_all),
                "industryNews.profileRelated",
            ),
        },
        top_sources: Section::settle(top_sources, "topSources"),
        market_insights: MarketInsights {
            top_sources: Section::settle(insight_sources, "marketInsights.topSources"),
            volume_by_day: Section::settle(volume, "marketInsights.volumeByDay"),
        },
        government_policies_and_regulations: Section::settle(
            policy_news.map(shape_policy),
            "governmentPoliciesAndRegulations",
        ),
        emerging_technologies: Section::settle(emerging_news, "emergingTechnologies"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_sections_serialize_transparently() {
        let section: Section<Vec<SkillRow>> = Section::Ok(vec![SkillRow {
            skill: "rust".into(),
            mentions: 12,
        }]);
        let v = serde_json::to_value(&section).unwrap();
        assert_eq!(v[0]["skill"], "rust");
    }

    #[test]
    fn failed_sections_serialize_as_error_objects() {
        let section: Section<Vec<SkillRow>> = Section::Failed {
            error: "warehouse unavailable".into(),
        };
        let v = serde_json::to_value(&section).unwrap();
        assert_eq!(v["error"], "warehouse unavailable");
    }
}
