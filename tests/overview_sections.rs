// tests/overview_sections.rs
//
// Orchestrator behavior: all nine queries settle independently, shaping is
// applied where the document expects cards, and limits follow the
// min(limit, 10) / trend-cap rules.

use std::sync::Mutex;

use async_trait::async_trait;

use career_signal_engine::overview::{build_overview, Section};
use career_signal_engine::prefs::{Preferences, PreferencesInput};
use career_signal_engine::warehouse::{
    ArticleRecord, SkillRow, SourceRow, VolumeRow, Warehouse,
};

/// Warehouse stub: records every call's parameters and can fail selected
/// queries by name.
struct MockWarehouse {
    calls: Mutex<Vec<(String, u32, u32)>>,
    fail: Vec<&'static str>,
}

impl MockWarehouse {
    fn new(fail: Vec<&'static str>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail,
        }
    }

    fn record(&self, name: &str, days: u32, limit: u32) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), days, limit));
        if self.fail.contains(&name) {
            anyhow::bail!("{name} unavailable");
        }
        Ok(())
    }

    fn limit_used(&self, name: &str) -> Option<u32> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, _, l)| *l)
    }
}

fn article(id: &str, tags: &[&str]) -> ArticleRecord {
    ArticleRecord {
        id: id.to_string(),
        title: format!("article {id}"),
        body: String::new(),
        source: "Newswire".into(),
        published_at: "2025-06-01T00:00:00Z".into(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

#[async_trait]
impl Warehouse for MockWarehouse {
    async fn top_skills(
        &self,
        days: u32,
        limit: u32,
        filter_skills: Option<&[String]>,
    ) -> anyhow::Result<Vec<SkillRow>> {
        let name = if filter_skills.is_some() {
            "top_skills_filtered"
        } else {
            "top_skills"
        };
        self.record(name, days, limit)?;
        Ok(vec![SkillRow {
            skill: "rust".into(),
            mentions: 3,
        }])
    }

    async fn articles_by_keywords(
        &self,
        keywords: &[String],
        days: u32,
        limit: u32,
    ) -> anyhow::Result<Vec<ArticleRecord>> {
        // Policy keywords always include the baseline term "visa"; the
        // emerging set for a data-scientist role always includes "genai".
        let name = if keywords.contains(&"visa".to_string()) {
            "articles_policy"
        } else if keywords.contains(&"genai".to_string()) {
            "articles_emerging"
        } else {
            "articles_keywords"
        };
        self.record(name, days, limit)?;
        if name == "articles_policy" {
            Ok(vec![article("p1", &["regulation"])])
        } else {
            Ok(vec![article("k1", &["ai"])])
        }
    }

    async fn articles_by_tags(
        &self,
        _tags: &[String],
        days: u32,
        limit: u32,
    ) -> anyhow::Result<Vec<ArticleRecord>> {
        self.record("articles_tags", days, limit)?;
        Ok(vec![article("t1", &["cloud"])])
    }

    async fn top_sources(&self, days: u32, limit: u32) -> anyhow::Result<Vec<SourceRow>> {
        self.record("top_sources", days, limit)?;
        Ok(vec![SourceRow {
            source: "Newswire".into(),
            count: 9,
        }])
    }

    async fn volume_by_day(&self, days: u32) -> anyhow::Result<Vec<VolumeRow>> {
        self.record("volume_by_day", days, 0)?;
        Ok(vec![VolumeRow {
            day: "2025-06-01".into(),
            count: 4,
        }])
    }

    async fn article_count(&self) -> anyhow::Result<u64> {
        Ok(1)
    }
}

fn prefs(limit: i64) -> Preferences {
    PreferencesInput {
        role: Some("data scientist".into()),
        skills: Some(career_signal_engine::prefs::CsvOrList::Csv("python,ml".into())),
        limit: Some(limit),
        ..Default::default()
    }
    .into()
}

#[tokio::test]
async fn one_failing_query_degrades_only_its_section() {
    let warehouse = MockWarehouse::new(vec!["top_sources"]);
    let doc = build_overview(&warehouse, &prefs(10)).await;

    // Both top_sources-backed sections fail; every sibling stays Ok.
    assert!(!doc.top_sources.is_ok());
    assert!(!doc.market_insights.top_sources.is_ok());
    assert!(doc.trending_skills.general.is_ok());
    assert!(doc.trending_skills.personalized.is_ok());
    assert!(doc.industry_news.personalized.is_ok());
    assert!(doc.industry_news.profile_related.is_ok());
    assert!(doc.government_policies_and_regulations.is_ok());
    assert!(doc.emerging_technologies.is_ok());
    assert!(doc.market_insights.volume_by_day.is_ok());
}

#[tokio::test]
async fn failed_section_serializes_error_message_without_trace() {
    let warehouse = MockWarehouse::new(vec!["volume_by_day"]);
    let doc = build_overview(&warehouse, &prefs(10)).await;

    let v = serde_json::to_value(&doc.market_insights.volume_by_day).unwrap();
    assert_eq!(v["error"], "volume_by_day unavailable");
}

#[tokio::test]
async fn news_sections_are_shaped_and_policy_region_defaults_global() {
    let warehouse = MockWarehouse::new(vec![]);
    let doc = build_overview(&warehouse, &prefs(10)).await;

    match &doc.industry_news.personalized {
        Section::Ok(cards) => {
            assert_eq!(cards[0].category, "AI/ML");
            assert_eq!(cards[0].impact, "High");
        }
        Section::Failed { .. } => panic!("expected shaped cards"),
    }

    match &doc.government_policies_and_regulations {
        Section::Ok(cards) => {
            assert_eq!(cards[0].region.as_deref(), Some("Global"));
            assert_eq!(cards[0].impact, "High");
        }
        Section::Failed { .. } => panic!("expected policy cards"),
    }
}

#[tokio::test]
async fn limits_follow_section_and_trend_caps() {
    let warehouse = MockWarehouse::new(vec![]);
    build_overview(&warehouse, &prefs(15)).await;

    // Trend listings use the caller's limit up to the 20 cap.
    assert_eq!(warehouse.limit_used("top_skills"), Some(15));
    assert_eq!(warehouse.limit_used("top_skills_filtered"), Some(15));
    // Personalized news uses the raw limit; secondary sections min(limit, 10).
    assert_eq!(warehouse.limit_used("articles_keywords"), Some(15));
    assert_eq!(warehouse.limit_used("articles_tags"), Some(10));
    assert_eq!(warehouse.limit_used("articles_policy"), Some(10));
    assert_eq!(warehouse.limit_used("articles_emerging"), Some(10));
}

#[tokio::test]
async fn all_nine_queries_are_issued() {
    let warehouse = MockWarehouse::new(vec![]);
    build_overview(&warehouse, &prefs(10)).await;

    let calls = warehouse.calls.lock().unwrap();
    assert_eq!(calls.len(), 9, "expected nine warehouse queries: {calls:?}");
    let sources = calls
        .iter()
        .filter(|(n, _, _)| n == "top_sources")
        .map(|(_, _, l)| *l)
        .collect::<Vec<_>>();
    assert!(sources.contains(&10) && sources.contains(&5));
}
