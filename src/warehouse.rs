// src/warehouse.rs
//! Analytics-warehouse collaborator: the trait the orchestrator fans out
//! over, the row types it returns, and a thin HTTP adapter that posts
//! parameterized named queries to a configured endpoint.
//!
//! The warehouse owns article storage; this crate only reads. Integer
//! parameters are sanitized and keyword/tag lists lowercased here so every
//! implementation sees the same inputs.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// External article entity as stored by the warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub source: String,
    /// RFC 3339 timestamp string as returned by the warehouse.
    pub published_at: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRow {
    pub skill: String,
    pub mentions: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRow {
    pub source: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeRow {
    pub day: String,
    pub count: u64,
}

/// Aggregation queries over the stored article table. An empty keyword or
/// tag list means "no filter" for the article queries.
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn top_skills(
        &self,
        days: u32,
        limit: u32,
        filter_skills: Option<&[String]>,
    ) -> anyhow::Result<Vec<SkillRow>>;

    async fn articles_by_keywords(
        &self,
        keywords: &[String],
        days: u32,
        limit: u32,
    ) -> anyhow::Result<Vec<ArticleRecord>>;

    async fn articles_by_tags(
        &self,
        tags: &[String],
        days: u32,
        limit: u32,
    ) -> anyhow::Result<Vec<ArticleRecord>>;

    async fn top_sources(&self, days: u32, limit: u32) -> anyhow::Result<Vec<SourceRow>>;

    async fn volume_by_day(&self, days: u32) -> anyhow::Result<Vec<VolumeRow>>;

    async fn article_count(&self) -> anyhow::Result<u64>;
}

pub type DynWarehouse = Arc<dyn Warehouse>;

/// Lowercase terms before matching; the warehouse stores lowercase tags.
pub fn lowercase_terms(terms: &[String]) -> Vec<String> {
    terms.iter().map(|t| t.to_lowercase()).collect()
}

fn sanitize(v: u32) -> u32 {
    v.max(1)
}

/// HTTP adapter posting `{name, params}` to `<base_url>/query` and reading
/// rows from the `data` array of the reply.
pub struct HttpWarehouse {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct QueryReply<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

impl HttpWarehouse {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("career-signal-engine/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .context("build warehouse http client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn run_query<T: DeserializeOwned>(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<Vec<T>> {
        let url = format!("{}/query", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "name": name, "params": params }))
            .send()
            .await
            .with_context(|| format!("warehouse query '{name}'"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("warehouse query '{name}' failed (status {status}): {body}");
        }

        let reply: QueryReply<T> = resp
            .json()
            .await
            .with_context(|| format!("decode warehouse reply for '{name}'"))?;
        Ok(reply.data)
    }
}

#[async_trait]
impl Warehouse for HttpWarehouse {
    async fn top_skills(
        &self,
        days: u32,
        limit: u32,
        filter_skills: Option<&[String]>,
    ) -> anyhow::Result<Vec<SkillRow>> {
        let params = json!({
            "days": sanitize(days),
            "limit": sanitize(limit),
            "skills": filter_skills.map(lowercase_terms),
        });
        self.run_query("top_skills", params).await
    }

    async fn articles_by_keywords(
        &self,
        keywords: &[String],
        days: u32,
        limit: u32,
    ) -> anyhow::Result<Vec<ArticleRecord>> {
        let params = json!({
            "keywords": lowercase_terms(keywords),
            "days": sanitize(days),
            "limit": sanitize(limit),
        });
        self.run_query("articles_by_keywords", params).await
    }

    async fn articles_by_tags(
        &self,
        tags: &[String],
        days: u32,
        limit: u32,
    ) -> anyhow::Result<Vec<ArticleRecord>> {
        let params = json!({
            "tags": lowercase_terms(tags),
            "days": sanitize(days),
            "limit": sanitize(limit),
        });
        self.run_query("articles_by_tags", params).await
    }

    async fn top_sources(&self, days: u32, limit: u32) -> anyhow::Result<Vec<SourceRow>> {
        let params = json!({ "days": sanitize(days), "limit": sanitize(limit) });
        self.run_query("top_sources", params).await
    }

    async fn volume_by_day(&self, days: u32) -> anyhow::Result<Vec<VolumeRow>> {
        let params = json!({ "days": sanitize(days) });
        self.run_query("volume_by_day", params).await
    }

    async fn article_count(&self) -> anyhow::Result<u64> {
        #[derive(Deserialize)]
        struct CountRow {
            count: u64,
        }
        let rows: Vec<CountRow> = self.run_query("article_count", json!({})).await?;
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }
}
