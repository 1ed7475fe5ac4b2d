// src/shaper.rs
//! Heuristic Shaper: pure, deterministic classification of article tags
//! into presentation labels, plus human-relative timestamps. No I/O.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::warehouse::ArticleRecord;

/// AI/ML-related tags (exact match against the tag list).
const AI_TAGS: [&str; 8] = [
    "ai",
    "ml",
    "genai",
    "llm",
    "machine learning",
    "artificial intelligence",
    "deep learning",
    "nlp",
];

/// Cloud-provider tags (exact match).
const CLOUD_TAGS: [&str; 6] = ["cloud", "aws", "azure", "gcp", "kubernetes", "serverless"];

/// Security tags (exact match).
const SECURITY_TAGS: [&str; 5] = [
    "security",
    "cybersecurity",
    "infosec",
    "breach",
    "vulnerability",
];

/// Tags that mark a story as high-impact.
const HIGH_IMPACT_TAGS: [&str; 13] = [
    "regulation",
    "policy",
    "visa",
    "immigration",
    "h1b",
    "opt",
    "ai",
    "genai",
    "layoff",
    "layoffs",
    "funding",
    "merger",
    "acquisition",
];

/// First match wins: AI/ML, Cloud, Security, then a "data" substring, then
/// the first tag title-cased; "General" when there are no tags.
pub fn category(tags: &[String]) -> String {
    if tags.iter().any(|t| AI_TAGS.contains(&t.as_str())) {
        return "AI/ML".to_string();
    }
    if tags.iter().any(|t| CLOUD_TAGS.contains(&t.as_str())) {
        return "Cloud".to_string();
    }
    if tags.iter().any(|t| SECURITY_TAGS.contains(&t.as_str())) {
        return "Security".to_string();
    }
    if tags.iter().any(|t| t.contains("data")) {
        return "Data".to_string();
    }
    match tags.first() {
        Some(first) => title_case(first),
        None => "General".to_string(),
    }
}

/// "High" on any high-signal tag, otherwise "Medium". Policy items never
/// resolve below "Medium".
pub fn impact(tags: &[String], _is_policy: bool) -> &'static str {
    if tags.iter().any(|t| HIGH_IMPACT_TAGS.contains(&t.as_str())) {
        "High"
    } else {
        "Medium"
    }
}

/// Country/region label from tags; `None` when no region tag is present
/// (policy callers default to "Global", others omit the field).
pub fn region(tags: &[String]) -> Option<&'static str> {
    for tag in tags {
        if tag == "us" || tag == "usa" || tag.contains("united states") || tag.contains("america") {
            return Some("US");
        }
        if tag.contains("india") {
            return Some("India");
        }
        if tag == "eu" || tag.contains("europe") {
            return Some("EU");
        }
        if tag == "uk" || tag.contains("britain") || tag.contains("united kingdom") {
            return Some("UK");
        }
    }
    None
}

/// Role labels accumulated from a fixed tag->role table; union, possibly
/// empty, duplicates removed.
pub fn relevant_roles(tags: &[String]) -> Vec<String> {
    const ROWS: [(&[&str], &[&str]); 3] = [
        (&["ai", "ml", "genai"], &["AI Engineer", "Data Scientist"]),
        (
            &["policy", "regulation", "compliance"],
            &["Compliance Officer", "Policy Analyst"],
        ),
        (
            &["visa", "immigration"],
            &["International Student", "Software Engineer"],
        ),
    ];

    let mut out: Vec<String> = Vec::new();
    for (triggers, roles) in ROWS.iter() {
        if tags.iter().any(|t| triggers.contains(&t.as_str())) {
            for role in roles.iter() {
                if !out.iter().any(|r| r == role) {
                    out.push(role.to_string());
                }
            }
        }
    }
    out
}

/// Bucketed elapsed-time string for an RFC 3339 timestamp, or `None` when
/// the timestamp does not parse.
pub fn relative_time(timestamp: &str) -> Option<String> {
    relative_time_at(timestamp, Utc::now())
}

/// Same as [`relative_time`] against an explicit "now" (deterministic tests).
pub fn relative_time_at(timestamp: &str, now: DateTime<Utc>) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(timestamp).ok()?;
    let elapsed = now.signed_duration_since(parsed.with_timezone(&Utc));
    let secs = elapsed.num_seconds().max(0);

    Some(if secs < 60 {
        format!("{secs}s ago")
    } else if secs < 60 * 60 {
        format!("{} minutes ago", secs / 60)
    } else if secs < 24 * 60 * 60 {
        format!("{} hours ago", secs / 3600)
    } else if secs < 30 * 24 * 60 * 60 {
        format!("{} days ago", secs / 86_400)
    } else if secs < 12 * 30 * 24 * 60 * 60 {
        format!("{} months ago", secs / (30 * 86_400))
    } else {
        format!("{} years ago", secs / (12 * 30 * 86_400))
    })
}

fn title_case(tag: &str) -> String {
    let spaced = tag.replace(['-', '_'], " ");
    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Presentation-ready projection of an [`ArticleRecord`]. Recomputed on
/// every request, never cached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapedCard {
    pub id: String,
    pub title: String,
    pub source: String,
    pub category: String,
    pub impact: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub relevant_roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl ShapedCard {
    pub fn from_article(article: &ArticleRecord) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            source: article.source.clone(),
            category: category(&article.tags),
            impact: impact(&article.tags, false),
            region: region(&article.tags).map(str::to_string),
            relevant_roles: relevant_roles(&article.tags),
            date: relative_time(&article.published_at),
        }
    }

    /// Policy-card form: impact with the policy floor, region defaulting to
    /// "Global" when no region tag is present.
    pub fn policy_from_article(article: &ArticleRecord) -> Self {
        Self {
            impact: impact(&article.tags, true),
            region: Some(region(&article.tags).unwrap_or("Global").to_string()),
            ..Self::from_article(article)
        }
    }
}
