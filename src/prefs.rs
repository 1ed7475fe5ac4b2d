// src/prefs.rs
//! Caller-supplied personalization inputs: parsing, defaults, and the CSV
//! splitting rules shared by every keyword path.

use serde::Deserialize;

pub const DEFAULT_DAYS: u32 = 7;
pub const DEFAULT_LIMIT: u32 = 10;
/// Hard ceiling applied to trend listings regardless of the caller's limit.
pub const TREND_LIMIT_CAP: u32 = 20;
/// Raw input lists are capped to this many tokens before any processing.
pub const CSV_TOKEN_CAP: usize = 20;

/// Accepts either `"python,ml"` or `["python","ml"]` from callers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CsvOrList {
    Csv(String),
    List(Vec<String>),
}

impl CsvOrList {
    pub fn into_tokens(self) -> Vec<String> {
        match self {
            CsvOrList::Csv(s) => split_csv(&s),
            CsvOrList::List(items) => cap_tokens(items),
        }
    }
}

/// Split a comma-separated value: trim whitespace, drop empty tokens, cap
/// the raw list at [`CSV_TOKEN_CAP`]. Case is preserved here; keyword paths
/// lowercase later where matching requires it.
pub fn split_csv(raw: &str) -> Vec<String> {
    cap_tokens(raw.split(',').map(|t| t.to_string()).collect())
}

fn cap_tokens(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .take(CSV_TOKEN_CAP)
        .collect()
}

/// Remove duplicates comparing case-insensitively, keeping the first
/// occurrence's casing for display.
pub fn dedup_case_insensitive(items: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(items.len());
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let folded = item.to_lowercase();
        if seen.contains(&folded) {
            continue;
        }
        seen.push(folded);
        out.push(item);
    }
    out
}

/// Wire shape accepted by the route layer. Everything is optional; the
/// sanitized [`Preferences`] fills in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreferencesInput {
    pub role: Option<String>,
    pub skills: Option<CsvOrList>,
    pub interests: Option<CsvOrList>,
    pub days: Option<i64>,
    pub limit: Option<i64>,
    /// Explicit general-keyword override; `q` is the short alias.
    pub query: Option<CsvOrList>,
    pub q: Option<CsvOrList>,
    pub policy: Option<CsvOrList>,
    pub emerging: Option<CsvOrList>,
}

/// Sanitized preferences used by the derivation engine and orchestrator.
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    pub role: Option<String>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub days: u32,
    pub limit: u32,
    pub query_override: Vec<String>,
    pub policy_override: Vec<String>,
    pub emerging_override: Vec<String>,
}

impl Preferences {
    /// Max items for trend listings: caller's limit, capped at 20.
    pub fn trend_limit(&self) -> u32 {
        self.limit.min(TREND_LIMIT_CAP)
    }

    /// Max items for secondary article sections: min(limit, 10).
    pub fn section_limit(&self) -> u32 {
        self.limit.min(10)
    }

    /// Skills lowercased for warehouse tag matching.
    pub fn skills_lowercase(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.to_lowercase()).collect()
    }
}

impl From<PreferencesInput> for Preferences {
    fn from(input: PreferencesInput) -> Self {
        let tokens = |v: Option<CsvOrList>| v.map(CsvOrList::into_tokens).unwrap_or_default();

        let role = input
            .role
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        // `query` wins over its alias `q` when both are present.
        let query_override = {
            let primary = tokens(input.query);
            if primary.is_empty() {
                tokens(input.q)
            } else {
                primary
            }
        };

        Self {
            role,
            skills: dedup_case_insensitive(tokens(input.skills)),
            interests: dedup_case_insensitive(tokens(input.interests)),
            days: sanitize_window(input.days, DEFAULT_DAYS),
            limit: sanitize_window(input.limit, DEFAULT_LIMIT),
            query_override,
            policy_override: tokens(input.policy),
            emerging_override: tokens(input.emerging),
        }
    }
}

fn sanitize_window(raw: Option<i64>, default: u32) -> u32 {
    match raw {
        Some(v) if v >= 1 => v.min(u32::MAX as i64) as u32,
        Some(_) => default,
        None => default,
    }
}
