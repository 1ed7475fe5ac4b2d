// src/keywords.rs
//! Keyword Derivation Engine: turns sparse preferences into the three
//! keyword sets used to filter external data. Pure functions, no I/O.
//!
//! Fallback layering, in order, for each purpose:
//!   1. explicit caller override (used verbatim, lowercased)
//!   2. derived from skills / interests / role tokens
//!   3. curated baseline (policy and emerging only)

use crate::prefs::{Preferences, CSV_TOKEN_CAP};

/// Cap for the derived general/industry set. Explicit overrides are bounded
/// only by the raw CSV ceiling.
pub const GENERAL_CAP: usize = 12;
pub const POLICY_CAP: usize = 24;
pub const EMERGING_CAP: usize = 30;

/// Ordered set of lowercased search terms. Insertion order is preserved,
/// duplicates dropped, size bounded by `cap`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    cap: usize,
    terms: Vec<String>,
}

impl KeywordSet {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            cap,
            terms: Vec::new(),
        }
    }

    pub fn push(&mut self, term: &str) {
        if self.terms.len() >= self.cap {
            return;
        }
        let folded = term.trim().to_lowercase();
        if folded.is_empty() || self.terms.iter().any(|t| t == &folded) {
            return;
        }
        self.terms.push(folded);
    }

    pub fn extend<I, S>(&mut self, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for t in terms {
            self.push(t.as_ref());
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.terms
    }

    pub fn into_vec(self) -> Vec<String> {
        self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Baseline regulatory/immigration/compliance terms for the policy search.
const POLICY_BASELINE: [&str; 18] = [
    "visa",
    "immigration",
    "h1b",
    "opt",
    "green card",
    "work permit",
    "regulation",
    "policy",
    "compliance",
    "gdpr",
    "data privacy",
    "ai act",
    "export control",
    "tariff",
    "labor law",
    "employment law",
    "antitrust",
    "sanctions",
];

/// Cross-domain technology/industry defaults for the emerging-tech search.
const EMERGING_DEFAULTS: [&str; 60] = [
    "generative ai",
    "llm",
    "rag",
    "agents",
    "multimodal",
    "prompt engineering",
    "vector databases",
    "federated learning",
    "synthetic data",
    "data mesh",
    "lakehouse",
    "streaming analytics",
    "graph databases",
    "quantum computing",
    "edge computing",
    "webassembly",
    "rust",
    "kubernetes",
    "serverless",
    "platform engineering",
    "observability",
    "ebpf",
    "zero trust",
    "passkeys",
    "confidential computing",
    "homomorphic encryption",
    "blockchain",
    "defi",
    "digital identity",
    "augmented reality",
    "virtual reality",
    "spatial computing",
    "digital twins",
    "robotics",
    "autonomous vehicles",
    "drones",
    "5g",
    "6g",
    "satellite internet",
    "iot",
    "smart grid",
    "battery technology",
    "green hydrogen",
    "carbon capture",
    "climate tech",
    "synthetic biology",
    "gene editing",
    "mrna",
    "precision medicine",
    "telehealth",
    "wearables",
    "brain computer interface",
    "semiconductors",
    "chiplets",
    "risc-v",
    "photonics",
    "neuromorphic computing",
    "low code",
    "fintech",
    "regtech",
];

/// Closed role->keyword table for the emerging-tech search. Patterns match
/// by case-insensitive substring containment against the role string; every
/// matching row contributes (OR-combined).
const ROLE_KEYWORD_ROWS: [(&[&str], &[&str]); 11] = [
    (
        &["data scientist"],
        &["genai", "llm", "vector databases", "retrieval", "rag", "agents"],
    ),
    (
        &["data engineer"],
        &["data pipelines", "streaming", "lakehouse", "spark", "airflow"],
    ),
    (
        &["machine learning", "ml engineer"],
        &["mlops", "model serving", "fine-tuning", "inference"],
    ),
    (
        &["security"],
        &["zero trust", "ai security", "supply chain security"],
    ),
    (
        &["frontend", "front-end"],
        &["webassembly", "edge rendering", "design systems"],
    ),
    (
        &["backend", "back-end"],
        &["distributed systems", "event driven", "grpc"],
    ),
    (
        &["devops", "sre", "site reliability"],
        &["platform engineering", "observability", "gitops"],
    ),
    (&["cloud"], &["serverless", "finops", "multi cloud"]),
    (
        &["product"],
        &["ai products", "product analytics", "experimentation"],
    ),
    (&["mobile"], &["cross platform", "on device ai"]),
    (
        &["student"],
        &["internships", "entry level", "certifications"],
    ),
];

fn role_tokens(role: &str) -> impl Iterator<Item = &str> {
    role.split_whitespace()
}

/// Keywords contributed by the closed role table; empty when no row matches.
fn role_mapped_keywords(role: &str) -> Vec<&'static str> {
    let folded = role.to_lowercase();
    let mut out = Vec::new();
    for (patterns, keywords) in ROLE_KEYWORD_ROWS.iter() {
        if patterns.iter().any(|p| folded.contains(p)) {
            out.extend_from_slice(keywords);
        }
    }
    out
}

/// General/industry keywords: union of skills, interests, and role tokens,
/// capped at 12. An explicit `query`/`q` override is used as-is (bounded
/// only by the raw CSV ceiling). MAY be empty, meaning "no personalization
/// filter".
pub fn general_keywords(prefs: &Preferences) -> KeywordSet {
    if !prefs.query_override.is_empty() {
        let mut set = KeywordSet::with_cap(CSV_TOKEN_CAP);
        set.extend(&prefs.query_override);
        return set;
    }

    let mut set = KeywordSet::with_cap(GENERAL_CAP);
    set.extend(&prefs.skills);
    set.extend(&prefs.interests);
    if let Some(role) = &prefs.role {
        set.extend(role_tokens(role));
    }
    set
}

/// Policy/regulation keywords: curated baseline plus interest and role
/// tokens, capped at 24. Never empty on the derived path.
pub fn policy_keywords(prefs: &Preferences) -> KeywordSet {
    if !prefs.policy_override.is_empty() {
        let mut set = KeywordSet::with_cap(CSV_TOKEN_CAP);
        set.extend(&prefs.policy_override);
        return set;
    }

    let mut set = KeywordSet::with_cap(POLICY_CAP);
    set.extend(POLICY_BASELINE);
    set.extend(&prefs.interests);
    if let Some(role) = &prefs.role {
        set.extend(role_tokens(role));
    }
    set
}

/// Emerging-technology keywords: curated defaults plus role-mapped
/// additions, capped at 30. Never empty on the derived path.
pub fn emerging_keywords(prefs: &Preferences) -> KeywordSet {
    if !prefs.emerging_override.is_empty() {
        let mut set = KeywordSet::with_cap(CSV_TOKEN_CAP);
        set.extend(&prefs.emerging_override);
        return set;
    }

    let mut set = KeywordSet::with_cap(EMERGING_CAP);
    // Role additions first: the curated defaults alone would fill the cap.
    if let Some(role) = &prefs.role {
        set.extend(role_mapped_keywords(role));
    }
    set.extend(EMERGING_DEFAULTS);
    set
}
