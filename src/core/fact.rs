//! Fact - Core data structure
//!
//! A fact is the fundamental unit of memory in trove.
//!
//! # Key Properties
//! - **id**: ULID (sortable, unique, never reused)
//! - **provenance**: how the fact was learned (kind, actor, context, time)
//! - **trust**: 0.0-1.0 reliability plus the rationale trail
//! - **relevance**: 0.0-1.0 time/usage-decayed importance, independent of trust
//!
//! Identity, provenance kind and category are fixed at creation. Everything
//! else changes through [`FactPatch`], which re-applies the invariants.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::decay::DecayConfig;
use super::text::unit;
use super::trust::TrustModel;

pub type FactId = Ulid;

/// How a fact was learned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvenanceKind {
    /// Lived through it
    Experienced,
    /// Another actor said so
    Told,
    /// Read it somewhere
    Read,
    /// Reasoned it out
    Inferred,
    /// Saw it happen
    Observed,
}

impl std::fmt::Display for ProvenanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvenanceKind::Experienced => write!(f, "experienced"),
            ProvenanceKind::Told => write!(f, "told"),
            ProvenanceKind::Read => write!(f, "read"),
            ProvenanceKind::Inferred => write!(f, "inferred"),
            ProvenanceKind::Observed => write!(f, "observed"),
        }
    }
}

impl std::str::FromStr for ProvenanceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "experienced" => Ok(ProvenanceKind::Experienced),
            "told" => Ok(ProvenanceKind::Told),
            "read" => Ok(ProvenanceKind::Read),
            "inferred" => Ok(ProvenanceKind::Inferred),
            "observed" => Ok(ProvenanceKind::Observed),
            _ => anyhow::bail!("Unknown provenance kind: {}", s),
        }
    }
}

/// Fact category, drives the default decay rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Fact,
    Event,
    Opinion,
    Preference,
    Procedure,
    Relationship,
    Observation,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Fact,
        Category::Event,
        Category::Opinion,
        Category::Preference,
        Category::Procedure,
        Category::Relationship,
        Category::Observation,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Fact => "fact",
            Category::Event => "event",
            Category::Opinion => "opinion",
            Category::Preference => "preference",
            Category::Procedure => "procedure",
            Category::Relationship => "relationship",
            Category::Observation => "observation",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.to_string() == s.to_lowercase())
            .ok_or_else(|| anyhow::anyhow!("Unknown category: {}", s))
    }
}

/// Where a fact came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub kind: ProvenanceKind,

    /// Who it came from (person, agent, tool)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    /// The situation it was learned in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    pub learned_at: DateTime<Utc>,
}

impl Provenance {
    pub fn new(kind: ProvenanceKind) -> Self {
        Self {
            kind,
            actor: None,
            context: None,
            learned_at: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into()).filter(|a: &String| !a.trim().is_empty());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into()).filter(|c: &String| !c.trim().is_empty());
        self
    }
}

/// Computed reliability of a fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trust {
    pub score: f64,
    #[serde(default)]
    pub rationale: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_confirmed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub support_count: u32,
    #[serde(default)]
    pub conflict_count: u32,
}

/// Creation and usage timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    #[serde(default)]
    pub use_count: u32,
}

/// A fact - the fundamental unit of memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub id: FactId,

    /// The thing remembered
    pub content: String,

    /// First sentence or truncated prefix of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    pub provenance: Provenance,

    pub trust: Trust,

    pub category: Category,

    /// Linked entity identifiers
    #[serde(default)]
    pub links: BTreeSet<String>,

    pub lifecycle: Lifecycle,

    pub decay_rate: f64,

    pub relevance: f64,

    #[serde(default)]
    pub protected: bool,

    /// Externally supplied embedding
    #[serde(default, skip_serializing)]
    pub embedding: Option<Vec<f32>>,
}

/// Partial update of a fact's mutable fields
#[derive(Debug, Clone, Default)]
pub struct FactPatch {
    pub content: Option<String>,
    pub summary: Option<Option<String>>,
    pub links: Option<BTreeSet<String>>,
    pub trust_score: Option<f64>,
    /// Appended to the rationale trail
    pub rationale: Vec<String>,
    pub last_confirmed: Option<DateTime<Utc>>,
    pub support_count: Option<u32>,
    pub conflict_count: Option<u32>,
    pub decay_rate: Option<f64>,
    pub relevance: Option<f64>,
    pub protected: Option<bool>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub use_count: Option<u32>,
    pub embedding: Option<Option<Vec<f32>>>,
}

impl Fact {
    /// Create a new fact with calculated initial trust and the category's default decay rate
    pub fn new(content: impl Into<String>, category: Category, provenance: Provenance) -> Self {
        Self::with_model(
            content,
            category,
            provenance,
            &TrustModel::new(),
            &DecayConfig::default(),
        )
    }

    /// Create a new fact using explicit calibrations
    pub fn with_model(
        content: impl Into<String>,
        category: Category,
        provenance: Provenance,
        trust_model: &TrustModel,
        decay: &DecayConfig,
    ) -> Self {
        let now = Utc::now();
        let initial = trust_model.initial_trust(provenance.kind, provenance.context.is_some());

        let mut fact = Self {
            id: Ulid::new(),
            content: content.into(),
            summary: None,
            provenance,
            trust: Trust {
                score: initial.score,
                rationale: initial.rationale,
                last_confirmed: None,
                support_count: 0,
                conflict_count: 0,
            },
            category,
            links: BTreeSet::new(),
            lifecycle: Lifecycle {
                created_at: now,
                updated_at: now,
                last_used_at: now,
                use_count: 0,
            },
            decay_rate: unit(decay.rate_for(category)),
            relevance: 1.0,
            protected: false,
            embedding: None,
        };
        fact.generate_summary(150);
        fact
    }

    /// Set linked entities
    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links = links
            .into_iter()
            .map(Into::into)
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        self
    }

    /// Override the category's decay rate
    pub fn with_decay_rate(mut self, rate: f64) -> Self {
        self.decay_rate = unit(rate);
        self
    }

    /// Mark as protected from decay
    pub fn protected(mut self) -> Self {
        self.protected = true;
        self.relevance = 1.0;
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Apply a patch, re-establishing the invariants
    ///
    /// Scores are clamped to [0, 1], counters never go backwards and a
    /// protected fact always has full relevance.
    pub fn apply(&mut self, patch: FactPatch, now: DateTime<Utc>) {
        if let Some(content) = patch.content {
            self.content = content;
            self.generate_summary(150);
        }
        if let Some(summary) = patch.summary {
            self.summary = summary;
        }
        if let Some(links) = patch.links {
            self.links = links;
        }
        if let Some(score) = patch.trust_score {
            self.trust.score = unit(score);
        }
        self.trust.rationale.extend(patch.rationale);
        if let Some(at) = patch.last_confirmed {
            self.trust.last_confirmed = Some(at);
        }
        if let Some(n) = patch.support_count {
            self.trust.support_count = self.trust.support_count.max(n);
        }
        if let Some(n) = patch.conflict_count {
            self.trust.conflict_count = self.trust.conflict_count.max(n);
        }
        if let Some(rate) = patch.decay_rate {
            self.decay_rate = unit(rate);
        }
        if let Some(relevance) = patch.relevance {
            self.relevance = unit(relevance);
        }
        if let Some(protected) = patch.protected {
            self.protected = protected;
        }
        if let Some(at) = patch.last_used_at {
            self.lifecycle.last_used_at = at;
        }
        if let Some(n) = patch.use_count {
            self.lifecycle.use_count = self.lifecycle.use_count.max(n);
        }
        if let Some(embedding) = patch.embedding {
            self.embedding = embedding;
        }

        if self.protected {
            self.relevance = 1.0;
        }
        self.lifecycle.updated_at = now;
    }

    /// Generate summary from content (first sentence or first N chars)
    pub fn generate_summary(&mut self, max_chars: usize) {
        let content = self.content.trim();

        if let Some(end) = content.find(['.', '!', '?']) {
            if end < max_chars {
                self.summary = Some(content[..=end].to_string());
                return;
            }
        }

        if content.chars().count() <= max_chars {
            self.summary = Some(content.to_string());
        } else {
            let truncated: String = content.chars().take(max_chars).collect();
            match truncated.rfind(' ') {
                Some(last_space) => self.summary = Some(format!("{}...", &truncated[..last_space])),
                None => self.summary = Some(format!("{}...", truncated)),
            }
        }
    }

    /// Whether the fact has decayed below the archive threshold
    pub fn is_archived(&self, threshold: f64) -> bool {
        !self.protected && self.relevance < threshold
    }

    /// Get short ID (first 10 chars)
    pub fn short_id(&self) -> String {
        self.id.to_string()[..10].to_lowercase()
    }
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview: String = self.content.chars().take(60).collect();
        write!(
            f,
            "[{}] ({}, {}) {}",
            self.short_id(),
            self.category,
            self.provenance.kind,
            preview
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn told(actor: &str) -> Provenance {
        Provenance::new(ProvenanceKind::Told).with_actor(actor)
    }

    #[test]
    fn test_new_fact_told_without_context() {
        let fact = Fact::new("Shaun prefers tea", Category::Preference, told("shaun"));

        assert_eq!(fact.trust.score, 0.60);
        assert_eq!(fact.relevance, 1.0);
        assert_eq!(fact.trust.support_count, 0);
        assert_eq!(fact.lifecycle.use_count, 0);
        assert_eq!(fact.provenance.actor.as_deref(), Some("shaun"));
    }

    #[test]
    fn test_new_fact_with_context() {
        let fact = Fact::new(
            "Shaun prefers tea",
            Category::Preference,
            told("shaun").with_context("morning standup"),
        );
        assert_eq!(fact.trust.score, 0.65);
        assert_eq!(fact.trust.rationale.last().unwrap(), "has source context");
    }

    #[test]
    fn test_blank_context_is_ignored() {
        let provenance = told("shaun").with_context("   ");
        assert!(provenance.context.is_none());
    }

    #[test]
    fn test_category_default_decay_rate() {
        let fact = Fact::new("x", Category::Fact, told("a"));
        assert_eq!(fact.decay_rate, DecayConfig::default().rate_for(Category::Fact));

        let custom = Fact::new("x", Category::Event, told("a")).with_decay_rate(1.7);
        assert_eq!(custom.decay_rate, 1.0);
    }

    #[test]
    fn test_links_are_unique() {
        let fact = Fact::new("x", Category::Fact, told("a")).with_links(["svc", "svc", " db ", ""]);
        assert_eq!(fact.links.len(), 2);
        assert!(fact.links.contains("db"));
    }

    #[test]
    fn test_apply_clamps_scores() {
        let mut fact = Fact::new("x", Category::Fact, told("a"));
        fact.apply(
            FactPatch {
                trust_score: Some(1.8),
                relevance: Some(-0.5),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(fact.trust.score, 1.0);
        assert_eq!(fact.relevance, 0.0);
    }

    #[test]
    fn test_apply_counters_never_decrease() {
        let mut fact = Fact::new("x", Category::Fact, told("a"));
        fact.trust.support_count = 3;
        fact.apply(
            FactPatch {
                support_count: Some(1),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(fact.trust.support_count, 3);
    }

    #[test]
    fn test_protected_keeps_full_relevance() {
        let mut fact = Fact::new("x", Category::Fact, told("a")).protected();
        fact.apply(
            FactPatch {
                relevance: Some(0.2),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(fact.relevance, 1.0);
    }

    #[test]
    fn test_apply_appends_rationale() {
        let mut fact = Fact::new("x", Category::Fact, told("a"));
        let before = fact.trust.rationale.len();
        fact.apply(
            FactPatch {
                rationale: vec!["checked".to_string()],
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(fact.trust.rationale.len(), before + 1);
    }

    #[test]
    fn test_generate_summary() {
        let fact = Fact::new(
            "This is the first sentence. This is the second.",
            Category::Fact,
            told("a"),
        );
        assert_eq!(fact.summary.as_deref(), Some("This is the first sentence."));
    }

    #[test]
    fn test_generate_summary_long_content() {
        let long_content = "This is a very long piece of content that exceeds the maximum character limit and should be truncated at a word boundary to avoid cutting words";
        let mut fact = Fact::new(long_content, Category::Fact, told("a"));
        fact.generate_summary(50);

        let summary = fact.summary.unwrap();
        assert!(summary.len() <= 53);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("told".parse::<ProvenanceKind>().unwrap(), ProvenanceKind::Told);
        assert_eq!("OBSERVED".parse::<ProvenanceKind>().unwrap(), ProvenanceKind::Observed);
        assert!("rumour".parse::<ProvenanceKind>().is_err());
    }

    #[test]
    fn test_category_round_trip_names() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
        assert!("gossip".parse::<Category>().is_err());
    }

    #[test]
    fn test_unique_ids() {
        let a = Fact::new("x", Category::Fact, told("a"));
        let b = Fact::new("x", Category::Fact, told("a"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_display() {
        let fact = Fact::new("API timeout is 30 seconds", Category::Fact, told("a"));
        let display = fact.to_string();
        assert!(display.contains("fact"));
        assert!(display.contains("told"));
        assert!(display.contains("API timeout"));
    }
}
