//! Recall - ranked retrieval
//!
//! Candidates come from up to four channels (lexical, semantic, entity,
//! category). Channel scores are fused into a match score, which is then
//! weighted by trust, relevance and the overlap between the query context
//! and the context the fact was learned in.
//!
//! Recall never writes; callers record use through `FactStore::mark_used`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::embedding::{cosine_similarity, EmbeddingProvider};
use super::error::MemoryError;
use super::fact::{Category, Fact, FactId};
use super::store::FactStore;
use super::text::{tokens, words};

/// Recall configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    /// Upper bound on facts pulled from each channel
    pub candidate_limit: usize,
    /// Cosine similarity a fact must exceed to join via the semantic channel
    pub semantic_threshold: f64,
    /// Results scoring below this are dropped
    pub noise_floor: f64,
    /// Largest multiplier added for a fully shared context
    pub context_boost: f64,
    pub default_min_trust: f64,
    pub default_min_relevance: f64,
    pub default_limit: usize,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 100,
            semantic_threshold: 0.5,
            noise_floor: 0.15,
            context_boost: 0.3,
            default_min_trust: 0.3,
            default_min_relevance: 0.1,
            default_limit: 10,
        }
    }
}

/// Recall query builder
#[derive(Debug, Clone, Serialize)]
pub struct RecallQuery {
    pub text: String,

    /// Situation the caller is in; boosts facts learned in a similar one
    pub context: Option<String>,

    /// Facts linked to these entities become candidates
    pub entity_filter: Vec<String>,

    /// Facts in these categories become candidates
    pub category_filter: Vec<Category>,

    pub min_trust: f64,
    pub min_relevance: f64,
    pub limit: usize,

    /// Keep facts below `min_relevance`
    pub include_archived: bool,
}

impl Default for RecallQuery {
    fn default() -> Self {
        let config = RecallConfig::default();
        Self {
            text: String::new(),
            context: None,
            entity_filter: Vec::new(),
            category_filter: Vec::new(),
            min_trust: config.default_min_trust,
            min_relevance: config.default_min_relevance,
            limit: config.default_limit,
            include_archived: false,
        }
    }
}

impl RecallQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into()).filter(|c: &String| !c.trim().is_empty());
        self
    }

    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entity_filter = entities;
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.category_filter = categories;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_min_trust(mut self, min_trust: f64) -> Self {
        self.min_trust = min_trust;
        self
    }

    pub fn with_min_relevance(mut self, min_relevance: f64) -> Self {
        self.min_relevance = min_relevance;
        self
    }

    pub fn include_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    /// Clamp thresholds into [0, 1] and replace a zero limit
    pub fn validated(mut self, default_limit: usize) -> Result<Self> {
        for (name, value) in [("min_trust", self.min_trust), ("min_relevance", self.min_relevance)] {
            if value.is_nan() {
                return Err(MemoryError::InvalidInput(format!("{} is not a number", name)).into());
            }
        }
        self.min_trust = self.min_trust.clamp(0.0, 1.0);
        self.min_relevance = self.min_relevance.clamp(0.0, 1.0);
        if self.limit == 0 {
            self.limit = default_limit;
        }
        Ok(self)
    }
}

/// Per-channel scores of one candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ChannelScores {
    pub lexical: f64,
    pub semantic: f64,
    pub entity: f64,
}

impl ChannelScores {
    /// Fuse channels into a single match score
    pub fn fused(&self) -> f64 {
        if self.semantic > 0.0 {
            0.5 * self.semantic + 0.3 * self.lexical + 0.2 * self.entity
        } else {
            0.7 * self.lexical + 0.3 * self.entity
        }
    }
}

/// Recall result with scores
#[derive(Debug, Clone, Serialize)]
pub struct RecallResult {
    pub fact: Fact,
    pub channels: ChannelScores,
    pub match_score: f64,
    pub final_score: f64,
}

/// Lexical score of `fact` for the given query
///
/// Each term longer than two characters scores 1.0 when found in the content
/// or 0.5 when only found in the summary. A content hit on the whole query
/// adds one point per term. Normalised by twice the term count.
pub fn lexical_score(query: &str, fact: &Fact) -> f64 {
    let terms: Vec<String> = words(query)
        .into_iter()
        .filter(|t| t.chars().count() > 2)
        .collect();
    if terms.is_empty() {
        return 0.0;
    }

    let content = fact.content.to_lowercase();
    let summary = fact.summary.as_deref().unwrap_or_default().to_lowercase();

    let mut score: f64 = terms
        .iter()
        .map(|t| {
            if content.contains(t.as_str()) {
                1.0
            } else if summary.contains(t.as_str()) {
                0.5
            } else {
                0.0
            }
        })
        .sum();

    let phrase = query.trim().to_lowercase();
    if !phrase.is_empty() && content.contains(&phrase) {
        score += terms.len() as f64;
    }

    (score / (2.0 * terms.len() as f64)).min(1.0)
}

/// Multiplier for facts learned in a context resembling the query's
pub fn context_boost(query_context: Option<&str>, fact: &Fact, max_boost: f64) -> f64 {
    let (Some(query_context), Some(fact_context)) = (query_context, fact.provenance.context.as_deref())
    else {
        return 1.0;
    };

    let wanted = tokens(query_context, 3);
    if wanted.is_empty() {
        return 1.0;
    }
    let shared = wanted.intersection(&tokens(fact_context, 3)).count();
    1.0 + max_boost * shared as f64 / wanted.len() as f64
}

/// Order by final score, then trust, then most recent
fn rank(results: &mut [RecallResult]) {
    results.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.fact
                    .trust
                    .score
                    .partial_cmp(&a.fact.trust.score)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| b.fact.lifecycle.created_at.cmp(&a.fact.lifecycle.created_at))
    });
}

/// Recall engine
#[derive(Debug, Clone)]
pub struct RecallEngine {
    config: RecallConfig,
    provider_timeout: Duration,
}

impl Default for RecallEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecallEngine {
    pub fn new() -> Self {
        Self {
            config: RecallConfig::default(),
            provider_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_config(config: RecallConfig) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    /// Bound on a single embedding call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn config(&self) -> &RecallConfig {
        &self.config
    }

    /// Full recall across every channel
    ///
    /// The query embedding is fetched first. If the provider fails or times
    /// out, recall continues without the semantic channel.
    pub async fn recall(
        &self,
        store: &dyn FactStore,
        provider: Option<&dyn EmbeddingProvider>,
        query: RecallQuery,
    ) -> Result<Vec<RecallResult>> {
        let query = query.validated(self.config.default_limit)?;
        if query.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = match provider {
            Some(provider) => self.embed_query(provider, &query.text).await,
            None => None,
        };

        let mut candidates = self.lexical_candidates(store, &query)?;

        for entity in &query.entity_filter {
            for fact in store.facts_for_entity(entity, self.config.candidate_limit)? {
                let (_, scores) = candidates
                    .entry(fact.id)
                    .or_insert_with(|| (fact, ChannelScores::default()));
                scores.entity = 1.0;
            }
        }

        for category in &query.category_filter {
            for fact in store.search_by_category(*category, self.config.candidate_limit)? {
                candidates
                    .entry(fact.id)
                    .or_insert_with(|| (fact, ChannelScores::default()));
            }
        }

        if let Some(query_embedding) = query_embedding {
            for (id, embedding) in store.all_embeddings()? {
                let similarity = cosine_similarity(&query_embedding, &embedding);
                if similarity <= self.config.semantic_threshold {
                    continue;
                }
                if let Some((_, scores)) = candidates.get_mut(&id) {
                    scores.semantic = similarity;
                } else if let Some(fact) = store.get_fact(&id)? {
                    let scores = ChannelScores {
                        semantic: similarity,
                        ..Default::default()
                    };
                    candidates.insert(id, (fact, scores));
                }
            }
        }

        // Category and entity candidates still earn lexical credit
        for (fact, scores) in candidates.values_mut() {
            scores.lexical = lexical_score(&query.text, fact);
        }

        debug!(candidates = candidates.len(), "recall candidates gathered");
        Ok(self.finish(candidates.into_values(), &query))
    }

    /// Lexical-only recall, for when no embedding provider is configured
    pub fn quick_recall(&self, store: &dyn FactStore, query: RecallQuery) -> Result<Vec<RecallResult>> {
        let query = query.validated(self.config.default_limit)?;
        if query.text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let candidates = self.lexical_candidates(store, &query)?;
        Ok(self.finish(candidates.into_values(), &query))
    }

    /// Every fact linked to `entity`, scored by trust and relevance alone
    pub fn entity_recall(
        &self,
        store: &dyn FactStore,
        entity: &str,
        limit: usize,
    ) -> Result<Vec<RecallResult>> {
        let mut results: Vec<RecallResult> = store
            .facts_for_entity(entity, usize::MAX)?
            .into_iter()
            .map(|fact| {
                let final_score = fact.trust.score * fact.relevance;
                RecallResult {
                    fact,
                    channels: ChannelScores {
                        entity: 1.0,
                        ..Default::default()
                    },
                    match_score: 1.0,
                    final_score,
                }
            })
            .collect();

        rank(&mut results);
        results.truncate(limit);
        Ok(results)
    }

    async fn embed_query(&self, provider: &dyn EmbeddingProvider, text: &str) -> Option<Vec<f32>> {
        match tokio::time::timeout(self.provider_timeout, provider.embed(text)).await {
            Ok(Ok(embedding)) => Some(embedding),
            Ok(Err(e)) => {
                warn!("Embedding provider failed, using lexical recall: {:#}", e);
                None
            }
            Err(_) => {
                warn!(
                    "Embedding provider timed out after {:?}, using lexical recall",
                    self.provider_timeout
                );
                None
            }
        }
    }

    fn lexical_candidates(
        &self,
        store: &dyn FactStore,
        query: &RecallQuery,
    ) -> Result<HashMap<FactId, (Fact, ChannelScores)>> {
        Ok(store
            .search_by_text(&query.text, self.config.candidate_limit)?
            .into_iter()
            .map(|fact| {
                let scores = ChannelScores {
                    lexical: lexical_score(&query.text, &fact),
                    ..Default::default()
                };
                (fact.id, (fact, scores))
            })
            .collect())
    }

    /// Score, filter, rank and truncate
    fn finish(
        &self,
        candidates: impl Iterator<Item = (Fact, ChannelScores)>,
        query: &RecallQuery,
    ) -> Vec<RecallResult> {
        let mut results: Vec<RecallResult> = candidates
            .filter(|(fact, _)| fact.trust.score >= query.min_trust)
            .filter(|(fact, _)| query.include_archived || fact.relevance >= query.min_relevance)
            .map(|(fact, channels)| {
                let match_score = channels.fused();
                let boost = context_boost(query.context.as_deref(), &fact, self.config.context_boost);
                let final_score = match_score * fact.trust.score * fact.relevance * boost;
                RecallResult {
                    fact,
                    channels,
                    match_score,
                    final_score,
                }
            })
            .filter(|r| r.final_score >= self.config.noise_floor)
            .collect();

        rank(&mut results);
        results.truncate(query.limit);
        results
    }
}
