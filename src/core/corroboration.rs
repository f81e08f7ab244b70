//! Corroboration & Contradiction Detector
//!
//! Two small rule engines decide how a pair of facts relates:
//! - [`independence`]: do the two facts come from separable sources?
//! - [`conflict`]: does one fact negate the other?
//!
//! The [`Detector`] gathers candidates from the store, runs the rules and
//! writes every resulting score change in one transaction.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::fact::{Fact, FactId, FactPatch};
use super::store::FactStore;
use super::text::{jaccard, round2, tokens, words};
use super::trust::TrustModel;

/// Antonym and negation pairs; matching is on whole words
const OPPOSITES: &[(&str, &str)] = &[
    ("is", "isn't"),
    ("is", "is not"),
    ("are", "aren't"),
    ("are", "are not"),
    ("can", "cannot"),
    ("can", "can't"),
    ("does", "doesn't"),
    ("enabled", "disabled"),
    ("true", "false"),
    ("works", "doesn't work"),
    ("works", "does not work"),
    ("yes", "no"),
    ("always", "never"),
    ("should", "shouldn't"),
    ("will", "won't"),
    ("allowed", "forbidden"),
    ("valid", "invalid"),
    ("available", "unavailable"),
    ("success", "failure"),
];

/// Corroboration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorroborationConfig {
    /// Words longer than this find text candidates
    pub significant_token_len: usize,
    /// Words longer than this count towards similarity
    pub similarity_token_len: usize,
    /// Similarity above which an independent source corroborates
    pub corroboration_threshold: f64,
    /// Boost scale before source weighting
    pub boost_factor: f64,
    /// Diminishing returns per prior supporter
    pub support_dampening: f64,
    /// Similarity above which an antonym pair counts as a contradiction
    pub contradiction_threshold: f64,
    /// Similarity above which a candidate supports a verified fact
    pub verify_threshold: f64,
    /// Score added per supporting candidate on verification
    pub verify_step: f64,
    /// Upper bound on candidates gathered per channel
    pub candidate_limit: usize,
}

impl Default for CorroborationConfig {
    fn default() -> Self {
        Self {
            significant_token_len: 4,
            similarity_token_len: 3,
            corroboration_threshold: 0.5,
            boost_factor: 0.1,
            support_dampening: 0.3,
            contradiction_threshold: 0.3,
            verify_threshold: 0.4,
            verify_step: 0.05,
            candidate_limit: 100,
        }
    }
}

/// Whether two facts come from separable sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Independence {
    Independent(String),
    Dependent,
}

/// Whether two facts negate each other
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    NoConflict,
    Conflict(String),
}

/// A trust change caused by corroboration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrustAdjustment {
    pub fact_id: FactId,
    pub old_score: f64,
    pub new_score: f64,
    pub reason: String,
}

/// Two facts flagged as contradicting each other
#[derive(Debug, Clone, Serialize)]
pub struct ContradictionPair {
    pub fact_a: Fact,
    pub fact_b: Fact,
    pub similarity: f64,
    pub reason: String,
}

/// Outcome of verifying one fact against the rest of memory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub verified: bool,
    pub evidence: Vec<String>,
    /// Supporters not seen by an earlier confirmation
    pub new_support: usize,
    pub new_score: f64,
}

/// Decide whether two facts come from independent sources
///
/// Independent when the provenance kinds differ, or both name an actor and
/// the actors differ, or both name a context and the contexts differ.
pub fn independence(a: &Fact, b: &Fact) -> Independence {
    let (pa, pb) = (&a.provenance, &b.provenance);

    if pa.kind != pb.kind {
        return Independence::Independent(format!("{} vs {}", pa.kind, pb.kind));
    }
    if let (Some(x), Some(y)) = (&pa.actor, &pb.actor) {
        if !x.eq_ignore_ascii_case(y) {
            return Independence::Independent(format!("actor {} vs {}", x, y));
        }
    }
    if let (Some(x), Some(y)) = (&pa.context, &pb.context) {
        if x.trim() != y.trim() {
            return Independence::Independent("different contexts".to_string());
        }
    }
    Independence::Dependent
}

/// Decide whether two texts contradict each other via the opposites table
///
/// Fires only when one text holds exactly one side of a pair, the other text
/// holds exactly the opposite side, and their similarity exceeds `threshold`.
pub fn conflict(a: &str, b: &str, token_len: usize, threshold: f64) -> Conflict {
    let similarity = jaccard(&tokens(a, token_len), &tokens(b, token_len));
    if similarity <= threshold {
        return Conflict::NoConflict;
    }

    let (wa, wb) = (words(a), words(b));
    for (left, right) in OPPOSITES {
        let sides_a = sides(&wa, left, right);
        let sides_b = sides(&wb, left, right);
        let found = match (sides_a, sides_b) {
            ((true, false), (false, true)) => Some((left, right)),
            ((false, true), (true, false)) => Some((right, left)),
            _ => None,
        };
        if let Some((x, y)) = found {
            return Conflict::Conflict(format!(
                "\"{}\" vs \"{}\" ({:.0}% similar)",
                x,
                y,
                similarity * 100.0
            ));
        }
    }
    Conflict::NoConflict
}

/// Which sides of an opposite pair occur in `words`
///
/// The longer phrase claims its words first so "is not" never also counts
/// as "is".
fn sides(words: &[String], left: &str, right: &str) -> (bool, bool) {
    let left: Vec<&str> = left.split(' ').collect();
    let right: Vec<&str> = right.split(' ').collect();
    let mut claimed = vec![false; words.len()];

    let (long, short, left_is_long) = if left.len() >= right.len() {
        (&left, &right, true)
    } else {
        (&right, &left, false)
    };

    let long_found = claim(words, long, &mut claimed);
    let short_found = claim(words, short, &mut claimed);

    if left_is_long {
        (long_found, short_found)
    } else {
        (short_found, long_found)
    }
}

fn claim(words: &[String], phrase: &[&str], claimed: &mut [bool]) -> bool {
    if phrase.is_empty() || words.len() < phrase.len() {
        return false;
    }
    let mut found = false;
    for start in 0..=words.len() - phrase.len() {
        let window = start..start + phrase.len();
        if claimed[window.clone()].iter().any(|c| *c) {
            continue;
        }
        if words[window.clone()].iter().zip(phrase).all(|(w, p)| w.as_str() == *p) {
            claimed[window].iter_mut().for_each(|c| *c = true);
            found = true;
        }
    }
    found
}

/// Corroboration and contradiction detector
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: CorroborationConfig,
    trust: TrustModel,
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CorroborationConfig, trust: TrustModel) -> Self {
        Self { config, trust }
    }

    fn similarity(&self, a: &Fact, b: &Fact) -> f64 {
        let len = self.config.similarity_token_len;
        jaccard(&tokens(&a.content, len), &tokens(&b.content, len))
    }

    /// Facts sharing an entity link or a significant word with `fact`
    fn candidates(&self, store: &dyn FactStore, fact: &Fact) -> anyhow::Result<Vec<Fact>> {
        let limit = self.config.candidate_limit;
        let mut seen: HashSet<FactId> = HashSet::from([fact.id]);
        let mut out = Vec::new();

        for entity in &fact.links {
            for c in store.facts_for_entity(entity, limit)? {
                if seen.insert(c.id) {
                    out.push(c);
                }
            }
        }

        let significant = tokens(&fact.content, self.config.significant_token_len);
        if !significant.is_empty() {
            let query = significant.iter().cloned().collect::<Vec<_>>().join(" ");
            for c in store.search_by_text(&query, limit)? {
                let shares_word = !tokens(&c.content, self.config.significant_token_len)
                    .is_disjoint(&significant);
                if shares_word && seen.insert(c.id) {
                    out.push(c);
                }
            }
        }

        debug!(id = %fact.id, candidates = out.len(), "gathered candidates");
        Ok(out)
    }

    /// Raise trust on existing facts that `new_fact` independently agrees with
    pub fn check_corroboration(
        &self,
        store: &dyn FactStore,
        new_fact: &Fact,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<TrustAdjustment>> {
        let weight = self.trust.source_weight(new_fact.provenance.kind);
        let mut adjustments = Vec::new();
        let mut updates = Vec::new();

        for c in self.candidates(store, new_fact)? {
            if independence(new_fact, &c) == Independence::Dependent {
                continue;
            }
            let similarity = self.similarity(new_fact, &c);
            if similarity <= self.config.corroboration_threshold {
                continue;
            }

            let boost = similarity * self.config.boost_factor * weight
                / (1.0 + c.trust.support_count as f64 * self.config.support_dampening);
            let new_score = (c.trust.score + boost).min(1.0);
            let reason = format!(
                "corroborated by {} source ({:.0}% similar)",
                new_fact.provenance.kind,
                similarity * 100.0
            );

            updates.push((
                c.id,
                FactPatch {
                    trust_score: Some(new_score),
                    support_count: Some(c.trust.support_count + 1),
                    last_confirmed: Some(now),
                    rationale: vec![reason.clone()],
                    ..Default::default()
                },
            ));
            adjustments.push(TrustAdjustment {
                fact_id: c.id,
                old_score: c.trust.score,
                new_score: round2(new_score),
                reason,
            });
        }

        store.update_facts(&updates)?;
        if !adjustments.is_empty() {
            info!("{} fact(s) corroborated by {}", adjustments.len(), new_fact.id);
        }
        Ok(adjustments)
    }

    /// Scan the corpus for contradicting pairs, flagging at most `limit`
    ///
    /// Pairs flagged by an earlier scan are skipped, so only new pairs are
    /// returned and counted.
    pub fn find_contradictions(
        &self,
        store: &dyn FactStore,
        limit: usize,
    ) -> anyhow::Result<Vec<ContradictionPair>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let corpus = store.all_facts(None)?;
        let recorded = store.contradiction_pairs()?;
        let mut pairs: Vec<ContradictionPair> = Vec::new();

        'outer: for (i, a) in corpus.iter().enumerate() {
            for b in &corpus[i + 1..] {
                if a.category != b.category || a.links.is_disjoint(&b.links) {
                    continue;
                }
                if recorded.contains(&(a.id.min(b.id), a.id.max(b.id))) {
                    debug!("{} and {} already flagged", a.id, b.id);
                    continue;
                }
                let Conflict::Conflict(reason) = conflict(
                    &a.content,
                    &b.content,
                    self.config.similarity_token_len,
                    self.config.contradiction_threshold,
                ) else {
                    continue;
                };

                pairs.push(ContradictionPair {
                    fact_a: a.clone(),
                    fact_b: b.clone(),
                    similarity: self.similarity(a, b),
                    reason,
                });
                if pairs.len() >= limit {
                    break 'outer;
                }
            }
        }

        // A fact may appear in several pairs; fold its patches together
        let mut patches: BTreeMap<FactId, FactPatch> = BTreeMap::new();
        for pair in &pairs {
            for (this, other) in [(&pair.fact_a, &pair.fact_b), (&pair.fact_b, &pair.fact_a)] {
                let patch = patches.entry(this.id).or_insert_with(|| FactPatch {
                    conflict_count: Some(this.trust.conflict_count),
                    ..Default::default()
                });
                patch.conflict_count = patch.conflict_count.map(|n| n + 1);
                patch
                    .rationale
                    .push(format!("contradicted by {}: {}", other.id, pair.reason));
            }
        }
        let updates: Vec<_> = patches.into_iter().collect();
        let records: Vec<_> = pairs
            .iter()
            .map(|p| (p.fact_a.id, p.fact_b.id, p.reason.clone()))
            .collect();
        store.record_contradictions(&records, &updates)?;

        info!(
            "Contradiction scan: {} new pair(s) flagged, {} already on record",
            pairs.len(),
            recorded.len()
        );
        Ok(pairs)
    }

    /// Look for supporting facts and raise the score per new supporter
    ///
    /// Only supporters created after the fact was last confirmed raise the
    /// score; older ones are still listed as evidence. Returns `None` when
    /// the fact does not exist.
    pub fn verify(
        &self,
        store: &dyn FactStore,
        id: &FactId,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Verification>> {
        let Some(fact) = store.get_fact(id)? else {
            return Ok(None);
        };

        let mut evidence = Vec::new();
        let mut new_support = 0;
        for c in self.candidates(store, &fact)? {
            let similarity = self.similarity(&fact, &c);
            if similarity > self.config.verify_threshold {
                if fact
                    .trust
                    .last_confirmed
                    .map_or(true, |confirmed| c.lifecycle.created_at > confirmed)
                {
                    new_support += 1;
                }
                evidence.push(format!(
                    "{} ({}, {:.0}% similar): {}",
                    c.id,
                    c.provenance.kind,
                    similarity * 100.0,
                    c.content
                ));
            }
        }

        let verified = !evidence.is_empty();
        let new_score =
            round2((fact.trust.score + new_support as f64 * self.config.verify_step).min(1.0));

        if new_support > 0 {
            store.update_fact(
                id,
                FactPatch {
                    trust_score: Some(new_score),
                    last_confirmed: Some(now),
                    rationale: vec![format!("verified by {} new supporting fact(s)", new_support)],
                    ..Default::default()
                },
            )?;
        }

        Ok(Some(Verification {
            verified,
            evidence,
            new_support,
            new_score,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fact::{Category, Provenance, ProvenanceKind};
    use crate::core::storage::Storage;
    use ulid::Ulid;

    fn fact(content: &str, provenance: Provenance, links: &[&str]) -> Fact {
        Fact::new(content, Category::Fact, provenance).with_links(links.iter().copied())
    }

    fn told(actor: &str) -> Provenance {
        Provenance::new(ProvenanceKind::Told).with_actor(actor)
    }

    #[test]
    fn test_independence_rules() {
        let a = fact("x", told("shaun"), &[]);
        assert_eq!(independence(&a, &fact("x", told("shaun"), &[])), Independence::Dependent);
        assert!(matches!(
            independence(&a, &fact("x", told("maria"), &[])),
            Independence::Independent(_)
        ));
        assert!(matches!(
            independence(&a, &fact("x", Provenance::new(ProvenanceKind::Read), &[])),
            Independence::Independent(_)
        ));
        // Missing actor on one side is not evidence of independence
        assert_eq!(
            independence(&a, &fact("x", Provenance::new(ProvenanceKind::Told), &[])),
            Independence::Dependent
        );
        assert!(matches!(
            independence(
                &fact("x", told("shaun").with_context("standup"), &[]),
                &fact("x", told("shaun").with_context("retro"), &[])
            ),
            Independence::Independent(_)
        ));
    }

    #[test]
    fn test_conflict_enabled_disabled() {
        assert!(matches!(
            conflict("the service is enabled", "the service is disabled", 3, 0.3),
            Conflict::Conflict(_)
        ));
    }

    #[test]
    fn test_conflict_negation_phrase() {
        assert!(matches!(
            conflict("the payment webhook works", "the payment webhook doesn't work", 3, 0.3),
            Conflict::Conflict(_)
        ));
        assert!(matches!(
            conflict("the staging cluster is healthy", "the staging cluster is not healthy", 3, 0.3),
            Conflict::Conflict(_)
        ));
    }

    #[test]
    fn test_identical_statements_do_not_conflict() {
        assert_eq!(
            conflict("the cache is not shared", "the cache is not shared", 3, 0.3),
            Conflict::NoConflict
        );
    }

    #[test]
    fn test_yes_no_in_unrelated_facts() {
        assert_eq!(
            conflict(
                "yes, lunch orders close at noon",
                "no deployment happens during quarterly audits",
                3,
                0.3
            ),
            Conflict::NoConflict
        );
    }

    #[test]
    fn test_similar_without_antonyms() {
        assert_eq!(
            conflict("the service is enabled", "the service is enabled today", 3, 0.3),
            Conflict::NoConflict
        );
    }

    #[test]
    fn test_corroboration_raises_independent_fact() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        let a = fact("Deploys happen every Tuesday morning", told("shaun"), &["deploys"]);
        storage.create_fact(&a)?;

        let b = fact(
            "Deploys happen every Tuesday afternoon",
            Provenance::new(ProvenanceKind::Experienced),
            &["deploys"],
        );
        storage.create_fact(&b)?;

        let adjustments = Detector::new().check_corroboration(&storage, &b, Utc::now())?;
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].fact_id, a.id);
        assert!(adjustments[0].new_score > adjustments[0].old_score);

        let a = storage.get_fact(&a.id)?.unwrap();
        assert!(a.trust.score > 0.60);
        assert_eq!(a.trust.support_count, 1);
        assert!(a.trust.last_confirmed.is_some());
        assert!(a.trust.rationale.last().unwrap().contains("experienced"));
        Ok(())
    }

    #[test]
    fn test_corroboration_skips_same_source() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        let a = fact("Deploys happen every Tuesday morning", told("shaun"), &["deploys"]);
        let b = fact("Deploys happen every Tuesday morning", told("shaun"), &["deploys"]);
        storage.create_fact(&a)?;
        storage.create_fact(&b)?;

        let adjustments = Detector::new().check_corroboration(&storage, &b, Utc::now())?;
        assert!(adjustments.is_empty());
        assert_eq!(storage.get_fact(&a.id)?.unwrap().trust.support_count, 0);
        Ok(())
    }

    #[test]
    fn test_corroboration_has_diminishing_returns() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        let a = fact("Backups complete before midnight daily", told("shaun"), &["backups"]);
        storage.create_fact(&a)?;
        let detector = Detector::new();

        let first = fact(
            "Backups complete before midnight daily",
            Provenance::new(ProvenanceKind::Observed),
            &["backups"],
        );
        storage.create_fact(&first)?;
        let gain1 = detector.check_corroboration(&storage, &first, Utc::now())?[0].clone();

        let second = fact(
            "Backups complete before midnight daily",
            Provenance::new(ProvenanceKind::Observed).with_context("ops review"),
            &[],
        );
        storage.create_fact(&second)?;
        let gains = detector.check_corroboration(&storage, &second, Utc::now())?;
        let gain2 = gains.iter().find(|g| g.fact_id == a.id).unwrap();

        assert!(gain2.new_score - gain2.old_score < gain1.new_score - gain1.old_score);
        assert_eq!(storage.get_fact(&a.id)?.unwrap().trust.support_count, 2);
        Ok(())
    }

    #[test]
    fn test_find_contradictions_single_pair() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        let a = fact("the service is enabled", told("shaun"), &["svc"]);
        let b = fact("the service is disabled", told("maria"), &["svc"]);
        storage.create_fact(&a)?;
        storage.create_fact(&b)?;

        let pairs = Detector::new().find_contradictions(&storage, 10)?;
        assert_eq!(pairs.len(), 1);

        for id in [a.id, b.id] {
            let f = storage.get_fact(&id)?.unwrap();
            assert_eq!(f.trust.conflict_count, 1);
            assert!(f.trust.rationale.last().unwrap().starts_with("contradicted by"));
        }
        // Informational only: trust is untouched
        assert_eq!(storage.get_fact(&a.id)?.unwrap().trust.score, a.trust.score);
        Ok(())
    }

    #[test]
    fn test_rescan_does_not_recount_pairs() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        let a = fact("the service is enabled", told("shaun"), &["svc"]);
        let b = fact("the service is disabled", told("maria"), &["svc"]);
        storage.create_fact(&a)?;
        storage.create_fact(&b)?;

        let detector = Detector::new();
        assert_eq!(detector.find_contradictions(&storage, 10)?.len(), 1);
        assert!(detector.find_contradictions(&storage, 10)?.is_empty());
        assert!(detector.find_contradictions(&storage, 10)?.is_empty());

        let a = storage.get_fact(&a.id)?.unwrap();
        assert_eq!(a.trust.conflict_count, 1);
        let flagged = a
            .trust
            .rationale
            .iter()
            .filter(|r| r.starts_with("contradicted by"))
            .count();
        assert_eq!(flagged, 1);

        // A newcomer still pairs with the side it negates
        let c = fact("the service is enabled", told("lee"), &["svc"]);
        storage.create_fact(&c)?;
        let pairs = detector.find_contradictions(&storage, 10)?;
        assert_eq!(pairs.len(), 1);
        assert_eq!(storage.get_fact(&b.id)?.unwrap().trust.conflict_count, 2);
        Ok(())
    }

    #[test]
    fn test_contradictions_need_shared_entity_and_category() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        storage.create_fact(&fact("the service is enabled", told("a"), &["svc"]))?;
        storage.create_fact(&fact("the service is disabled", told("b"), &["other"]))?;
        storage.create_fact(
            &Fact::new("the service is disabled", Category::Opinion, told("c")).with_links(["svc"]),
        )?;

        assert!(Detector::new().find_contradictions(&storage, 10)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_contradictions_respect_limit() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        storage.create_fact(&fact("the service is enabled", told("a"), &["svc"]))?;
        storage.create_fact(&fact("the service is disabled", told("b"), &["svc"]))?;
        storage.create_fact(&fact("the service is disabled now", told("c"), &["svc"]))?;

        assert_eq!(Detector::new().find_contradictions(&storage, 1)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_verify_counts_supporters() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        let target = fact("Standup starts at nine sharp", told("shaun"), &["standup"]);
        storage.create_fact(&target)?;
        // Same source is fine for verification
        storage.create_fact(&fact("Standup starts at nine sharp daily", told("shaun"), &["standup"]))?;
        storage.create_fact(&fact("Lunch is served in the atrium", told("shaun"), &["standup"]))?;

        let result = Detector::new()
            .verify(&storage, &target.id, Utc::now())?
            .unwrap();
        assert!(result.verified);
        assert_eq!(result.evidence.len(), 1);
        assert_eq!(result.new_score, 0.65);
        assert_eq!(storage.get_fact(&target.id)?.unwrap().trust.score, 0.65);
        Ok(())
    }

    #[test]
    fn test_verify_counts_each_supporter_once() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        let target = fact("Standup starts at nine sharp", told("shaun"), &["standup"]);
        storage.create_fact(&target)?;
        storage.create_fact(&fact("Standup starts at nine sharp daily", told("shaun"), &["standup"]))?;

        let detector = Detector::new();
        let now = Utc::now();
        let first = detector.verify(&storage, &target.id, now)?.unwrap();
        assert_eq!(first.new_support, 1);
        assert_eq!(first.new_score, 0.65);

        let again = detector.verify(&storage, &target.id, now)?.unwrap();
        assert!(again.verified);
        assert_eq!(again.evidence.len(), 1);
        assert_eq!(again.new_support, 0);
        assert_eq!(again.new_score, 0.65);
        assert_eq!(storage.get_fact(&target.id)?.unwrap().trust.score, 0.65);

        // Support learned after the last confirmation counts
        let mut later = fact("Standup starts at nine sharp weekly", told("shaun"), &["standup"]);
        later.lifecycle.created_at = now + chrono::Duration::minutes(5);
        storage.create_fact(&later)?;
        let third = detector.verify(&storage, &target.id, now + chrono::Duration::minutes(10))?.unwrap();
        assert_eq!(third.evidence.len(), 2);
        assert_eq!(third.new_support, 1);
        assert_eq!(third.new_score, 0.7);
        Ok(())
    }

    #[test]
    fn test_verify_unsupported_and_missing() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        let lonely = fact("Quarterly planning happens offsite", told("shaun"), &[]);
        storage.create_fact(&lonely)?;

        let detector = Detector::new();
        let result = detector.verify(&storage, &lonely.id, Utc::now())?.unwrap();
        assert!(!result.verified);
        assert_eq!(result.new_score, 0.60);

        assert!(detector.verify(&storage, &Ulid::new(), Utc::now())?.is_none());
        Ok(())
    }
}
