//! Trust Scoring System
//!
//! Initial trust for a fact is derived from how it was learned:
//! - Provenance kind (experienced > observed > told > read > inferred)
//! - Source context bonus (the learning situation was recorded)
//!
//! The same calibration table also supplies the source weights used when
//! an independent source corroborates an existing fact.

use serde::{Deserialize, Serialize};

use super::fact::ProvenanceKind;
use super::text::round2;

/// Trust scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Base trust for first-hand experience
    #[serde(default = "default_experienced")]
    pub experienced_base: f64,
    /// Base trust for direct observation
    #[serde(default = "default_observed")]
    pub observed_base: f64,
    /// Base trust for something another actor said
    #[serde(default = "default_told")]
    pub told_base: f64,
    /// Base trust for something read
    #[serde(default = "default_read")]
    pub read_base: f64,
    /// Base trust for an inference
    #[serde(default = "default_inferred")]
    pub inferred_base: f64,

    /// Flat bonus when the learning context is known
    #[serde(default = "default_context_bonus")]
    pub context_bonus: f64,

    /// Corroboration weight per provenance kind
    #[serde(default)]
    pub source_weights: SourceWeights,
}

fn default_experienced() -> f64 {
    0.90
}

fn default_observed() -> f64 {
    0.80
}

fn default_told() -> f64 {
    0.60
}

fn default_read() -> f64 {
    0.50
}

fn default_inferred() -> f64 {
    0.40
}

fn default_context_bonus() -> f64 {
    0.05
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            experienced_base: default_experienced(),
            observed_base: default_observed(),
            told_base: default_told(),
            read_base: default_read(),
            inferred_base: default_inferred(),
            context_bonus: default_context_bonus(),
            source_weights: SourceWeights::default(),
        }
    }
}

/// How strongly a corroborating source of each kind counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceWeights {
    pub experienced: f64,
    pub observed: f64,
    pub told: f64,
    pub read: f64,
    pub inferred: f64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            experienced: 1.5,
            observed: 1.2,
            told: 1.0,
            read: 0.8,
            inferred: 0.5,
        }
    }
}

/// Initial score plus the trail explaining it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitialTrust {
    pub score: f64,
    pub rationale: Vec<String>,
}

/// Trust model
#[derive(Debug, Clone, Default)]
pub struct TrustModel {
    config: TrustConfig,
}

impl TrustModel {
    pub fn new() -> Self {
        Self {
            config: TrustConfig::default(),
        }
    }

    pub fn with_config(config: TrustConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    /// Base score for a provenance kind, before any bonus
    pub fn base_score(&self, kind: ProvenanceKind) -> f64 {
        match kind {
            ProvenanceKind::Experienced => self.config.experienced_base,
            ProvenanceKind::Observed => self.config.observed_base,
            ProvenanceKind::Told => self.config.told_base,
            ProvenanceKind::Read => self.config.read_base,
            ProvenanceKind::Inferred => self.config.inferred_base,
        }
    }

    /// Calculate initial trust for a new fact
    pub fn initial_trust(&self, kind: ProvenanceKind, has_context: bool) -> InitialTrust {
        let mut score = self.base_score(kind);
        let mut rationale = vec![format!("learned by {}", kind)];

        if has_context {
            score = (score + self.config.context_bonus).min(1.0);
            rationale.push("has source context".to_string());
        }

        InitialTrust {
            score: round2(score.clamp(0.0, 1.0)),
            rationale,
        }
    }

    /// Weight of a corroborating source
    pub fn source_weight(&self, kind: ProvenanceKind) -> f64 {
        let w = &self.config.source_weights;
        match kind {
            ProvenanceKind::Experienced => w.experienced,
            ProvenanceKind::Observed => w.observed,
            ProvenanceKind::Told => w.told,
            ProvenanceKind::Read => w.read,
            ProvenanceKind::Inferred => w.inferred,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [ProvenanceKind; 5] = [
        ProvenanceKind::Experienced,
        ProvenanceKind::Observed,
        ProvenanceKind::Told,
        ProvenanceKind::Read,
        ProvenanceKind::Inferred,
    ];

    #[test]
    fn test_initial_trust_told() {
        let model = TrustModel::new();
        assert_eq!(model.initial_trust(ProvenanceKind::Told, false).score, 0.60);
        assert_eq!(model.initial_trust(ProvenanceKind::Told, true).score, 0.65);
    }

    #[test]
    fn test_kinds_strictly_descending() {
        let model = TrustModel::new();
        for pair in KINDS.windows(2) {
            let hi = model.initial_trust(pair[0], false).score;
            let lo = model.initial_trust(pair[1], false).score;
            assert!(hi > lo, "{} should outrank {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_context_never_lowers_score() {
        let model = TrustModel::new();
        for kind in KINDS {
            let without = model.initial_trust(kind, false).score;
            let with = model.initial_trust(kind, true).score;
            assert!(with > without || with == 1.0);
        }
    }

    #[test]
    fn test_context_bonus_capped() {
        let model = TrustModel::with_config(TrustConfig {
            experienced_base: 0.98,
            ..TrustConfig::default()
        });
        assert_eq!(model.initial_trust(ProvenanceKind::Experienced, true).score, 1.0);
    }

    #[test]
    fn test_rationale_trail() {
        let model = TrustModel::new();
        let trust = model.initial_trust(ProvenanceKind::Read, true);
        assert_eq!(trust.rationale, vec!["learned by read", "has source context"]);
    }

    #[test]
    fn test_deterministic() {
        let model = TrustModel::new();
        assert_eq!(
            model.initial_trust(ProvenanceKind::Observed, true),
            model.initial_trust(ProvenanceKind::Observed, true)
        );
    }

    #[test]
    fn test_source_weights() {
        let model = TrustModel::new();
        assert_eq!(model.source_weight(ProvenanceKind::Experienced), 1.5);
        assert_eq!(model.source_weight(ProvenanceKind::Inferred), 0.5);
    }
}
