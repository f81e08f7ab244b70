//! Decay Engine
//!
//! Relevance erodes exponentially with idle time:
//!
//! ```text
//! relevance' = exp(-decay_rate * days_idle * 0.01 * d),  d = 1 / (1 + use_count * 0.3)
//! ```
//!
//! Frequent use dampens decay but never stops it; only protection does.
//! A sweep never raises relevance (use restores it, see `FactStore::mark_used`)
//! and writes all of its changes in a single transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::fact::{Category, Fact, FactId, FactPatch};
use super::store::FactStore;
use super::text::unit;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Decay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Default decay rate per category
    pub category_rates: CategoryRates,
    /// Idle days are scaled by this before exponentiation
    pub time_scale: f64,
    /// Per-use dampening of the decay exponent
    pub usage_dampening: f64,
    /// Facts below this relevance count as archived
    pub archive_threshold: f64,
    /// Idle days still considered hot
    pub hot_days: i64,
    /// Idle days still considered warm
    pub warm_days: i64,
    /// Use count that promotes a fact one tier
    pub promotion_uses: u32,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            category_rates: CategoryRates::default(),
            time_scale: 0.01,
            usage_dampening: 0.3,
            archive_threshold: 0.05,
            hot_days: 7,
            warm_days: 30,
            promotion_uses: 10,
        }
    }
}

impl DecayConfig {
    pub fn rate_for(&self, category: Category) -> f64 {
        let r = &self.category_rates;
        match category {
            Category::Fact => r.fact,
            Category::Event => r.event,
            Category::Opinion => r.opinion,
            Category::Preference => r.preference,
            Category::Procedure => r.procedure,
            Category::Relationship => r.relationship,
            Category::Observation => r.observation,
        }
    }
}

/// Default decay speed of each category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryRates {
    pub fact: f64,
    pub event: f64,
    pub opinion: f64,
    pub preference: f64,
    pub procedure: f64,
    pub relationship: f64,
    pub observation: f64,
}

impl Default for CategoryRates {
    fn default() -> Self {
        Self {
            fact: 0.10,
            event: 0.30,
            opinion: 0.20,
            preference: 0.05,
            procedure: 0.05,
            relationship: 0.05,
            observation: 0.20,
        }
    }
}

/// Derived recency classification, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayTier {
    Hot,
    Warm,
    Cold,
}

impl DecayTier {
    fn promoted(self) -> Self {
        match self {
            DecayTier::Hot | DecayTier::Warm => DecayTier::Hot,
            DecayTier::Cold => DecayTier::Warm,
        }
    }
}

impl std::fmt::Display for DecayTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecayTier::Hot => write!(f, "hot"),
            DecayTier::Warm => write!(f, "warm"),
            DecayTier::Cold => write!(f, "cold"),
        }
    }
}

/// Report from a decay sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    /// Facts whose relevance was written
    pub updated_count: usize,
    /// Facts now below the archive threshold
    pub archived_count: usize,
    /// Protected facts whose relevance was restored to 1.0
    pub protected_repaired: usize,
}

/// Decay engine
#[derive(Debug, Clone, Default)]
pub struct DecayEngine {
    config: DecayConfig,
}

impl DecayEngine {
    pub fn new() -> Self {
        Self {
            config: DecayConfig::default(),
        }
    }

    pub fn with_config(config: DecayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecayConfig {
        &self.config
    }

    /// Relevance the formula yields at `now`, ignoring the stored value
    pub fn relevance_at(&self, fact: &Fact, now: DateTime<Utc>) -> f64 {
        if fact.protected {
            return 1.0;
        }
        let days_idle = days_idle(fact, now);
        let dampening = 1.0 / (1.0 + fact.lifecycle.use_count as f64 * self.config.usage_dampening);
        let exponent = -fact.decay_rate * days_idle * self.config.time_scale * dampening;
        unit(exponent.exp())
    }

    /// Relevance after one sweep: never above the stored value
    pub fn next_relevance(&self, fact: &Fact, now: DateTime<Utc>) -> f64 {
        if fact.protected {
            return 1.0;
        }
        self.relevance_at(fact, now).min(fact.relevance)
    }

    /// Classify a fact by how recently it was used
    pub fn decay_tier(&self, fact: &Fact, now: DateTime<Utc>) -> DecayTier {
        let idle = (now - fact.lifecycle.last_used_at).num_days().max(0);
        let tier = if idle <= self.config.hot_days {
            DecayTier::Hot
        } else if idle <= self.config.warm_days {
            DecayTier::Warm
        } else {
            DecayTier::Cold
        };

        if fact.lifecycle.use_count >= self.config.promotion_uses {
            tier.promoted()
        } else {
            tier
        }
    }

    /// Recompute relevance for every fact and persist the changes atomically
    pub fn sweep(&self, store: &dyn FactStore, now: DateTime<Utc>) -> anyhow::Result<SweepReport> {
        let facts = store.all_facts(None)?;
        let mut report = SweepReport::default();
        let mut updates: Vec<(FactId, FactPatch)> = Vec::new();

        for fact in &facts {
            if fact.protected {
                if fact.relevance != 1.0 {
                    report.protected_repaired += 1;
                    updates.push((
                        fact.id,
                        FactPatch {
                            relevance: Some(1.0),
                            ..Default::default()
                        },
                    ));
                }
                continue;
            }

            let next = self.next_relevance(fact, now);
            if next < self.config.archive_threshold {
                report.archived_count += 1;
            }
            if (next - fact.relevance).abs() > f64::EPSILON {
                debug!(id = %fact.id, from = fact.relevance, to = next, "relevance decayed");
                updates.push((
                    fact.id,
                    FactPatch {
                        relevance: Some(next),
                        ..Default::default()
                    },
                ));
            }
        }

        report.updated_count = store.update_facts(&updates)?;

        info!(
            "Decay sweep complete: {} facts scanned, {} updated, {} archived",
            facts.len(),
            report.updated_count,
            report.archived_count
        );

        Ok(report)
    }
}

fn days_idle(fact: &Fact, now: DateTime<Utc>) -> f64 {
    let ms = (now - fact.lifecycle.last_used_at).num_milliseconds().max(0);
    ms as f64 / MS_PER_DAY
}
