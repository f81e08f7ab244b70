//! Store abstraction
//!
//! The scoring components only see this narrow interface. The SQLite
//! implementation lives in [`super::storage`].

use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::fact::{Category, Fact, FactId, FactPatch};

/// Read/write operations the scoring core needs from persistence
///
/// Implementations must make `update_facts`, `record_contradictions` and
/// `mark_used` all-or-nothing.
pub trait FactStore {
    /// Insert a new fact
    fn create_fact(&self, fact: &Fact) -> Result<()>;

    /// Get a fact by ID
    fn get_fact(&self, id: &FactId) -> Result<Option<Fact>>;

    /// Apply a patch to one fact, returning the updated fact
    fn update_fact(&self, id: &FactId, patch: FactPatch) -> Result<Option<Fact>>;

    /// Apply many patches in one transaction; returns how many were written
    fn update_facts(&self, updates: &[(FactId, FactPatch)]) -> Result<usize>;

    /// Hard delete; returns whether a fact was removed
    fn delete_fact(&self, id: &FactId) -> Result<bool>;

    /// Full-text search over content and summary
    fn search_by_text(&self, text: &str, limit: usize) -> Result<Vec<Fact>>;

    fn search_by_category(&self, category: Category, limit: usize) -> Result<Vec<Fact>>;

    fn facts_for_entity(&self, entity: &str, limit: usize) -> Result<Vec<Fact>>;

    /// Every fact, newest first
    fn all_facts(&self, limit: Option<usize>) -> Result<Vec<Fact>>;

    /// Stored embeddings keyed by fact
    fn all_embeddings(&self) -> Result<Vec<(FactId, Vec<f32>)>>;

    /// Contradicting pairs already on record, smaller id first
    fn contradiction_pairs(&self) -> Result<HashSet<(FactId, FactId)>>;

    /// Record contradicting pairs and apply the matching patches in one
    /// transaction; pairs already on record are kept as they are
    fn record_contradictions(
        &self,
        pairs: &[(FactId, FactId, String)],
        updates: &[(FactId, FactPatch)],
    ) -> Result<usize>;

    /// Record that facts were used: bumps use count, stamps last use and
    /// restores full relevance
    fn mark_used(&self, ids: &[FactId], now: DateTime<Utc>) -> Result<usize>;
}
