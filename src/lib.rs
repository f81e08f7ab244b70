//! trove - attributed agent memory
//!
//! Every fact records how it was learned. From that provenance trove derives
//! an initial trust score, lets relevance fade with disuse, adjusts trust
//! when independent sources agree or disagree, and ranks facts for recall.
//!
//! ## Key Concepts
//!
//! - **Provenance**: experienced, observed, told, read or inferred
//! - **Trust**: how reliable a fact is; only corroboration and verification move it
//! - **Relevance**: how current a fact is; decays with idle time, restored on use
//! - **Recall**: lexical, semantic and entity channels fused into one ranking

pub mod cli;
pub mod config;
pub mod core;

pub use crate::core::corroboration::{ContradictionPair, Detector, TrustAdjustment, Verification};
pub use crate::core::decay::{DecayEngine, DecayTier, SweepReport};
pub use crate::core::embedding::{EmbeddingProvider, HttpEmbeddingProvider};
pub use crate::core::error::MemoryError;
pub use crate::core::fact::{Category, Fact, FactId, FactPatch, Provenance, ProvenanceKind};
pub use crate::core::recall::{RecallEngine, RecallQuery, RecallResult};
pub use crate::core::storage::Storage;
pub use crate::core::store::FactStore;
pub use crate::core::trust::TrustModel;
