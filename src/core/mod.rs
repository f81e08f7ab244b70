//! Core module - Business logic
//!
//! Trust scoring, decay, corroboration and recall over attributed facts.

pub mod corroboration;
pub mod decay;
pub mod embedding;
pub mod error;
pub mod fact;
pub mod recall;
pub mod storage;
pub mod store;
pub mod text;
pub mod trust;
