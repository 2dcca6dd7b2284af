//! WayRank Core Library
//!
//! This crate provides the feed re-ranking engine for the WayRank extension.
//! It is deliberately DOM-free: the content-script shell (via `wr-wasm`) feeds
//! it post attributes and applies the plans it returns, so the same engine is
//! exercised by the wasm bindings, the CLI simulator, and unit tests.
//!
//! # Architecture
//!
//! The engine tracks the set of posts currently visible on a page, decides
//! when that set has changed enough to warrant a ranking request, enforces
//! single-flight on the remote call, and turns ranking responses into reorder
//! plans. All network and DOM side effects stay with the caller.
//!
//! # Modules
//!
//! - `identity`: post identity extraction behind a pluggable strategy
//! - `tracker`: tracked-set maintenance and change detection
//! - `client`: single-flight ranking request state machine
//! - `reorder`: rank-order planning over opaque element handles
//! - `filter`: promoted-content suppression bookkeeping
//! - `settings`: metric weights and feature flags
//! - `protocol`: wire types for the ranking service

pub mod client;
pub mod filter;
pub mod identity;
pub mod protocol;
pub mod reorder;
pub mod settings;
pub mod tracker;

// Re-export commonly used types
pub use client::{Completion, Prepared, RankingClient, Skip};
pub use filter::PromotedFilter;
pub use identity::{AttributeTriple, ExtractionStrategy, PostId, PostSource};
pub use protocol::{MetricWeight, RankingEntry, RankingRequest};
pub use reorder::plan_reorder;
pub use settings::{MetricWeights, Settings};
pub use tracker::PostTracker;

/// Error type for the settings exchange with the persistence shell.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid settings payload: {0}")]
    InvalidSettings(#[from] serde_json::Error),
}
