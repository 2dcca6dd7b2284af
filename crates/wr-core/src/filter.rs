//! Promoted-content suppression bookkeeping
//!
//! The engine tracks which containers it has hidden; the caller does the
//! actual hiding (a visual hide, never DOM removal, to avoid layout shift)
//! and the unhiding on restore. Keys are opaque: the wasm shell uses
//! per-element keys it assigns, the CLI uses page-snapshot indices.

use std::collections::HashSet;
use std::hash::Hash;

/// Idempotent suppress/restore set over opaque container handles.
#[derive(Debug)]
pub struct PromotedFilter<H> {
    hidden: HashSet<H>,
}

impl<H: Eq + Hash + Clone> Default for PromotedFilter<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Eq + Hash + Clone> PromotedFilter<H> {
    pub fn new() -> Self {
        Self {
            hidden: HashSet::new(),
        }
    }

    /// Mark promoted containers as hidden. Returns only the containers that
    /// were not already hidden; the caller hides exactly those.
    pub fn suppress<I: IntoIterator<Item = H>>(&mut self, containers: I) -> Vec<H> {
        let newly: Vec<H> = containers
            .into_iter()
            .filter(|container| self.hidden.insert(container.clone()))
            .collect();
        if !newly.is_empty() {
            log::debug!("suppressed {} promoted containers", newly.len());
        }
        newly
    }

    /// Clear every suppression mark. Returns the containers the caller must
    /// now unhide. Idempotent: a second restore returns nothing.
    pub fn restore(&mut self) -> Vec<H> {
        let restored: Vec<H> = self.hidden.drain().collect();
        if !restored.is_empty() {
            log::debug!("restored {} promoted containers", restored.len());
        }
        restored
    }

    pub fn is_suppressed(&self, container: &H) -> bool {
        self.hidden.contains(container)
    }

    pub fn suppressed_count(&self) -> usize {
        self.hidden.len()
    }
}
