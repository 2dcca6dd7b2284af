//! Tracked-set maintenance and change detection
//!
//! The tracker owns three pieces of state: the ids currently observed on the
//! page, the snapshot of ids covered by the last successful ranking request,
//! and the ranking table produced by that request. The snapshot moves only on
//! success, so a failed request leaves change detection primed to retry on
//! the next trigger.

use std::collections::{BTreeSet, HashMap};

use crate::identity::PostId;

/// Per-page post tracking state.
#[derive(Debug, Default)]
pub struct PostTracker {
    tracked: BTreeSet<PostId>,
    last_requested: BTreeSet<PostId>,
    rankings: HashMap<PostId, u32>,
}

impl PostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a post as visible on the page. Returns true if it was new.
    ///
    /// Ids are never removed individually: the caller accumulates ids across
    /// scans and calls [`reset`](Self::reset) to start over (page navigation,
    /// settings change). A rescan-from-scratch without a reset would leave
    /// stale ids in the set.
    pub fn observe(&mut self, id: PostId) -> bool {
        self.tracked.insert(id)
    }

    pub fn observe_all<I: IntoIterator<Item = PostId>>(&mut self, ids: I) {
        for id in ids {
            self.observe(id);
        }
    }

    pub fn tracked_len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Iterate tracked ids in stable (sorted) order.
    pub fn tracked_ids(&self) -> impl Iterator<Item = &PostId> {
        self.tracked.iter()
    }

    /// Superset-only change detection.
    ///
    /// True iff the set sizes differ or some tracked id was not covered by
    /// the last request. Posts scrolling out of the page (a pure subset of
    /// the last request) do NOT count as a change, so no redundant request
    /// is issued for them.
    pub fn has_changed(&self) -> bool {
        if self.tracked.len() != self.last_requested.len() {
            return true;
        }
        self.tracked
            .iter()
            .any(|id| !self.last_requested.contains(id))
    }

    pub fn rank_of(&self, id: &PostId) -> Option<u32> {
        self.rankings.get(id).copied()
    }

    pub fn rankings(&self) -> &HashMap<PostId, u32> {
        &self.rankings
    }

    pub fn ranking_len(&self) -> usize {
        self.rankings.len()
    }

    /// Hard reset: forget everything so the next scan re-tracks the page and
    /// forces a fresh ranking request. Triggered when settings change.
    pub fn reset(&mut self) {
        self.tracked.clear();
        self.last_requested.clear();
        self.rankings.clear();
        log::debug!("cleared post tracking state");
    }

    /// Record the ids covered by a request that just succeeded.
    pub(crate) fn commit_request(&mut self, ids: &[PostId]) {
        self.last_requested = ids.iter().cloned().collect();
    }

    /// Replace the ranking table wholesale. Never merged incrementally.
    pub(crate) fn replace_rankings(&mut self, rankings: HashMap<PostId, u32>) {
        self.rankings = rankings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PostId {
        PostId::from(s.to_string())
    }

    #[test]
    fn test_observe_dedupes() {
        let mut tracker = PostTracker::new();
        assert!(tracker.observe(id("a")));
        assert!(!tracker.observe(id("a")));
        assert_eq!(tracker.tracked_len(), 1);
    }

    #[test]
    fn test_has_changed_initially_true_for_nonempty() {
        let mut tracker = PostTracker::new();
        tracker.observe(id("a"));
        assert!(tracker.has_changed());
    }

    #[test]
    fn test_unchanged_after_commit() {
        let mut tracker = PostTracker::new();
        tracker.observe_all([id("a"), id("b")]);
        tracker.commit_request(&[id("a"), id("b")]);
        assert!(!tracker.has_changed());
    }

    #[test]
    fn test_new_id_counts_as_change() {
        let mut tracker = PostTracker::new();
        tracker.observe_all([id("a"), id("b")]);
        tracker.commit_request(&[id("a"), id("b")]);
        tracker.observe(id("c"));
        assert!(tracker.has_changed());
    }

    #[test]
    fn test_same_size_different_members_counts_as_change() {
        let mut tracker = PostTracker::new();
        tracker.observe_all([id("a"), id("b")]);
        tracker.commit_request(&[id("a"), id("x")]);
        assert!(tracker.has_changed());
    }

    #[test]
    fn test_size_mismatch_counts_as_change() {
        let mut tracker = PostTracker::new();
        tracker.observe_all([id("a"), id("b")]);
        tracker.commit_request(&[id("a"), id("b"), id("c")]);
        assert!(tracker.has_changed());
    }

    #[test]
    fn test_page_removals_do_not_fire() {
        // The tracked set is grow-only between resets: posts scrolling out of
        // the page are never removed from it, so a page shrinking to a subset
        // of the last request stays quiet.
        let mut tracker = PostTracker::new();
        tracker.observe_all([id("a"), id("b"), id("c")]);
        tracker.commit_request(&[id("a"), id("b"), id("c")]);
        // Page now renders only "a" and "b"; the tracker still holds all three.
        assert!(!tracker.has_changed());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut tracker = PostTracker::new();
        tracker.observe(id("a"));
        tracker.commit_request(&[id("a")]);
        tracker.replace_rankings(HashMap::from([(id("a"), 5)]));
        tracker.reset();
        assert!(tracker.is_empty());
        assert_eq!(tracker.ranking_len(), 0);
        assert!(!tracker.has_changed()); // both sets empty
    }
}
