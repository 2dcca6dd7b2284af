//! Single-flight ranking request state machine
//!
//! The engine never owns the network: callers ask the client to `prepare` a
//! request, perform the HTTP call themselves, then report back with
//! `complete` or `abort`. The client enforces at most one outstanding request
//! and tags each with a generation so a slow response for a superseded id set
//! can never overwrite a newer ranking table.
//!
//! Triggers that arrive while a request is in flight are dropped, not queued.
//! The next DOM mutation re-triggers naturally, and change detection stays
//! primed because the last-requested snapshot only moves on success.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::identity::PostId;
use crate::protocol::{RankingEntry, RankingRequest};
use crate::settings::Settings;
use crate::tracker::PostTracker;

/// Why `prepare` declined to issue a request. Purely informational: every
/// skip is silent as far as the page is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Tracking is disabled in settings.
    Disabled,
    /// Nothing tracked on the page.
    NoPosts,
    /// Tracked set matches the last successful request.
    Unchanged,
    /// A request is already outstanding; this trigger is dropped.
    InFlight,
    /// Every metric weight is zero, so a request would be meaningless.
    NoActiveMetrics,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Skip::Disabled => "tracking disabled",
            Skip::NoPosts => "no posts tracked",
            Skip::Unchanged => "post ids unchanged since last request",
            Skip::InFlight => "request already in flight",
            Skip::NoActiveMetrics => "no metrics configured",
        };
        f.write_str(reason)
    }
}

/// A request the caller should now send over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    /// Tag to hand back to `complete` or `abort`.
    pub generation: u64,
    pub request: RankingRequest,
}

/// Outcome of `complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Ranking table replaced; `applied` entries matched a requested id.
    Applied { applied: usize },
    /// Response belonged to a superseded request and was discarded.
    Stale,
}

#[derive(Debug)]
enum FlightState {
    Idle,
    InFlight { generation: u64, ids: Vec<PostId> },
}

/// Single-flight client for the ranking endpoint.
#[derive(Debug)]
pub struct RankingClient {
    state: FlightState,
    next_generation: u64,
}

impl Default for RankingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RankingClient {
    pub fn new() -> Self {
        Self {
            state: FlightState::Idle,
            next_generation: 0,
        }
    }

    pub fn in_flight(&self) -> bool {
        matches!(self.state, FlightState::InFlight { .. })
    }

    /// Decide whether a ranking request should go out, and build it if so.
    ///
    /// On success the client moves to in-flight with a snapshot of the
    /// tracked ids; the caller must eventually call `complete` or `abort`
    /// with the returned generation.
    pub fn prepare(
        &mut self,
        tracker: &PostTracker,
        settings: &Settings,
    ) -> Result<Prepared, Skip> {
        if !settings.enabled {
            return Err(Skip::Disabled);
        }
        if tracker.is_empty() {
            return Err(Skip::NoPosts);
        }
        if !tracker.has_changed() {
            return Err(Skip::Unchanged);
        }
        if self.in_flight() {
            return Err(Skip::InFlight);
        }
        let custom_ranking = settings.metrics.active();
        if custom_ranking.is_empty() {
            return Err(Skip::NoActiveMetrics);
        }

        let ids: Vec<PostId> = tracker.tracked_ids().cloned().collect();
        self.next_generation += 1;
        let generation = self.next_generation;
        let request = RankingRequest {
            ids: ids.iter().map(|id| id.as_str().to_string()).collect(),
            custom_ranking,
        };
        log::debug!(
            "prepared ranking request generation={generation} ids={}",
            ids.len()
        );
        self.state = FlightState::InFlight { generation, ids };
        Ok(Prepared {
            generation,
            request,
        })
    }

    /// Apply a ranking response.
    ///
    /// Only the response for the live generation is applied: the tracker's
    /// last-requested snapshot moves to the ids that were actually sent, and
    /// the ranking table is replaced wholesale. Entries without a rank, or
    /// naming an id outside the sent set, are dropped. Anything else is
    /// reported as [`Completion::Stale`] and discarded.
    pub fn complete(
        &mut self,
        generation: u64,
        entries: Vec<RankingEntry>,
        tracker: &mut PostTracker,
    ) -> Completion {
        let state = std::mem::replace(&mut self.state, FlightState::Idle);
        match state {
            FlightState::InFlight {
                generation: live,
                ids,
            } if live == generation => {
                let sent: HashSet<&str> = ids.iter().map(|id| id.as_str()).collect();
                let rankings: HashMap<PostId, u32> = entries
                    .into_iter()
                    .filter(|entry| sent.contains(entry.content_id.as_str()))
                    .filter_map(|entry| {
                        entry.rank.map(|rank| (PostId::from(entry.content_id), rank))
                    })
                    .collect();
                let applied = rankings.len();
                tracker.commit_request(&ids);
                tracker.replace_rankings(rankings);
                log::debug!("applied rankings generation={generation} entries={applied}");
                Completion::Applied { applied }
            }
            other => {
                // Superseded response, or a completion with nothing in
                // flight (e.g. after a hard reset). State is untouched.
                self.state = other;
                log::debug!("discarded stale ranking response generation={generation}");
                Completion::Stale
            }
        }
    }

    /// Report a failed request. The tracker keeps its current table and
    /// last-requested snapshot, so the next trigger retries naturally.
    pub fn abort(&mut self, generation: u64) {
        if let FlightState::InFlight { generation: live, .. } = self.state {
            if live == generation {
                self.state = FlightState::Idle;
                log::debug!("aborted ranking request generation={generation}");
            }
        }
    }

    /// Forget any outstanding request. Its eventual response will be stale.
    /// Used by the hard-reset path when settings change.
    pub fn reset(&mut self) {
        self.state = FlightState::Idle;
    }
}
