//! Rank-order planning
//!
//! Pure planning over opaque element handles: the caller walks the page,
//! pairs each post container with its extracted id (or `None`), and gets back
//! the handles that should be re-appended to their parent, in order. Handles
//! absent from the plan are left alone, so unranked elements keep their
//! relative position while ranked ones move to the end of the container in
//! ascending rank order.

use std::collections::HashMap;

use crate::identity::PostId;

/// Compute the append order for ranked elements.
///
/// Stable: elements sharing a rank keep their page order. An empty ranking
/// table, or a page with no ranked elements, yields an empty plan (no-op).
pub fn plan_reorder<H: Clone>(
    posts: &[(H, Option<PostId>)],
    rankings: &HashMap<PostId, u32>,
) -> Vec<H> {
    let mut ranked: Vec<(H, u32)> = posts
        .iter()
        .filter_map(|(handle, id)| {
            let rank = rankings.get(id.as_ref()?)?;
            Some((handle.clone(), *rank))
        })
        .collect();
    ranked.sort_by_key(|(_, rank)| *rank);
    log::debug!("reorder plan covers {} of {} elements", ranked.len(), posts.len());
    ranked.into_iter().map(|(handle, _)| handle).collect()
}
