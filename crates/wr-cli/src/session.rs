//! Page session simulation
//!
//! Drives the full engine pipeline against a live ranking endpoint, standing
//! in for the content script: a JSON page snapshot plays the DOM, and the
//! printed before/after order shows what the extension would do to the page.

use std::collections::BTreeMap;
use std::fs;
use std::time::Instant;

use serde_json::Value;

use wr_core::{
    AttributeTriple, Completion, ExtractionStrategy, PostId, PostTracker, PromotedFilter,
    RankingClient, RankingEntry, Settings,
};

pub struct SessionOptions {
    pub snapshot: String,
    pub endpoint: String,
    pub weights: Vec<(String, u16)>,
    pub repeat: bool,
    pub remove_promoted: bool,
}

struct SnapshotPost {
    key: String,
    attributes: BTreeMap<String, String>,
    promoted: bool,
}

pub fn run_session(opts: SessionOptions) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    runtime.block_on(run_session_async(opts))
}

async fn run_session_async(opts: SessionOptions) -> Result<(), String> {
    let start = Instant::now();
    let posts = load_snapshot(&opts.snapshot)?;
    log::debug!("loaded {} posts from '{}'", posts.len(), opts.snapshot);

    let mut settings = Settings::default();
    settings.remove_promoted = opts.remove_promoted;
    for (name, weight) in &opts.weights {
        settings.metrics.set(name, *weight);
    }

    // Promoted suppression happens before tracking, same as on a real page.
    let mut filter: PromotedFilter<String> = PromotedFilter::new();
    if settings.remove_promoted {
        let hidden = filter.suppress(
            posts
                .iter()
                .filter(|post| post.promoted)
                .map(|post| post.key.clone()),
        );
        if !hidden.is_empty() {
            println!("Suppressed {} promoted posts: {}", hidden.len(), hidden.join(", "));
        }
    }

    let strategy = AttributeTriple::default();
    let mut tracker = PostTracker::new();
    let mut pairs: Vec<(String, Option<PostId>)> = Vec::with_capacity(posts.len());
    for post in &posts {
        let id = strategy.extract(&post.attributes);
        if let Some(id) = &id {
            tracker.observe(id.clone());
        }
        pairs.push((post.key.clone(), id));
    }
    println!(
        "Tracked {} of {} posts from '{}'",
        tracker.tracked_len(),
        posts.len(),
        opts.snapshot
    );

    let mut client = RankingClient::new();
    let applied = request_and_apply(&mut client, &mut tracker, &settings, &opts.endpoint).await?;
    println!("Applied {} rankings", applied);

    let before: Vec<&str> = pairs.iter().map(|(key, _)| key.as_str()).collect();
    let plan = wr_core::plan_reorder(&pairs, tracker.rankings());
    let after = apply_plan(&before, &plan);
    println!("  Before: {}", before.join(" "));
    println!("  After:  {}", after.join(" "));
    println!("  Time:   {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);

    if opts.repeat {
        // Same page, same ids: the second pass must not hit the network.
        for (_, id) in &pairs {
            if let Some(id) = id {
                tracker.observe(id.clone());
            }
        }
        match client.prepare(&tracker, &settings) {
            Err(skip) => println!("Second pass skipped: {}", skip),
            Ok(prepared) => {
                client.abort(prepared.generation);
                return Err("Second pass unexpectedly prepared a request".to_string());
            }
        }
    }

    Ok(())
}

async fn request_and_apply(
    client: &mut RankingClient,
    tracker: &mut PostTracker,
    settings: &Settings,
    endpoint: &str,
) -> Result<usize, String> {
    let prepared = match client.prepare(tracker, settings) {
        Ok(prepared) => prepared,
        Err(skip) => {
            println!("No request sent: {}", skip);
            return Ok(0);
        }
    };

    let url = format!("{}/getRankings", endpoint.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .json(&prepared.request)
        .send()
        .await;

    let entries: Vec<RankingEntry> = match response {
        Ok(response) if response.status().is_success() => response
            .json()
            .await
            .map_err(|e| format!("Invalid ranking response: {}", e))?,
        Ok(response) => {
            client.abort(prepared.generation);
            return Err(format!("Ranking request failed: HTTP {}", response.status()));
        }
        Err(e) => {
            client.abort(prepared.generation);
            return Err(format!("Ranking request failed: {}", e));
        }
    };

    match client.complete(prepared.generation, entries, tracker) {
        Completion::Applied { applied } => Ok(applied),
        Completion::Stale => Ok(0),
    }
}

/// Replay a reorder plan over a flat sibling list: planned keys are pulled
/// out and re-appended in plan order, everything else stays put.
fn apply_plan(before: &[&str], plan: &[String]) -> Vec<String> {
    let mut order: Vec<String> = before
        .iter()
        .filter(|key| !plan.iter().any(|p| p == **key))
        .map(|key| key.to_string())
        .collect();
    order.extend(plan.iter().cloned());
    order
}

fn load_snapshot(path: &str) -> Result<Vec<SnapshotPost>, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    let raw: Vec<serde_json::Map<String, Value>> =
        serde_json::from_str(&content).map_err(|e| format!("Invalid snapshot '{}': {}", path, e))?;

    let posts = raw
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let promoted = entry
                .get("promoted")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let attributes: BTreeMap<String, String> = entry
                .into_iter()
                .filter_map(|(name, value)| match value {
                    Value::String(value) => Some((name, value)),
                    _ => None,
                })
                .collect();
            SnapshotPost {
                key: format!("post{}", index),
                attributes,
                promoted,
            }
        })
        .collect();
    Ok(posts)
}
