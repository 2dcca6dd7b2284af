//! WebAssembly bindings for the WayRank engine
//!
//! One engine instance lives per content-script context. The JS shell owns
//! every side effect: it reads attributes off DOM elements into plain
//! objects, performs the `fetch` for prepared requests, re-appends elements
//! in plan order, and hides/unhides promoted containers. The engine decides.

use std::sync::{Mutex, MutexGuard, OnceLock};

use wasm_bindgen::prelude::*;

use wr_core::{
    AttributeTriple, Completion, ExtractionStrategy, PostId, PostSource, PostTracker,
    PromotedFilter, RankingClient, Settings,
};

struct Engine {
    settings: Settings,
    tracker: PostTracker,
    client: RankingClient,
    filter: PromotedFilter<String>,
    strategy: AttributeTriple,
}

impl Engine {
    fn new(settings: Settings) -> Self {
        Self {
            settings,
            tracker: PostTracker::new(),
            client: RankingClient::new(),
            filter: PromotedFilter::new(),
            strategy: AttributeTriple::default(),
        }
    }

    /// Hard reset: forget tracking and any in-flight request so the next
    /// scan re-tracks the page and forces a fresh ranking request.
    fn hard_reset(&mut self) {
        self.tracker.reset();
        self.client.reset();
    }
}

static ENGINE: OnceLock<Mutex<Engine>> = OnceLock::new();

fn engine() -> Result<MutexGuard<'static, Engine>, JsValue> {
    ENGINE
        .get()
        .ok_or_else(|| JsValue::from_str("Engine not initialized. Call init() first."))?
        .lock()
        .map_err(|_| JsValue::from_str("Engine lock poisoned"))
}

/// A post handed over from JS as a plain object whose properties are the
/// element's attributes (`{"user-id": "...", "view-context": "...", ...}`).
struct JsPostSource<'a> {
    obj: &'a JsValue,
}

impl PostSource for JsPostSource<'_> {
    fn attribute(&self, name: &str) -> Option<String> {
        js_sys::Reflect::get(self.obj, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.as_string())
    }
}

#[wasm_bindgen]
pub fn init(settings_json: &str) -> Result<(), JsValue> {
    if ENGINE.get().is_some() {
        return Err(JsValue::from_str(
            "Already initialized. Reload the page to reinitialize.",
        ));
    }

    let settings = Settings::from_json(settings_json)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse settings: {}", e)))?;

    ENGINE
        .set(Mutex::new(Engine::new(settings)))
        .map_err(|_| JsValue::from_str("Failed to set engine state"))?;

    Ok(())
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    ENGINE.get().is_some()
}

/// Track one post. Returns its composite id, or `null` when the object does
/// not carry the three identifying attributes (not a trackable post).
#[wasm_bindgen]
pub fn observe_post(post: &JsValue) -> Result<Option<String>, JsValue> {
    let mut engine = engine()?;
    let source = JsPostSource { obj: post };
    match engine.strategy.extract(&source) {
        Some(id) => {
            engine.tracker.observe(id.clone());
            Ok(Some(id.into_string()))
        }
        None => Ok(None),
    }
}

/// Track a batch of posts. Returns how many were extractable.
#[wasm_bindgen]
pub fn observe_posts(posts: &JsValue) -> Result<u32, JsValue> {
    let mut engine = engine()?;
    let array = js_sys::Array::from(posts);
    let mut tracked = 0u32;
    for value in array.iter() {
        let source = JsPostSource { obj: &value };
        if let Some(id) = engine.strategy.extract(&source) {
            engine.tracker.observe(id);
            tracked += 1;
        }
    }
    Ok(tracked)
}

/// Decide whether a ranking request should go out.
///
/// Returns `null` when no request is warranted (skip reason traced to the
/// console), otherwise `{ generation, body }` where `body` is the JSON to
/// POST to the ranking endpoint. The shell must call `complete_request` or
/// `abort_request` with the generation once the fetch settles.
#[wasm_bindgen]
pub fn prepare_request() -> Result<JsValue, JsValue> {
    let mut engine = engine()?;
    let Engine {
        ref mut client,
        ref tracker,
        ref settings,
        ..
    } = *engine;
    match client.prepare(tracker, settings) {
        Ok(prepared) => {
            let body = serde_json_string(&prepared.request)?;
            let result = js_sys::Object::new();
            let _ = js_sys::Reflect::set(
                &result,
                &"generation".into(),
                &JsValue::from(prepared.generation as f64),
            );
            let _ = js_sys::Reflect::set(&result, &"body".into(), &JsValue::from_str(&body));
            Ok(result.into())
        }
        Err(skip) => {
            web_sys::console::debug_1(&JsValue::from_str(&format!(
                "WayRank: skipping ranking request: {}",
                skip
            )));
            Ok(JsValue::NULL)
        }
    }
}

/// Apply a ranking response. Returns `{ applied, stale }`.
#[wasm_bindgen]
pub fn complete_request(generation: f64, response_json: &str) -> Result<JsValue, JsValue> {
    let entries: Vec<wr_core::RankingEntry> = serde_json::from_str(response_json)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse ranking response: {}", e)))?;

    let mut engine = engine()?;
    let Engine {
        ref mut client,
        ref mut tracker,
        ..
    } = *engine;
    let outcome = client.complete(generation as u64, entries, tracker);

    let result = js_sys::Object::new();
    match outcome {
        Completion::Applied { applied } => {
            let _ = js_sys::Reflect::set(&result, &"applied".into(), &JsValue::from(applied as u32));
            let _ = js_sys::Reflect::set(&result, &"stale".into(), &JsValue::from(false));
        }
        Completion::Stale => {
            let _ = js_sys::Reflect::set(&result, &"applied".into(), &JsValue::from(0u32));
            let _ = js_sys::Reflect::set(&result, &"stale".into(), &JsValue::from(true));
        }
    }
    Ok(result.into())
}

/// Report a failed fetch. State is left unchanged; the page keeps its
/// current order and the next trigger retries naturally.
#[wasm_bindgen]
pub fn abort_request(generation: f64) -> Result<(), JsValue> {
    engine()?.client.abort(generation as u64);
    Ok(())
}

/// Compute the append order for the page's post containers.
///
/// Input: array of `{ key, ...attributes }` objects, one per container in
/// page order. Output: the keys to re-append to their parent, in order.
/// Elements missing from the output stay where they are.
#[wasm_bindgen]
pub fn plan_reorder(posts: &JsValue) -> Result<js_sys::Array, JsValue> {
    let engine = engine()?;
    if !engine.settings.enabled {
        return Ok(js_sys::Array::new());
    }

    let array = js_sys::Array::from(posts);
    let mut pairs: Vec<(String, Option<PostId>)> = Vec::with_capacity(array.length() as usize);
    for value in array.iter() {
        let key = js_sys::Reflect::get(&value, &"key".into())
            .ok()
            .and_then(|v| v.as_string())
            .ok_or_else(|| JsValue::from_str("Post entry missing 'key'"))?;
        let source = JsPostSource { obj: &value };
        pairs.push((key, engine.strategy.extract(&source)));
    }

    let plan = wr_core::plan_reorder(&pairs, engine.tracker.rankings());
    let result = js_sys::Array::new();
    for key in plan {
        result.push(&JsValue::from_str(&key));
    }
    Ok(result)
}

/// Mark promoted containers as suppressed. Input: array of container keys
/// found under a promoted marker. Output: the keys the shell should hide now
/// (already-hidden containers are skipped). Empty when the remove-promoted
/// setting is off.
#[wasm_bindgen]
pub fn suppress_promoted(container_keys: &JsValue) -> Result<js_sys::Array, JsValue> {
    let mut engine = engine()?;
    let result = js_sys::Array::new();
    if !engine.settings.remove_promoted {
        return Ok(result);
    }

    let keys: Vec<String> = js_sys::Array::from(container_keys)
        .iter()
        .filter_map(|v| v.as_string())
        .collect();
    for key in engine.filter.suppress(keys) {
        result.push(&JsValue::from_str(&key));
    }
    Ok(result)
}

/// Clear every suppression mark. Output: the keys the shell should unhide.
#[wasm_bindgen]
pub fn restore_promoted() -> Result<js_sys::Array, JsValue> {
    let mut engine = engine()?;
    let result = js_sys::Array::new();
    for key in engine.filter.restore() {
        result.push(&JsValue::from_str(&key));
    }
    Ok(result)
}

/// Swap in new settings and hard-reset tracking, forcing a fresh scan and
/// ranking request. The shell persists the blob to storage itself.
#[wasm_bindgen]
pub fn apply_settings(settings_json: &str) -> Result<(), JsValue> {
    let settings = Settings::from_json(settings_json)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse settings: {}", e)))?;
    let mut engine = engine()?;
    engine.settings = settings;
    engine.hard_reset();
    Ok(())
}

/// Flip the enabled flag without resetting tracking. An in-flight request is
/// not aborted; disabling only stops new requests from going out.
#[wasm_bindgen]
pub fn set_enabled(enabled: bool) -> Result<(), JsValue> {
    engine()?.settings.enabled = enabled;
    Ok(())
}

#[wasm_bindgen]
pub fn set_remove_promoted(remove_promoted: bool) -> Result<(), JsValue> {
    engine()?.settings.remove_promoted = remove_promoted;
    Ok(())
}

/// Current settings blob, for the popup and in-page modal to render.
#[wasm_bindgen]
pub fn settings_json() -> Result<String, JsValue> {
    Ok(engine()?.settings.to_json())
}

/// Forget all tracking state without touching settings.
#[wasm_bindgen]
pub fn hard_reset() -> Result<(), JsValue> {
    engine()?.hard_reset();
    Ok(())
}

#[wasm_bindgen]
pub fn tracked_count() -> Result<u32, JsValue> {
    Ok(engine()?.tracker.tracked_len() as u32)
}

#[wasm_bindgen]
pub fn suppressed_count() -> Result<u32, JsValue> {
    Ok(engine()?.filter.suppressed_count() as u32)
}

fn serde_json_string<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize request: {}", e)))
}
