//! Companion ranking API service
//!
//! Implements the wire contract the extension talks to. Ranking values are
//! deliberately mocked (uniform random per id); the service exists so the
//! extension, CLI, and tests have a real endpoint with real envelopes.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use wr_core::protocol::{ApiError, CapabilityListing, HelloWorldResponse, RankingEntry, VoteResponse};

/// Routes advertised in 404 responses.
pub const AVAILABLE_ROUTES: [&str; 4] = ["/getRankings", "/upVote", "/downVote", "/helloworld"];

type ErrorResponse = (StatusCode, Json<ApiError>);

pub fn build_app() -> Router {
    // Extension content scripts call from arbitrary origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(capabilities).fallback(method_not_allowed))
        .route("/getRankings", post(get_rankings).fallback(method_not_allowed))
        .route("/upVote", post(up_vote).fallback(method_not_allowed))
        .route("/downVote", post(down_vote).fallback(method_not_allowed))
        .route("/helloworld", post(hello_world).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn capabilities() -> Json<CapabilityListing> {
    let endpoints: BTreeMap<String, String> = [
        ("POST /getRankings", "Get rankings for content IDs"),
        ("POST /upVote", "Upvote content"),
        ("POST /downVote", "Downvote content"),
        ("POST /helloworld", "Test endpoint that returns posted content"),
    ]
    .into_iter()
    .map(|(route, description)| (route.to_string(), description.to_string()))
    .collect();

    Json(CapabilityListing {
        message: "WayRank API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}

/// `POST /getRankings`: one entry per requested id, each with a uniform
/// random rank in 1..=1000. The `customRanking` weights are accepted but
/// unused; real scoring lives behind a future service.
async fn get_rankings(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<RankingEntry>>, ErrorResponse> {
    let body = payload.map_err(|_| invalid_rankings_request())?.0;
    let ids = body
        .get("ids")
        .and_then(Value::as_array)
        .ok_or_else(invalid_rankings_request)?;

    let mut rng = rand::thread_rng();
    let mut rankings = Vec::with_capacity(ids.len());
    for id in ids {
        let content_id = id.as_str().ok_or_else(invalid_rankings_request)?;
        rankings.push(RankingEntry {
            content_id: content_id.to_string(),
            rank: Some(rng.gen_range(1..=1000)),
        });
    }

    tracing::debug!(count = rankings.len(), "issued mock rankings");
    Ok(Json(rankings))
}

async fn up_vote(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<VoteResponse>, ErrorResponse> {
    record_vote(payload, "Upvote recorded")
}

async fn down_vote(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<VoteResponse>, ErrorResponse> {
    record_vote(payload, "Downvote recorded")
}

fn record_vote(
    payload: Result<Json<Value>, JsonRejection>,
    message: &str,
) -> Result<Json<VoteResponse>, ErrorResponse> {
    let body = payload.map_err(|_| invalid_vote_request())?.0;
    let content_id = body
        .get("contentId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(invalid_vote_request)?;

    // Votes are acknowledged but not persisted yet.
    Ok(Json(VoteResponse {
        success: true,
        message: message.to_string(),
        content_id: content_id.to_string(),
        timestamp: timestamp(),
    }))
}

/// `POST /helloworld`: echo whatever was posted. A malformed or missing body
/// echoes `null` rather than erroring.
async fn hello_world(payload: Result<Json<Value>, JsonRejection>) -> Json<HelloWorldResponse> {
    let posted = payload.map(|Json(value)| value).unwrap_or(Value::Null);
    Json(HelloWorldResponse {
        test: "hello world".to_string(),
        postedcontent: posted,
        method: "POST".to_string(),
        timestamp: timestamp(),
    })
}

async fn not_found(uri: Uri) -> ErrorResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError {
            error: "Not Found".to_string(),
            message: Some(format!("Route {} not found", uri.path())),
            available_routes: Some(
                AVAILABLE_ROUTES.iter().map(|r| r.to_string()).collect(),
            ),
        }),
    )
}

async fn method_not_allowed() -> ErrorResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ApiError {
            error: "Method not allowed".to_string(),
            message: None,
            available_routes: None,
        }),
    )
}

fn invalid_rankings_request() -> ErrorResponse {
    bad_request("Invalid request data. Expected { ids: string[] }")
}

fn invalid_vote_request() -> ErrorResponse {
    bad_request("Invalid request data. Expected { contentId: string }")
}

fn bad_request(message: &str) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: message.to_string(),
            message: None,
            available_routes: None,
        }),
    )
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
