use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use wr_api::build_app;

async fn call(method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    let response = build_app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn root_lists_capabilities() {
    let (status, body) = call("GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "WayRank API is running");
    assert!(body["endpoints"]["POST /getRankings"].is_string());
}

#[tokio::test]
async fn rankings_returns_one_entry_per_id() {
    let body = json!({
        "ids": ["u1-feed-a", "u2-feed-b", "u3-feed-c"],
        "customRanking": [{"weighName": "IQ", "weighValue": 10}],
    });
    let (status, body) = call("POST", "/getRankings", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    for (entry, id) in entries.iter().zip(["u1-feed-a", "u2-feed-b", "u3-feed-c"]) {
        assert_eq!(entry["contentId"], id);
        let rank = entry["rank"].as_u64().unwrap();
        assert!((1..=1000).contains(&rank));
    }
}

#[tokio::test]
async fn rankings_rejects_missing_ids() {
    let (status, body) = call("POST", "/getRankings", Some(json!({"nope": true}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request data. Expected { ids: string[] }");
}

#[tokio::test]
async fn rankings_rejects_malformed_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/getRankings")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = build_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn votes_are_acknowledged() {
    for (route, message) in [("/upVote", "Upvote recorded"), ("/downVote", "Downvote recorded")] {
        let (status, body) = call("POST", route, Some(json!({"contentId": "u1-feed-a"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], message);
        assert_eq!(body["contentId"], "u1-feed-a");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}

#[tokio::test]
async fn vote_without_content_id_is_rejected() {
    let (status, body) = call("POST", "/upVote", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request data. Expected { contentId: string }");
}

#[tokio::test]
async fn helloworld_echoes_posted_body() {
    let (status, body) = call("POST", "/helloworld", Some(json!({"ping": 1}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["test"], "hello world");
    assert_eq!(body["postedcontent"]["ping"], 1);
    assert_eq!(body["method"], "POST");
}

#[tokio::test]
async fn helloworld_echoes_null_for_malformed_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/helloworld")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = build_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["test"], "hello world");
    assert!(body["postedcontent"].is_null());
}

#[tokio::test]
async fn unknown_route_gets_envelope_with_available_routes() {
    let (status, body) = call("POST", "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["message"], "Route /nope not found");
    assert_eq!(body["availableRoutes"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn wrong_method_gets_405_envelope() {
    let (status, body) = call("GET", "/getRankings", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");
}
