//! Wire types for the ranking service
//!
//! Field names follow the service's JSON exactly (`weighName`, `contentId`,
//! ...), so these types are the single source of truth for both sides: the
//! engine and CLI serialize them, the API service deserializes them, and
//! `ts-rs` exports matching TypeScript for the extension shell.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One metric with a positive weight, as sent to `/getRankings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MetricWeight {
    #[serde(rename = "weighName")]
    pub weigh_name: String,
    #[serde(rename = "weighValue")]
    pub weigh_value: u16,
}

/// Body of `POST /getRankings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RankingRequest {
    pub ids: Vec<String>,
    #[serde(rename = "customRanking")]
    pub custom_ranking: Vec<MetricWeight>,
}

/// One entry of the `/getRankings` response.
///
/// `rank` is optional on purpose: the service response is not validated, and
/// an entry without a rank is treated as if no ranking exists rather than
/// failing the whole response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RankingEntry {
    #[serde(rename = "contentId")]
    pub content_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

/// Body of `POST /upVote` and `POST /downVote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoteRequest {
    #[serde(rename = "contentId")]
    pub content_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoteResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "contentId")]
    pub content_id: String,
    pub timestamp: String,
}

/// Echo envelope returned by `POST /helloworld`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HelloWorldResponse {
    pub test: String,
    #[ts(type = "unknown")]
    pub postedcontent: serde_json::Value,
    pub method: String,
    pub timestamp: String,
}

/// Capability listing returned by `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CapabilityListing {
    pub message: String,
    pub version: String,
    pub endpoints: std::collections::BTreeMap<String, String>,
}

/// JSON error envelope for 4xx/5xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ApiError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        rename = "availableRoutes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub available_routes: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_with_service_field_names() {
        let request = RankingRequest {
            ids: vec!["a".into(), "b".into()],
            custom_ranking: vec![MetricWeight {
                weigh_name: "IQ".into(),
                weigh_value: 10,
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ids": ["a", "b"],
                "customRanking": [{"weighName": "IQ", "weighValue": 10}],
            })
        );
    }

    #[test]
    fn test_entry_without_rank_deserializes() {
        let entry: RankingEntry = serde_json::from_str(r#"{"contentId":"a"}"#).unwrap();
        assert_eq!(entry.rank, None);
        let entry: RankingEntry =
            serde_json::from_str(r#"{"contentId":"a","rank":3}"#).unwrap();
        assert_eq!(entry.rank, Some(3));
    }

    #[test]
    fn test_error_envelope_omits_empty_fields() {
        let err = ApiError {
            error: "Not Found".into(),
            message: None,
            available_routes: None,
        };
        assert_eq!(serde_json::to_string(&err).unwrap(), r#"{"error":"Not Found"}"#);
    }
}
