//! REST adapter for the per-session emotion analysis read.

use crate::api::client::{ApiClient, ApiError};
use async_trait::async_trait;
use serde::Deserialize;
use solace_application::{EmotionFetchError, EmotionSource};
use solace_domain::{EmotionSnapshot, RiskLevel, SessionId};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmotionData {
    primary_emotion: String,
    score: f32,
    risk_level: u8,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    suggestion: String,
    timestamp: i64,
}

impl From<EmotionData> for EmotionSnapshot {
    fn from(data: EmotionData) -> Self {
        EmotionSnapshot {
            primary_emotion: data.primary_emotion,
            score: data.score,
            risk_level: RiskLevel::from_index(data.risk_level),
            keywords: data.keywords,
            suggestion: data.suggestion,
            timestamp: data.timestamp,
        }
    }
}

fn map_error(e: ApiError) -> EmotionFetchError {
    match e {
        // No analysis row yet: the server reports it as not-found or an
        // empty envelope
        ApiError::Status(404) => EmotionFetchError::NotReady,
        ApiError::Decode(msg) if msg == "envelope has no data" => EmotionFetchError::NotReady,
        ApiError::Transport(msg) => EmotionFetchError::Request(msg),
        ApiError::Status(status) => EmotionFetchError::Request(format!("HTTP {status}")),
        ApiError::Rejected { code, message } => EmotionFetchError::Rejected { code, message },
        ApiError::Decode(msg) => EmotionFetchError::Decode(msg),
    }
}

/// Talks to `/consult/sessions/{id}/emotion`.
pub struct RestEmotionSource {
    client: Arc<ApiClient>,
}

impl RestEmotionSource {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmotionSource for RestEmotionSource {
    async fn latest(&self, id: SessionId) -> Result<EmotionSnapshot, EmotionFetchError> {
        let request = self.client.get(&format!("/consult/sessions/{id}/emotion"));
        let data: EmotionData = self
            .client
            .expect_data(request)
            .await
            .map_err(map_error)?;
        Ok(data.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emotion_data_decodes_and_maps() {
        let data: EmotionData = serde_json::from_value(json!({
            "primaryEmotion": "anxious",
            "score": 38.5,
            "riskLevel": 2,
            "keywords": ["deadline", "sleep"],
            "suggestion": "Try a short walk before bed.",
            "timestamp": 1_736_000_000_000i64
        }))
        .unwrap();

        let snapshot = EmotionSnapshot::from(data);
        assert_eq!(snapshot.primary_emotion, "anxious");
        assert_eq!(snapshot.risk_level, RiskLevel::Moderate);
        assert_eq!(snapshot.keywords.len(), 2);
        assert_eq!(snapshot.timestamp, 1_736_000_000_000);
    }

    #[test]
    fn optional_fields_default() {
        let data: EmotionData = serde_json::from_value(json!({
            "primaryEmotion": "calm",
            "score": 75.0,
            "riskLevel": 0,
            "timestamp": 1
        }))
        .unwrap();
        assert!(data.keywords.is_empty());
        assert!(data.suggestion.is_empty());
    }

    #[test]
    fn out_of_range_risk_clamps_to_severe() {
        let data: EmotionData = serde_json::from_value(json!({
            "primaryEmotion": "distressed",
            "score": 10.0,
            "riskLevel": 9,
            "timestamp": 1
        }))
        .unwrap();
        assert_eq!(EmotionSnapshot::from(data).risk_level, RiskLevel::Severe);
    }

    #[test]
    fn not_found_and_empty_data_mean_not_ready() {
        assert_eq!(map_error(ApiError::Status(404)), EmotionFetchError::NotReady);
        assert_eq!(
            map_error(ApiError::Decode("envelope has no data".into())),
            EmotionFetchError::NotReady
        );
        assert!(matches!(
            map_error(ApiError::Status(500)),
            EmotionFetchError::Request(_)
        ));
    }
}
