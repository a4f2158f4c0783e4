//! REST adapter for the message history service.
//!
//! Collaborator timestamps arrive as strings in either RFC 3339 or
//! `YYYY-MM-DD HH:MM:SS` (UTC). Unparseable values degrade to 0 rather
//! than failing the whole transcript load.

use crate::api::client::{ApiClient, ApiError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use solace_application::{HistoryEntry, HistoryError, MessageHistory};
use solace_domain::{Sender, SessionId};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRow {
    sender_type: String,
    content: String,
    created_at: String,
}

fn map_error(e: ApiError) -> HistoryError {
    match e {
        ApiError::Transport(msg) => HistoryError::Request(msg),
        ApiError::Status(status) => HistoryError::Request(format!("HTTP {status}")),
        ApiError::Rejected { code, message } => HistoryError::Rejected { code, message },
        ApiError::Decode(msg) => HistoryError::Decode(msg),
    }
}

fn parse_sender(raw: &str) -> Sender {
    if raw.eq_ignore_ascii_case("user") {
        Sender::User
    } else {
        Sender::Assistant
    }
}

/// Parse a collaborator timestamp into unix millis; 0 when unparseable.
fn parse_timestamp(raw: &str) -> i64 {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.timestamp_millis();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc().timestamp_millis();
    }
    0
}

/// Talks to `/consult/sessions/{id}/messages`.
pub struct RestMessageHistory {
    client: Arc<ApiClient>,
}

impl RestMessageHistory {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageHistory for RestMessageHistory {
    async fn fetch(&self, id: SessionId) -> Result<Vec<HistoryEntry>, HistoryError> {
        let request = self.client.get(&format!("/consult/sessions/{id}/messages"));
        let rows: Vec<HistoryRow> = self
            .client
            .expect_data(request)
            .await
            .map_err(map_error)?;
        Ok(rows
            .into_iter()
            .map(|row| HistoryEntry {
                sender: parse_sender(&row.sender_type),
                content: row.content,
                created_at: parse_timestamp(&row.created_at),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_decode_the_wire_shape() {
        let row: HistoryRow = serde_json::from_value(json!({
            "senderType": "USER",
            "content": "hello",
            "createdAt": "2025-03-14 09:26:53"
        }))
        .unwrap();
        assert_eq!(parse_sender(&row.sender_type), Sender::User);
        assert_eq!(row.content, "hello");
    }

    #[test]
    fn sender_matching_is_case_insensitive() {
        assert_eq!(parse_sender("User"), Sender::User);
        assert_eq!(parse_sender("AI"), Sender::Assistant);
        assert_eq!(parse_sender("assistant"), Sender::Assistant);
    }

    #[test]
    fn rfc3339_timestamps_parse_to_millis() {
        assert_eq!(parse_timestamp("1970-01-01T00:00:01Z"), 1_000);
        assert_eq!(parse_timestamp("1970-01-01T01:00:00+01:00"), 0);
    }

    #[test]
    fn space_separated_timestamps_parse_as_utc() {
        assert_eq!(parse_timestamp("1970-01-01 00:00:02"), 2_000);
    }

    #[test]
    fn unparseable_timestamps_degrade_to_zero() {
        assert_eq!(parse_timestamp("yesterday-ish"), 0);
        assert_eq!(parse_timestamp(""), 0);
    }
}
