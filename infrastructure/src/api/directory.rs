//! REST adapter for the session directory service.

use crate::api::client::{ApiClient, ApiError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solace_application::{DirectoryError, SessionDirectory, SessionPage};
use solace_domain::{SessionId, SessionRecord};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct SessionRow {
    id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionListData {
    rows: Vec<SessionRow>,
    total: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest<'a> {
    title: &'a str,
    first_message: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSession {
    session_id: i64,
}

#[derive(Debug, Serialize)]
struct RenameRequest<'a> {
    title: &'a str,
}

fn map_error(e: ApiError) -> DirectoryError {
    match e {
        ApiError::Transport(msg) => DirectoryError::Request(msg),
        ApiError::Status(status) => DirectoryError::Request(format!("HTTP {status}")),
        ApiError::Rejected { code, message } => DirectoryError::Rejected { code, message },
        ApiError::Decode(msg) => DirectoryError::Decode(msg),
    }
}

/// Talks to the `/consult/sessions` endpoints.
pub struct RestSessionDirectory {
    client: Arc<ApiClient>,
}

impl RestSessionDirectory {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionDirectory for RestSessionDirectory {
    async fn list(&self, page: u32, page_size: u32) -> Result<SessionPage, DirectoryError> {
        let request = self
            .client
            .get("/consult/sessions")
            .query(&[("page", page), ("pageSize", page_size)]);
        let data: SessionListData = self
            .client
            .expect_data(request)
            .await
            .map_err(map_error)?;
        debug!("Directory list: page {page}, {} of {} rows", data.rows.len(), data.total);
        Ok(SessionPage {
            records: data
                .rows
                .into_iter()
                .map(|row| SessionRecord {
                    id: SessionId::new(row.id),
                    title: row.title,
                })
                .collect(),
            total: data.total,
        })
    }

    async fn create_with_opening(
        &self,
        title: &str,
        opening_message: &str,
    ) -> Result<SessionId, DirectoryError> {
        let request = self.client.post("/consult/sessions").json(&CreateSessionRequest {
            title,
            first_message: opening_message,
        });
        let created: CreatedSession = self
            .client
            .expect_data(request)
            .await
            .map_err(map_error)?;
        Ok(SessionId::new(created.session_id))
    }

    async fn rename(&self, id: SessionId, title: &str) -> Result<(), DirectoryError> {
        let request = self
            .client
            .put(&format!("/consult/sessions/{id}/title"))
            .json(&RenameRequest { title });
        self.client.expect_ok(request).await.map_err(map_error)
    }

    async fn delete(&self, id: SessionId) -> Result<(), DirectoryError> {
        let request = self.client.delete(&format!("/consult/sessions/{id}"));
        self.client.expect_ok(request).await.map_err(map_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_data_decodes_the_wire_shape() {
        let data: SessionListData = serde_json::from_value(json!({
            "rows": [
                {"id": 3, "title": "Tuesday evening"},
                {"id": 5, "title": "Work stress"}
            ],
            "total": 12
        }))
        .unwrap();
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[0], SessionRow { id: 3, title: "Tuesday evening".into() });
        assert_eq!(data.total, 12);
    }

    #[test]
    fn create_request_serializes_camel_case() {
        let body = serde_json::to_value(CreateSessionRequest {
            title: "first chat",
            first_message: "hello",
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"title": "first chat", "firstMessage": "hello"})
        );
    }

    #[test]
    fn created_session_decodes_camel_case() {
        let created: CreatedSession =
            serde_json::from_value(json!({"sessionId": 41})).unwrap();
        assert_eq!(created.session_id, 41);
    }

    #[test]
    fn api_errors_map_onto_directory_errors() {
        assert_eq!(
            map_error(ApiError::Status(503)),
            DirectoryError::Request("HTTP 503".into())
        );
        assert_eq!(
            map_error(ApiError::Rejected {
                code: "forbidden".into(),
                message: "not yours".into()
            }),
            DirectoryError::Rejected {
                code: "forbidden".into(),
                message: "not yours".into()
            }
        );
    }
}
