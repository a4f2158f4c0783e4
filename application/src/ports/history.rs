//! Transcript history port.

use async_trait::async_trait;
use solace_domain::{Sender, SessionId};
use thiserror::Error;

/// Errors surfaced by history fetches.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("History request failed: {0}")]
    Request(String),

    #[error("History request rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("History response malformed: {0}")]
    Decode(String),
}

/// One transcript row as stored on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub sender: Sender,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// Read access to the stored transcript of a persisted session.
#[async_trait]
pub trait MessageHistory: Send + Sync {
    /// Fetch the full transcript in chronological order.
    async fn fetch(&self, id: SessionId) -> Result<Vec<HistoryEntry>, HistoryError>;
}
