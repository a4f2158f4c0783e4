//! Session directory port.
//!
//! The directory is the server-side catalogue of persisted sessions. The
//! session manager drives it for creation, listing, renaming and deletion.

use async_trait::async_trait;
use solace_domain::{SessionId, SessionRecord};
use thiserror::Error;

/// Errors surfaced by directory operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The request never produced a usable response.
    #[error("Directory request failed: {0}")]
    Request(String),

    /// The server answered with a business-level rejection.
    #[error("Directory request rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The response arrived but could not be decoded.
    #[error("Directory response malformed: {0}")]
    Decode(String),
}

/// One page of the session listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPage {
    pub records: Vec<SessionRecord>,
    /// Total number of sessions on the server, across all pages.
    pub total: u64,
}

/// Server-side session catalogue.
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    /// Fetch one page of sessions, newest first. Pages are 1-based.
    async fn list(&self, page: u32, page_size: u32) -> Result<SessionPage, DirectoryError>;

    /// Create a session seeded with its opening user message and return
    /// the server-assigned id.
    async fn create_with_opening(
        &self,
        title: &str,
        opening_message: &str,
    ) -> Result<SessionId, DirectoryError>;

    /// Change the stored title of a persisted session.
    async fn rename(&self, id: SessionId, title: &str) -> Result<(), DirectoryError>;

    /// Remove a persisted session and its transcript.
    async fn delete(&self, id: SessionId) -> Result<(), DirectoryError>;
}
