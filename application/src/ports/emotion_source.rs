//! Emotion analysis read port.
//!
//! The server re-analyses a session out-of-band as the conversation grows.
//! The poller reads the latest result through this port; every failure is
//! an isolated, consumed tick — nothing here is fatal.

use async_trait::async_trait;
use solace_domain::{EmotionSnapshot, SessionId};
use thiserror::Error;

/// Errors surfaced by a single emotion fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmotionFetchError {
    /// No analysis exists for the session yet. Expected early in a
    /// conversation; the poller seeds a neutral placeholder and keeps going.
    #[error("No emotion analysis available yet")]
    NotReady,

    #[error("Emotion request failed: {0}")]
    Request(String),

    #[error("Emotion request rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("Emotion response malformed: {0}")]
    Decode(String),
}

/// Read access to the newest emotion analysis of a persisted session.
#[async_trait]
pub trait EmotionSource: Send + Sync {
    /// Fetch the most recent snapshot the server holds for the session.
    async fn latest(&self, id: SessionId) -> Result<EmotionSnapshot, EmotionFetchError>;
}
