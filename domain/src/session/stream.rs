//! Streaming reply events.
//!
//! A reply stream yields zero or more non-terminal events followed by at
//! most one terminal event. Consumers treat anything after a terminal
//! event as noise and ignore it.

use thiserror::Error;

/// Why a stream ended abnormally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The connection failed or dropped mid-body.
    #[error("Stream transport failure: {0}")]
    Transport(String),

    /// The server spoke, but not in the shape we expect.
    #[error("Stream protocol violation: {0}")]
    Protocol(String),
}

/// One event on a reply stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A chunk of assistant text to append.
    Delta(String),
    /// Out-of-band safety notice; does not interrupt the reply.
    RiskWarning(String),
    /// Terminal success.
    Done,
    /// Terminal failure.
    Failed(StreamError),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Failed(_))
    }
}

/// How an assistant turn ended, as observed by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Failed,
    /// Superseded or torn down locally. No terminal state is written to
    /// the message; partial content stays as-is.
    Cancelled,
}
