//! Transcript messages and the assistant turn state machine.
//!
//! User messages are complete at creation. Assistant replies start as an
//! empty `Pending` placeholder, accumulate streamed deltas while
//! `Streaming`, and end in exactly one of `Complete` or `Errored`. Once a
//! terminal state is reached the content is frozen.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Shown in place of a reply whose stream failed.
pub const REPLY_FAILED_TEXT: &str = "The reply could not be completed. Please try again.";

/// Process-local message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(u64);

impl MessageId {
    fn next() -> Self {
        Self(NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// What a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Ordinary conversational content.
    Reply,
    /// Out-of-band safety notice delivered during a stream.
    RiskWarning,
}

/// Lifecycle of an assistant turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Placeholder created, no content yet.
    Pending,
    /// At least one delta received.
    Streaming,
    /// Terminal success.
    Complete,
    /// Terminal failure; content replaced with [`REPLY_FAILED_TEXT`].
    Errored,
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub kind: MessageKind,
    pub content: String,
    pub state: TurnState,
    /// Milliseconds since the Unix epoch, set once at creation.
    pub created_at: i64,
}

impl Message {
    /// A user message, complete at birth.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::next(),
            sender: Sender::User,
            kind: MessageKind::Reply,
            content: content.into(),
            state: TurnState::Complete,
            created_at: now_millis(),
        }
    }

    /// An empty assistant placeholder awaiting streamed content.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: MessageId::next(),
            sender: Sender::Assistant,
            kind: MessageKind::Reply,
            content: String::new(),
            state: TurnState::Pending,
            created_at: now_millis(),
        }
    }

    /// A standalone risk warning, complete at birth.
    pub fn risk_warning(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::next(),
            sender: Sender::Assistant,
            kind: MessageKind::RiskWarning,
            content: content.into(),
            state: TurnState::Complete,
            created_at: now_millis(),
        }
    }

    /// Rehydrate a transcript entry fetched from the server.
    pub fn from_history(sender: Sender, content: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: MessageId::next(),
            sender,
            kind: MessageKind::Reply,
            content: content.into(),
            state: TurnState::Complete,
            created_at,
        }
    }

    /// Append a streamed chunk. Ignored once the turn is terminal.
    pub fn push_delta(&mut self, chunk: &str) {
        if self.is_terminal() {
            return;
        }
        self.content.push_str(chunk);
        self.state = TurnState::Streaming;
    }

    /// Mark the turn complete, freezing the accumulated content.
    pub fn complete(&mut self) {
        if !self.is_terminal() {
            self.state = TurnState::Complete;
        }
    }

    /// Mark the turn failed. Whatever partial content was streamed is
    /// replaced with [`REPLY_FAILED_TEXT`].
    pub fn fail(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.content.clear();
        self.content.push_str(REPLY_FAILED_TEXT);
        self.state = TurnState::Errored;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, TurnState::Complete | TurnState::Errored)
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_streams_then_completes() {
        let mut msg = Message::assistant_placeholder();
        assert_eq!(msg.state, TurnState::Pending);
        assert!(msg.content.is_empty());

        msg.push_delta("Hello");
        assert_eq!(msg.state, TurnState::Streaming);
        msg.push_delta(", world");
        assert_eq!(msg.content, "Hello, world");

        msg.complete();
        assert_eq!(msg.state, TurnState::Complete);
    }

    #[test]
    fn terminal_content_is_frozen() {
        let mut msg = Message::assistant_placeholder();
        msg.push_delta("partial");
        msg.complete();

        msg.push_delta(" late");
        assert_eq!(msg.content, "partial");

        msg.fail();
        assert_eq!(msg.state, TurnState::Complete);
        assert_eq!(msg.content, "partial");
    }

    #[test]
    fn failure_replaces_partial_content() {
        let mut msg = Message::assistant_placeholder();
        msg.push_delta("half a thou");
        msg.fail();

        assert_eq!(msg.state, TurnState::Errored);
        assert_eq!(msg.content, REPLY_FAILED_TEXT);

        // Errored is just as frozen as Complete
        msg.push_delta("ght");
        msg.complete();
        assert_eq!(msg.state, TurnState::Errored);
        assert_eq!(msg.content, REPLY_FAILED_TEXT);
    }

    #[test]
    fn user_messages_are_complete_at_birth() {
        let msg = Message::user("hi there");
        assert_eq!(msg.sender, Sender::User);
        assert_eq!(msg.state, TurnState::Complete);
        assert!(msg.created_at > 0);
    }

    #[test]
    fn risk_warnings_are_standalone_and_complete() {
        let msg = Message::risk_warning("please reach out to someone you trust");
        assert_eq!(msg.sender, Sender::Assistant);
        assert_eq!(msg.kind, MessageKind::RiskWarning);
        assert_eq!(msg.state, TurnState::Complete);
    }

    #[test]
    fn ids_are_unique() {
        let a = Message::user("a");
        let b = Message::user("b");
        assert_ne!(a.id, b.id);
    }
}
