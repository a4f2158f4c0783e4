//! Reply stream port.
//!
//! Defines how the stream consumer obtains a live assistant reply. The
//! adapter owns the transport; the consumer only sees a channel of parsed
//! [`StreamEvent`]s.

use async_trait::async_trait;
use solace_domain::{SessionId, StreamError, StreamEvent};
use tokio::sync::mpsc;

/// Handle for receiving the events of one in-flight assistant turn.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`. The adapter guarantees at most
/// one terminal event per handle and emits nothing after it; dropping the
/// handle aborts the underlying transport.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }
}

/// Opens the live server-push channel for an assistant turn.
#[async_trait]
pub trait ReplyStream: Send + Sync {
    /// Start one streamed reply for `user_message` in the given session.
    ///
    /// An `Err` here means the connection could not be established at all;
    /// failures after that point arrive as [`StreamEvent::Failed`] on the
    /// handle instead.
    async fn open(
        &self,
        session: SessionId,
        user_message: &str,
    ) -> Result<StreamHandle, StreamError>;
}
