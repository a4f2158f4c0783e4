//! Streamed reply adapter over server-sent events.
//!
//! `open` posts the turn request and hands back a channel of classified
//! events. A background pump feeds the channel: it stops after the first
//! terminal event, emits a transport failure if the body errors
//! mid-stream, and turns a clean end-of-body without a `done` frame into
//! an explicit [`StreamEvent::Done`] so consumers always see exactly one
//! terminal event. Dropping the handle closes the channel and ends the
//! pump on its next send.

use crate::api::client::ApiClient;
use crate::api::sse::{SseParser, classify_frame};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use solace_application::{ReplyStream, StreamHandle};
use solace_domain::{SessionId, StreamError, StreamEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Buffer between the pump and the consumer; deltas are small and the
/// consumer drains quickly.
const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TurnRequest<'a> {
    session_id: i64,
    user_message: &'a str,
}

/// Opens `/consult/stream` and pumps its SSE body into a channel.
pub struct SseReplyStream {
    client: Arc<ApiClient>,
}

impl SseReplyStream {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReplyStream for SseReplyStream {
    async fn open(
        &self,
        session: SessionId,
        user_message: &str,
    ) -> Result<StreamHandle, StreamError> {
        // No response deadline here; the REST timeout would sever a reply
        // that streams longer than it
        let response = self
            .client
            .post_streaming("/consult/stream")
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&TurnRequest {
                session_id: session.get(),
                user_message,
            })
            .send()
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::Transport(format!("HTTP {status}")));
        }

        debug!("Stream opened for session {session}");
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(pump(response.bytes_stream(), tx));
        Ok(StreamHandle::new(rx))
    }
}

/// Drive the SSE body to its first terminal event.
async fn pump<S>(mut body: S, tx: mpsc::Sender<StreamEvent>)
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin + Send,
{
    let mut parser = SseParser::new();

    while let Some(chunk) = body.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx
                    .send(StreamEvent::Failed(StreamError::Transport(e.to_string())))
                    .await;
                return;
            }
        };

        for frame in parser.feed(&bytes) {
            let event = classify_frame(&frame);
            let terminal = event.is_terminal();
            if tx.send(event).await.is_err() {
                // Handle dropped; the turn was superseded
                return;
            }
            if terminal {
                return;
            }
        }
    }

    // Clean end of body without a done frame is terminal success
    let _ = tx.send(StreamEvent::Done).await;
}
