//! Stream consumer — reduces one live assistant turn into the store.
//!
//! At most one turn is in flight per consumer instance. `start_turn`
//! supersedes any active turn before opening a new connection: the old
//! pump task is cancelled *and joined*, so by the time the new placeholder
//! is appended the superseded turn can no longer touch the store or the
//! observer. Within a turn, events are applied strictly in arrival order.
//!
//! Cancellation writes no terminal state — the assistant message keeps its
//! partial content in whatever state it had. Only a real `Done`/`Failed`
//! event (or clean end-of-stream, which counts as success) transitions it.

use crate::ports::observer::TurnObserver;
use crate::ports::reply_stream::ReplyStream;
use crate::session::store::MessageStore;
use solace_domain::{Message, MessageId, SessionId, StreamEvent, TurnOutcome};
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

struct ActiveTurn {
    cancel: CancellationToken,
    pump: JoinHandle<()>,
}

/// Consumes a single streamed assistant turn and writes it into the
/// message store.
pub struct StreamConsumer {
    reply_stream: Arc<dyn ReplyStream>,
    store: Arc<MessageStore>,
    observer: Arc<dyn TurnObserver>,
    active: Mutex<Option<ActiveTurn>>,
}

impl StreamConsumer {
    pub fn new(
        reply_stream: Arc<dyn ReplyStream>,
        store: Arc<MessageStore>,
        observer: Arc<dyn TurnObserver>,
    ) -> Self {
        Self {
            reply_stream,
            store,
            observer,
            active: Mutex::new(None),
        }
    }

    /// The observer this consumer reports to.
    pub fn observer(&self) -> Arc<dyn TurnObserver> {
        Arc::clone(&self.observer)
    }

    /// Start streaming one assistant reply. Any turn still in flight is
    /// superseded first. Returns the placeholder's id and a receiver that
    /// resolves to the turn's outcome.
    pub async fn start_turn(
        &self,
        session: SessionId,
        user_text: String,
    ) -> (MessageId, oneshot::Receiver<TurnOutcome>) {
        self.supersede().await;

        let message_id = self.store.append(Message::assistant_placeholder()).await;
        self.observer.turn_started(message_id);

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let pump = tokio::spawn(Self::pump(
            Arc::clone(&self.reply_stream),
            Arc::clone(&self.store),
            Arc::clone(&self.observer),
            session,
            user_text,
            message_id,
            cancel.clone(),
            outcome_tx,
        ));

        *self.active.lock().await = Some(ActiveTurn { cancel, pump });
        (message_id, outcome_rx)
    }

    /// Abort the in-flight turn, if any. Once this returns, no further
    /// store writes or observer callbacks happen for it. Idempotent.
    pub async fn cancel(&self) {
        self.supersede().await;
    }

    async fn supersede(&self) {
        let previous = self.active.lock().await.take();
        if let Some(turn) = previous {
            turn.cancel.cancel();
            // Join so the superseded pump is provably done before we return
            let _ = turn.pump.await;
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn pump(
        reply_stream: Arc<dyn ReplyStream>,
        store: Arc<MessageStore>,
        observer: Arc<dyn TurnObserver>,
        session: SessionId,
        user_text: String,
        message_id: MessageId,
        cancel: CancellationToken,
        outcome_tx: oneshot::Sender<TurnOutcome>,
    ) {
        let outcome = Self::run_turn(
            &reply_stream,
            &store,
            observer.as_ref(),
            session,
            &user_text,
            message_id,
            &cancel,
        )
        .await;
        let _ = outcome_tx.send(outcome);
    }

    async fn run_turn(
        reply_stream: &Arc<dyn ReplyStream>,
        store: &MessageStore,
        observer: &dyn TurnObserver,
        session: SessionId,
        user_text: &str,
        message_id: MessageId,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        let handle = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Turn {message_id} cancelled before the stream opened");
                return TurnOutcome::Cancelled;
            }
            opened = reply_stream.open(session, user_text) => match opened {
                Ok(handle) => handle,
                Err(e) => {
                    warn!("Stream for session {session} could not be opened: {e}");
                    store.update(message_id, |m| m.fail()).await;
                    observer.turn_finished(TurnOutcome::Failed);
                    return TurnOutcome::Failed;
                }
            }
        };

        let mut receiver = handle.receiver;
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Turn {message_id} cancelled mid-stream");
                    return TurnOutcome::Cancelled;
                }
                event = receiver.recv() => event,
            };

            match event {
                Some(StreamEvent::Delta(chunk)) => {
                    let applied = store.update(message_id, |m| m.push_delta(&chunk)).await;
                    if applied {
                        observer.delta(&chunk);
                    }
                }
                Some(StreamEvent::RiskWarning(content)) => {
                    let inserted = store
                        .insert_after(message_id, Message::risk_warning(content.clone()))
                        .await;
                    if inserted {
                        observer.risk_warning(&content);
                    }
                }
                Some(StreamEvent::Done) => {
                    store.update(message_id, |m| m.complete()).await;
                    observer.turn_finished(TurnOutcome::Completed);
                    return TurnOutcome::Completed;
                }
                Some(StreamEvent::Failed(e)) => {
                    warn!("Turn {message_id} failed: {e}");
                    store.update(message_id, |m| m.fail()).await;
                    observer.turn_finished(TurnOutcome::Failed);
                    return TurnOutcome::Failed;
                }
                // Channel closed without a terminal frame: the adapter's end
                // of stream counts as success
                None => {
                    store.update(message_id, |m| m.complete()).await;
                    observer.turn_finished(TurnOutcome::Completed);
                    return TurnOutcome::Completed;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::observer::NoTurnObserver;
    use crate::ports::reply_stream::StreamHandle;
    use async_trait::async_trait;
    use solace_domain::{MessageKind, SessionId, StreamError, TurnState};
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    // ====== Test Mocks ======

    /// Reply stream whose handles are prepared by the test: each `open`
    /// takes the receiver scripted for that user message, so the test
    /// keeps the sender side and scripts event delivery. Keying by message
    /// keeps the assignment stable even when a turn is superseded before
    /// its `open` ever ran.
    struct ScriptedStream {
        handles: Mutex<HashMap<String, mpsc::Receiver<StreamEvent>>>,
    }

    impl ScriptedStream {
        fn new(handles: Vec<(&str, mpsc::Receiver<StreamEvent>)>) -> Self {
            Self {
                handles: Mutex::new(
                    handles
                        .into_iter()
                        .map(|(message, receiver)| (message.to_string(), receiver))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl ReplyStream for ScriptedStream {
        async fn open(
            &self,
            _session: SessionId,
            user_message: &str,
        ) -> Result<StreamHandle, StreamError> {
            match self.handles.lock().await.remove(user_message) {
                Some(receiver) => Ok(StreamHandle::new(receiver)),
                None => Err(StreamError::Transport("no scripted handle".into())),
            }
        }
    }

    fn consumer_with(
        handles: Vec<(&str, mpsc::Receiver<StreamEvent>)>,
    ) -> (StreamConsumer, Arc<MessageStore>) {
        let store = Arc::new(MessageStore::new());
        let consumer = StreamConsumer::new(
            Arc::new(ScriptedStream::new(handles)),
            Arc::clone(&store),
            Arc::new(NoTurnObserver),
        );
        (consumer, store)
    }

    #[tokio::test]
    async fn deltas_are_applied_in_arrival_order() {
        let (tx, rx) = mpsc::channel(8);
        let (consumer, store) = consumer_with(vec![("hi", rx)]);

        let (id, outcome) = consumer.start_turn(SessionId::new(1), "hi".into()).await;

        for chunk in ["a", "b", "c"] {
            tx.send(StreamEvent::Delta(chunk.into())).await.unwrap();
            // Artificial delay between deliveries must not affect ordering
            tokio::task::yield_now().await;
        }
        tx.send(StreamEvent::Done).await.unwrap();

        assert_eq!(outcome.await.unwrap(), TurnOutcome::Completed);
        let all = store.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].content, "abc");
        assert_eq!(all[0].state, TurnState::Complete);
    }

    #[tokio::test]
    async fn risk_warning_is_a_separate_message() {
        let (tx, rx) = mpsc::channel(8);
        let (consumer, store) = consumer_with(vec![("hi", rx)]);

        let (id, outcome) = consumer.start_turn(SessionId::new(1), "hi".into()).await;

        tx.send(StreamEvent::Delta("I hear".into())).await.unwrap();
        tx.send(StreamEvent::RiskWarning("please reach out".into()))
            .await
            .unwrap();
        tx.send(StreamEvent::Delta(" you".into())).await.unwrap();
        tx.send(StreamEvent::Done).await.unwrap();
        assert_eq!(outcome.await.unwrap(), TurnOutcome::Completed);

        let all = store.all().await;
        assert_eq!(all.len(), 2);
        // Reply content is continuous across the interruption
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].content, "I hear you");
        assert_eq!(all[0].kind, MessageKind::Reply);
        assert_eq!(all[1].kind, MessageKind::RiskWarning);
        assert_eq!(all[1].content, "please reach out");
    }

    #[tokio::test]
    async fn failure_event_errors_the_placeholder() {
        let (tx, rx) = mpsc::channel(8);
        let (consumer, store) = consumer_with(vec![("hi", rx)]);

        let (_, outcome) = consumer.start_turn(SessionId::new(1), "hi".into()).await;

        tx.send(StreamEvent::Delta("part".into())).await.unwrap();
        tx.send(StreamEvent::Failed(StreamError::Transport("reset".into())))
            .await
            .unwrap();
        assert_eq!(outcome.await.unwrap(), TurnOutcome::Failed);

        let all = store.all().await;
        assert_eq!(all[0].state, TurnState::Errored);
        assert_eq!(all[0].content, solace_domain::REPLY_FAILED_TEXT);
    }

    #[tokio::test]
    async fn open_failure_errors_the_placeholder() {
        let (consumer, store) = consumer_with(vec![]);

        let (_, outcome) = consumer.start_turn(SessionId::new(1), "hi".into()).await;
        assert_eq!(outcome.await.unwrap(), TurnOutcome::Failed);

        let all = store.all().await;
        assert_eq!(all[0].state, TurnState::Errored);
    }

    #[tokio::test]
    async fn clean_end_of_stream_counts_as_success() {
        let (tx, rx) = mpsc::channel(8);
        let (consumer, store) = consumer_with(vec![("hi", rx)]);

        let (_, outcome) = consumer.start_turn(SessionId::new(1), "hi".into()).await;
        tx.send(StreamEvent::Delta("full reply".into())).await.unwrap();
        drop(tx);

        assert_eq!(outcome.await.unwrap(), TurnOutcome::Completed);
        let all = store.all().await;
        assert_eq!(all[0].state, TurnState::Complete);
        assert_eq!(all[0].content, "full reply");
    }

    #[tokio::test]
    async fn new_turn_supersedes_the_old_one() {
        let (old_tx, old_rx) = mpsc::channel(8);
        let (new_tx, new_rx) = mpsc::channel(8);
        let (consumer, store) = consumer_with(vec![("one", old_rx), ("two", new_rx)]);

        let (old_id, old_outcome) = consumer.start_turn(SessionId::new(1), "one".into()).await;
        let (new_id, new_outcome) = consumer.start_turn(SessionId::new(1), "two".into()).await;

        // The first turn's handle is still open, but its pump is gone:
        // these sends land in a channel nobody reads
        let _ = old_tx.send(StreamEvent::Delta("stale".into())).await;
        let _ = old_tx.send(StreamEvent::Done).await;

        new_tx.send(StreamEvent::Delta("fresh".into())).await.unwrap();
        new_tx.send(StreamEvent::Done).await.unwrap();

        assert_eq!(old_outcome.await.unwrap(), TurnOutcome::Cancelled);
        assert_eq!(new_outcome.await.unwrap(), TurnOutcome::Completed);

        let all = store.all().await;
        assert_eq!(all.len(), 2);
        let old = all.iter().find(|m| m.id == old_id).unwrap();
        let new = all.iter().find(|m| m.id == new_id).unwrap();
        // The superseded placeholder got zero deltas and no terminal state
        assert_eq!(old.content, "");
        assert_eq!(old.state, TurnState::Pending);
        assert_eq!(new.content, "fresh");
        assert_eq!(new.state, TurnState::Complete);
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_freezes_nothing() {
        let (tx, rx) = mpsc::channel(8);
        let (consumer, store) = consumer_with(vec![("hi", rx)]);

        let (id, outcome) = consumer.start_turn(SessionId::new(1), "hi".into()).await;
        tx.send(StreamEvent::Delta("partial ".into())).await.unwrap();
        // Let the pump apply the delta before cancelling
        tokio::task::yield_now().await;

        consumer.cancel().await;
        consumer.cancel().await;
        assert_eq!(outcome.await.unwrap(), TurnOutcome::Cancelled);

        // Events sent after cancel returned must change nothing
        let _ = tx.send(StreamEvent::Delta("late".into())).await;
        let _ = tx.send(StreamEvent::Done).await;
        tokio::task::yield_now().await;

        let all = store.all().await;
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].content, "partial ");
        assert_eq!(all[0].state, TurnState::Streaming);
    }

    #[tokio::test]
    async fn cancel_without_a_turn_is_a_no_op() {
        let (consumer, store) = consumer_with(vec![]);
        consumer.cancel().await;
        assert!(store.is_empty().await);
    }
}
