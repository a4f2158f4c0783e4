//! Session manager — single source of truth for the current session.
//!
//! Owns the message store, the emotion cache, the stream consumer and the
//! emotion poller, and sequences them: every session switch tears the
//! stream and poller down *before* the stores are reset, so a callback
//! from the old session can never land in the new one. Draft sessions are
//! promoted to persisted on their first successful send; the promotion is
//! one-way.

use crate::poll::emotion_poller::{EmotionPoller, PollSettings};
use crate::ports::directory::{DirectoryError, SessionDirectory, SessionPage};
use crate::ports::emotion_source::EmotionSource;
use crate::ports::history::MessageHistory;
use crate::ports::observer::{NoTurnObserver, TurnObserver};
use crate::ports::reply_stream::ReplyStream;
use crate::session::emotion_cache::EmotionCache;
use crate::session::store::MessageStore;
use crate::stream::consumer::StreamConsumer;
use solace_domain::{
    DomainError, EmotionSnapshot, Message, MessageId, Session, TurnOutcome,
    util::truncate_chars,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{RwLock, oneshot};
use tracing::{debug, info, warn};

/// Character budget for titles derived from an opening message.
const DERIVED_TITLE_CHARS: usize = 20;

/// Errors surfaced synchronously by session operations.
///
/// Stream failures never appear here — they are absorbed into message
/// state and reported through the turn outcome instead.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// Draft promotion failed; the optimistic user message is retained
    /// locally and no assistant turn was attempted.
    #[error("Session could not be created: {0}")]
    Creation(#[source] DirectoryError),

    /// A directory operation (list/rename/delete) failed; local state is
    /// unchanged except where documented.
    #[error("Directory operation failed: {0}")]
    Directory(#[source] DirectoryError),
}

/// Orchestrates the consultation engine around one current session.
pub struct SessionManager {
    directory: Arc<dyn SessionDirectory>,
    history: Arc<dyn MessageHistory>,
    reply_stream: Arc<dyn ReplyStream>,
    emotion_source: Arc<dyn EmotionSource>,
    store: Arc<MessageStore>,
    cache: Arc<EmotionCache>,
    consumer: StreamConsumer,
    poller: Arc<EmotionPoller>,
    current: Arc<RwLock<Session>>,
}

impl SessionManager {
    /// Build a manager starting on a fresh draft session, with a silent
    /// observer and default poll settings.
    pub fn new(
        directory: Arc<dyn SessionDirectory>,
        history: Arc<dyn MessageHistory>,
        reply_stream: Arc<dyn ReplyStream>,
        emotion_source: Arc<dyn EmotionSource>,
    ) -> Self {
        Self::build(
            directory,
            history,
            reply_stream,
            emotion_source,
            Arc::new(NoTurnObserver),
            PollSettings::default(),
        )
    }

    /// Replace the turn observer. Intended for construction time, before
    /// any turn has started.
    pub fn with_observer(self, observer: Arc<dyn TurnObserver>) -> Self {
        let settings = self.poller.settings();
        Self::build(
            self.directory,
            self.history,
            self.reply_stream,
            self.emotion_source,
            observer,
            settings,
        )
    }

    /// Replace the poll settings. Intended for construction time.
    pub fn with_poll_settings(self, settings: PollSettings) -> Self {
        let consumer_observer = self.consumer.observer();
        Self::build(
            self.directory,
            self.history,
            self.reply_stream,
            self.emotion_source,
            consumer_observer,
            settings,
        )
    }

    fn build(
        directory: Arc<dyn SessionDirectory>,
        history: Arc<dyn MessageHistory>,
        reply_stream: Arc<dyn ReplyStream>,
        emotion_source: Arc<dyn EmotionSource>,
        observer: Arc<dyn TurnObserver>,
        settings: PollSettings,
    ) -> Self {
        let store = Arc::new(MessageStore::new());
        let cache = Arc::new(EmotionCache::new());
        let consumer = StreamConsumer::new(
            Arc::clone(&reply_stream),
            Arc::clone(&store),
            observer,
        );
        let poller = Arc::new(EmotionPoller::new(
            Arc::clone(&emotion_source),
            Arc::clone(&cache),
            settings,
        ));
        let draft = Session::draft();
        Self {
            directory,
            history,
            reply_stream,
            emotion_source,
            store,
            cache,
            consumer,
            poller,
            current: Arc::new(RwLock::new(draft)),
        }
    }

    /// The session currently in focus.
    pub async fn current_session(&self) -> Session {
        self.current.read().await.clone()
    }

    /// Snapshot of the current transcript.
    pub async fn messages(&self) -> Vec<Message> {
        self.store.all().await
    }

    /// Newest emotion reading for the current session.
    pub async fn current_mood(&self) -> EmotionSnapshot {
        self.cache.current().await
    }

    /// Validate and send a user message in the current session, promoting
    /// a draft to persisted first when needed. Returns the assistant
    /// placeholder's id and a receiver for the turn's outcome.
    pub async fn send_message(
        &self,
        text: &str,
    ) -> Result<(MessageId, oneshot::Receiver<TurnOutcome>), SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::EmptyUserMessage.into());
        }

        // Optimistic append: the user sees their message immediately,
        // and it stays even if promotion fails
        self.store.append(Message::user(text)).await;

        let (key, session_id) = {
            let mut current = self.current.write().await;
            if current.is_draft() {
                let title = current
                    .title()
                    .map(str::to_string)
                    .unwrap_or_else(|| truncate_chars(text, DERIVED_TITLE_CHARS));
                let id = self
                    .directory
                    .create_with_opening(&title, text)
                    .await
                    .map_err(SessionError::Creation)?;
                current.promote(id, title);
                info!("Session {} promoted to server id {id}", current.key());
            }
            match current.server_id() {
                Some(id) => (current.key(), id),
                // Unreachable after promotion
                None => {
                    return Err(SessionError::Creation(DirectoryError::Request(
                        "session has no server id after promotion".into(),
                    )));
                }
            }
        };

        let (message_id, outcome_rx) = self.consumer.start_turn(session_id, text.into()).await;

        // Relay the outcome and restart the poller once the turn completes,
        // but only if the session is still the current one by then
        let (relay_tx, relay_rx) = oneshot::channel();
        let poller = Arc::clone(&self.poller);
        let current = Arc::clone(&self.current);
        tokio::spawn(async move {
            let outcome = outcome_rx.await.unwrap_or(TurnOutcome::Cancelled);
            if outcome == TurnOutcome::Completed {
                let still_current = current.read().await.key() == key;
                if still_current {
                    poller.start(key, session_id).await;
                } else {
                    debug!("Skipping poll restart: session {key} is no longer current");
                }
            }
            let _ = relay_tx.send(outcome);
        });

        Ok((message_id, relay_rx))
    }

    /// Make `target` the current session. A no-op when it already is.
    /// Cancels the stream and poller, resets the stores, then loads the
    /// persisted transcript and restarts polling where applicable.
    pub async fn switch_to(&self, target: Session) {
        {
            let current = self.current.read().await;
            if current.same_identity(&target) {
                return;
            }
        }

        // Teardown strictly before reset, so late callbacks from the old
        // session hit the stale-id/stale-key guards at worst
        self.consumer.cancel().await;
        self.poller.stop().await;
        self.store.clear().await;

        let key = target.key();
        let server_id = target.server_id();
        self.cache.reset(key).await;
        *self.current.write().await = target;
        debug!("Switched to session {key}");

        let Some(id) = server_id else {
            return;
        };

        match self.history.fetch(id).await {
            Ok(entries) => {
                // A concurrent switch may have moved on while we fetched
                if self.current.read().await.key() == key {
                    self.store
                        .extend(entries.into_iter().map(|e| {
                            Message::from_history(e.sender, e.content, e.created_at)
                        }))
                        .await;
                }
            }
            Err(e) => {
                // The switch still succeeds; the transcript just starts empty
                warn!("History for session {id} could not be loaded: {e}");
            }
        }

        if self.current.read().await.key() == key {
            self.poller.start(key, id).await;
        }
    }

    /// Abandon the current session for a fresh draft. Always succeeds;
    /// no network call is made.
    pub async fn start_draft(&self) -> Session {
        let draft = Session::draft();
        self.switch_to(draft.clone()).await;
        draft
    }

    /// Rename the current session. Drafts rename locally; persisted
    /// sessions go through the directory first and keep their old title
    /// when that fails.
    pub async fn rename_current(&self, title: &str) -> Result<(), SessionError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::EmptyTitle.into());
        }

        let mut current = self.current.write().await;
        if let Some(id) = current.server_id() {
            self.directory
                .rename(id, title)
                .await
                .map_err(SessionError::Directory)?;
        }
        current.rename(title);
        Ok(())
    }

    /// Delete a session from the directory. If it was the current one, a
    /// fresh draft takes its place regardless of how the delete call went —
    /// the client always has some current session.
    pub async fn delete_session(&self, session: &Session) -> Result<(), SessionError> {
        let result = match session.server_id() {
            Some(id) => self
                .directory
                .delete(id)
                .await
                .map_err(SessionError::Directory),
            // A draft has no server record to delete
            None => Ok(()),
        };

        let was_current = self.current.read().await.same_identity(session);
        if was_current {
            self.start_draft().await;
        }
        result
    }

    /// One page of the server-side session listing.
    pub async fn list_sessions(&self, page: u32, page_size: u32) -> Result<SessionPage, SessionError> {
        self.directory
            .list(page, page_size)
            .await
            .map_err(SessionError::Directory)
    }

    /// Cancel the in-flight assistant turn, if any.
    pub async fn cancel_turn(&self) {
        self.consumer.cancel().await;
    }

    /// Stop all background activity. Called on shutdown.
    pub async fn teardown(&self) {
        self.consumer.cancel().await;
        self.poller.stop().await;
    }
}
