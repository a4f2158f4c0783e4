//! Emotion poller — bounded periodic refresh of the emotion cache.
//!
//! The server analyses sessions asynchronously and offers no push
//! notification, so the client polls: one immediate fetch, then one per
//! interval, up to a hard tick cap. The loop ends early the moment a fetch
//! merges into the cache — once a fresh reading lands, the signal is
//! assumed stable. A failed tick never stops the loop; it only seeds the
//! neutral placeholder when nothing is cached yet.
//!
//! One poller runs at a time per instance; `start` supersedes any running
//! loop the same way the stream consumer supersedes turns.

use crate::ports::emotion_source::EmotionSource;
use crate::session::emotion_cache::EmotionCache;
use solace_domain::{SessionId, SessionKey};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Tuning knobs of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between fetch attempts.
    pub interval: Duration,
    /// Hard cap on fetch attempts per `start`, the immediate first one
    /// included.
    pub max_ticks: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_ticks: 30,
        }
    }
}

struct ActivePoll {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Periodically fetches the emotion snapshot of the active session into
/// the cache.
pub struct EmotionPoller {
    source: Arc<dyn EmotionSource>,
    cache: Arc<EmotionCache>,
    settings: PollSettings,
    active: Mutex<Option<ActivePoll>>,
}

impl EmotionPoller {
    pub fn new(
        source: Arc<dyn EmotionSource>,
        cache: Arc<EmotionCache>,
        settings: PollSettings,
    ) -> Self {
        Self {
            source,
            cache,
            settings,
            active: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Begin polling for the given session, stopping any loop already
    /// running. `key` must be the key the cache is bound to; a switch that
    /// rebinds the cache makes this loop's writes no-ops.
    pub async fn start(&self, key: SessionKey, session: SessionId) {
        self.stop().await;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(Self::poll_loop(
            Arc::clone(&self.source),
            Arc::clone(&self.cache),
            self.settings,
            key,
            session,
            cancel.clone(),
        ));
        *self.active.lock().await = Some(ActivePoll { cancel, task });
    }

    /// Cancel the running loop and wait for it to finish. No-op when idle.
    pub async fn stop(&self) {
        let previous = self.active.lock().await.take();
        if let Some(poll) = previous {
            poll.cancel.cancel();
            let _ = poll.task.await;
        }
    }

    async fn poll_loop(
        source: Arc<dyn EmotionSource>,
        cache: Arc<EmotionCache>,
        settings: PollSettings,
        key: SessionKey,
        session: SessionId,
        cancel: CancellationToken,
    ) {
        let mut interval = tokio::time::interval(settings.interval);

        for tick in 0..settings.max_ticks {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = interval.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                fetched = source.latest(session) => fetched,
            };

            match fetched {
                Ok(snapshot) => {
                    if cache.merge(key, snapshot).await {
                        debug!("Emotion poll: fresh reading for session {session} on tick {tick}");
                        return;
                    }
                }
                Err(e) => {
                    // An isolated tick failure; keep the timer running
                    debug!("Emotion poll tick {tick} for session {session} failed: {e}");
                    cache.seed_neutral(key).await;
                }
            }
        }
        debug!("Emotion poll: tick cap reached for session {session}");
    }
}
