//! Cache of the newest emotion reading for the current session.
//!
//! Two guards keep poll responses honest: the cache is bound to one
//! session key at a time and rejects writes for any other key, and within
//! the bound key a snapshot only lands if its timestamp is strictly newer
//! than what is already cached. Out-of-order responses can therefore never
//! roll the displayed state backwards, and a poller that outlived a
//! session switch writes into the void.

use solace_domain::{EmotionSnapshot, SessionKey};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Slot {
    key: Option<SessionKey>,
    snapshot: Option<EmotionSnapshot>,
}

/// Holds at most one snapshot, for the session the cache is bound to.
#[derive(Default)]
pub struct EmotionCache {
    slot: RwLock<Slot>,
}

impl EmotionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the cache to a new session and drop whatever was cached.
    pub async fn reset(&self, key: SessionKey) {
        let mut slot = self.slot.write().await;
        slot.key = Some(key);
        slot.snapshot = None;
    }

    /// Offer a freshly fetched snapshot. Returns `true` when it was
    /// accepted: the key matches the binding and the timestamp is strictly
    /// newer than the cached one (an empty cache accepts anything).
    pub async fn merge(&self, key: SessionKey, snapshot: EmotionSnapshot) -> bool {
        let mut slot = self.slot.write().await;
        if slot.key != Some(key) {
            debug!("Emotion cache: dropping snapshot for stale session {key}");
            return false;
        }
        let accepts = match &slot.snapshot {
            Some(cached) => snapshot.supersedes(cached),
            None => true,
        };
        if accepts {
            slot.snapshot = Some(snapshot);
        }
        accepts
    }

    /// Seed the neutral placeholder, only when nothing is cached yet and
    /// the key still matches. Used when a poll tick fails before any
    /// analysis exists.
    pub async fn seed_neutral(&self, key: SessionKey) -> bool {
        let mut slot = self.slot.write().await;
        if slot.key != Some(key) || slot.snapshot.is_some() {
            return false;
        }
        slot.snapshot = Some(EmotionSnapshot::neutral());
        true
    }

    /// The cached snapshot, or the neutral placeholder when none exists.
    pub async fn current(&self) -> EmotionSnapshot {
        self.slot
            .read()
            .await
            .snapshot
            .clone()
            .unwrap_or_else(EmotionSnapshot::neutral)
    }
}
