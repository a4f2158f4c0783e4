//! In-memory transcript of the current session.
//!
//! The store owns the ordered message sequence exclusively; the stream
//! consumer and session manager mutate it only through these methods.
//! `update` and `insert_after` silently refuse ids that are no longer
//! present, which is what turns a late callback from a superseded stream
//! into a harmless no-op instead of a write into the wrong transcript.

use solace_domain::{Message, MessageId};
use tokio::sync::RwLock;

/// Ordered, append-only log of chat turns. Pure state, no I/O.
#[derive(Default)]
pub struct MessageStore {
    messages: RwLock<Vec<Message>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its id.
    pub async fn append(&self, message: Message) -> MessageId {
        let id = message.id;
        self.messages.write().await.push(message);
        id
    }

    /// Append a batch, e.g. a transcript loaded from the history service.
    pub async fn extend(&self, batch: impl IntoIterator<Item = Message>) {
        self.messages.write().await.extend(batch);
    }

    /// Apply `patch` to the message with the given id. Returns `false`
    /// without touching anything when the id is gone — the stale-callback
    /// guard.
    pub async fn update<F>(&self, id: MessageId, patch: F) -> bool
    where
        F: FnOnce(&mut Message),
    {
        let mut messages = self.messages.write().await;
        match messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                patch(message);
                true
            }
            None => false,
        }
    }

    /// Insert a message directly after the one with id `anchor`, keeping
    /// risk warnings adjacent to the reply they interrupted. Returns
    /// `false` when the anchor is gone.
    pub async fn insert_after(&self, anchor: MessageId, message: Message) -> bool {
        let mut messages = self.messages.write().await;
        match messages.iter().position(|m| m.id == anchor) {
            Some(index) => {
                messages.insert(index + 1, message);
                true
            }
            None => false,
        }
    }

    /// Drop the whole transcript. Used on session switch.
    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }

    /// Snapshot of the transcript in order.
    pub async fn all(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solace_domain::{Message, TurnState};

    #[tokio::test]
    async fn append_preserves_order() {
        let store = MessageStore::new();
        store.append(Message::user("first")).await;
        store.append(Message::user("second")).await;

        let all = store.all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content, "first");
        assert_eq!(all[1].content, "second");
    }

    #[tokio::test]
    async fn update_patches_by_id() {
        let store = MessageStore::new();
        let id = store.append(Message::assistant_placeholder()).await;

        let applied = store.update(id, |m| m.push_delta("hi")).await;
        assert!(applied);

        let all = store.all().await;
        assert_eq!(all[0].content, "hi");
        assert_eq!(all[0].state, TurnState::Streaming);
    }

    #[tokio::test]
    async fn update_on_missing_id_is_a_no_op() {
        let store = MessageStore::new();
        let stale = store.append(Message::assistant_placeholder()).await;
        store.clear().await;
        store.append(Message::user("fresh transcript")).await;

        let applied = store.update(stale, |m| m.push_delta("late delta")).await;
        assert!(!applied);

        let all = store.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "fresh transcript");
    }

    #[tokio::test]
    async fn insert_after_places_next_to_anchor() {
        let store = MessageStore::new();
        let anchor = store.append(Message::assistant_placeholder()).await;
        store.append(Message::user("next question")).await;

        let inserted = store
            .insert_after(anchor, Message::risk_warning("take care"))
            .await;
        assert!(inserted);

        let all = store.all().await;
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].content, "take care");
    }

    #[tokio::test]
    async fn insert_after_missing_anchor_is_a_no_op() {
        let store = MessageStore::new();
        let stale = store.append(Message::assistant_placeholder()).await;
        store.clear().await;

        let inserted = store
            .insert_after(stale, Message::risk_warning("late warning"))
            .await;
        assert!(!inserted);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let store = MessageStore::new();
        store.append(Message::user("gone soon")).await;
        assert_eq!(store.len().await, 1);

        store.clear().await;
        assert!(store.is_empty().await);
    }
}
