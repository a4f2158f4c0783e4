//! Session identity entities.
//!
//! A [`Session`] starts life as a local-only draft. Its first successful
//! send asks the directory service to create a server record, after which
//! the session is irreversibly `Persisted` for the rest of the client run.
//! The client-side [`SessionKey`] stays the same across that promotion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION_KEY: AtomicU64 = AtomicU64::new(1);

/// Opaque client-generated session identity, unique within the process and
/// stable from draft birth through promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey(u64);

impl SessionKey {
    /// Mint a fresh key.
    pub fn next() -> Self {
        Self(NEXT_SESSION_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local-{}", self.0)
    }
}

/// Server-assigned identifier of a persisted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(i64);

impl SessionId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-side lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Local only; discarded without trace if the user switches away before
    /// sending anything.
    Draft,
    /// Known to the directory service under the carried id.
    Persisted(SessionId),
}

/// A consultation session (Entity).
#[derive(Debug, Clone)]
pub struct Session {
    key: SessionKey,
    title: Option<String>,
    state: SessionState,
}

impl Session {
    /// Display label for drafts that were never renamed.
    pub const UNTITLED: &'static str = "New conversation";

    /// Create a fresh local-only draft. No network call; always succeeds.
    pub fn draft() -> Self {
        Self {
            key: SessionKey::next(),
            title: None,
            state: SessionState::Draft,
        }
    }

    /// Wrap a session that already exists on the server, e.g. a directory
    /// listing row the user selected.
    pub fn persisted(id: SessionId, title: impl Into<String>) -> Self {
        Self {
            key: SessionKey::next(),
            title: Some(title.into()),
            state: SessionState::Persisted(id),
        }
    }

    pub fn from_record(record: &SessionRecord) -> Self {
        Self::persisted(record.id, record.title.clone())
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn server_id(&self) -> Option<SessionId> {
        match self.state {
            SessionState::Persisted(id) => Some(id),
            SessionState::Draft => None,
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self.state, SessionState::Draft)
    }

    /// Explicitly assigned title, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(Self::UNTITLED)
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Record the server identity created for this draft and the title it
    /// was created under. Promotion is one-way; a session that is already
    /// persisted keeps its original identity.
    pub fn promote(&mut self, id: SessionId, title: impl Into<String>) {
        if let SessionState::Draft = self.state {
            self.state = SessionState::Persisted(id);
            self.title = Some(title.into());
        }
    }

    /// Whether both values denote the same conversation: the same
    /// client-side object, or two handles onto the same server record.
    pub fn same_identity(&self, other: &Session) -> bool {
        if self.key == other.key {
            return true;
        }
        match (self.state, other.state) {
            (SessionState::Persisted(a), SessionState::Persisted(b)) => a == b,
            _ => false,
        }
    }
}

/// A row in the session directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drafts_get_unique_keys() {
        let a = Session::draft();
        let b = Session::draft();
        assert_ne!(a.key(), b.key());
        assert!(a.is_draft());
        assert_eq!(a.server_id(), None);
    }

    #[test]
    fn promotion_is_one_way() {
        let mut session = Session::draft();
        let key = session.key();

        session.promote(SessionId::new(7), "first chat");
        assert_eq!(session.state(), SessionState::Persisted(SessionId::new(7)));
        assert_eq!(session.title(), Some("first chat"));
        assert_eq!(session.key(), key, "promotion keeps the local identity");

        // A second promotion attempt must not change anything
        session.promote(SessionId::new(99), "other");
        assert_eq!(session.server_id(), Some(SessionId::new(7)));
        assert_eq!(session.title(), Some("first chat"));
    }

    #[test]
    fn same_identity_matches_server_ids() {
        let a = Session::persisted(SessionId::new(3), "a");
        let b = Session::persisted(SessionId::new(3), "b");
        let c = Session::persisted(SessionId::new(4), "c");
        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn distinct_drafts_are_never_the_same() {
        let a = Session::draft();
        let b = Session::draft();
        assert!(!a.same_identity(&b));
        assert!(a.same_identity(&a.clone()));
    }

    #[test]
    fn draft_display_title_falls_back() {
        let mut session = Session::draft();
        assert_eq!(session.display_title(), Session::UNTITLED);
        session.rename("evening check-in");
        assert_eq!(session.display_title(), "evening check-in");
    }
}
