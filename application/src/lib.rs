//! Application layer for solace
//!
//! This crate holds the state and orchestration around the active
//! consultation session, plus the port definitions that infrastructure
//! adapters implement. It depends only on the domain layer.

pub mod poll;
pub mod ports;
pub mod session;
pub mod stream;

// Re-export commonly used types
pub use poll::emotion_poller::{EmotionPoller, PollSettings};
pub use ports::{
    credentials::CredentialProvider,
    directory::{DirectoryError, SessionDirectory, SessionPage},
    emotion_source::{EmotionFetchError, EmotionSource},
    history::{HistoryEntry, HistoryError, MessageHistory},
    observer::{NoTurnObserver, TurnObserver},
    reply_stream::{ReplyStream, StreamHandle},
};
pub use session::{
    emotion_cache::EmotionCache,
    manager::{SessionError, SessionManager},
    store::MessageStore,
};
pub use stream::consumer::StreamConsumer;
