//! Session state and orchestration.
//!
//! - [`store::MessageStore`] — the transcript of the current session
//! - [`emotion_cache::EmotionCache`] — newest emotion reading, key-bound
//! - [`manager::SessionManager`] — the orchestration boundary

pub mod emotion_cache;
pub mod manager;
pub mod store;
