//! Consultation session domain.
//!
//! - [`entities::Session`] — session identity and draft/persisted lifecycle
//! - [`message::Message`] — a chat turn with its streaming state machine
//! - [`stream::StreamEvent`] — the closed event type of the reply stream
//! - [`emotion::EmotionSnapshot`] — derived emotional-state reading

pub mod emotion;
pub mod entities;
pub mod message;
pub mod stream;
