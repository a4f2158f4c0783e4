//! Domain layer for solace
//!
//! Core entities of the consultation session engine: session identity and
//! lifecycle, chat messages with their turn state machine, stream boundary
//! events, and derived emotional-state readings.
//!
//! This crate has no I/O and no async; everything here is plain state and
//! the invariants that guard it.

pub mod core;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use core::error::DomainError;
pub use session::{
    emotion::{EmotionSnapshot, RiskLevel},
    entities::{Session, SessionId, SessionKey, SessionRecord, SessionState},
    message::{Message, MessageId, MessageKind, REPLY_FAILED_TEXT, Sender, TurnState},
    stream::{StreamError, StreamEvent, TurnOutcome},
};
