//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod credentials;
pub mod directory;
pub mod emotion_source;
pub mod history;
pub mod observer;
pub mod reply_stream;
