//! Bounded emotion polling.

pub mod emotion_poller;
