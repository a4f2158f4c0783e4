//! Streamed assistant turn consumption.

pub mod consumer;
