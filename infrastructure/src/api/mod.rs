//! REST and SSE adapters for the consultation service
//!
//! Everything here implements a port from the application layer over the
//! service's HTTP API: enveloped JSON for request/response endpoints and
//! server-sent events for the streamed reply.

pub mod client;
pub mod directory;
pub mod emotion;
pub mod history;
pub mod sse;
pub mod stream;

pub use client::{ApiClient, ApiError};
pub use directory::RestSessionDirectory;
pub use emotion::RestEmotionSource;
pub use history::RestMessageHistory;
pub use stream::SseReplyStream;
