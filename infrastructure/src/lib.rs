//! Infrastructure layer for solace
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod api;
pub mod config;
pub mod credentials;

// Re-export commonly used types
pub use api::{
    ApiClient, ApiError, RestEmotionSource, RestMessageHistory, RestSessionDirectory,
    SseReplyStream,
};
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use credentials::{StaticCredentials, TOKEN_ENV};
