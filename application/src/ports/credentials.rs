//! Credential provider port.
//!
//! The engine attaches a bearer token to outgoing requests but does not
//! manage it: absence or expiry surfaces as an opaque transport failure,
//! refresh is the provider's business.

/// Supplies the bearer token for authenticated requests.
pub trait CredentialProvider: Send + Sync {
    /// The current token, if any. `None` sends the request unauthenticated.
    fn bearer_token(&self) -> Option<String>;
}
