//! Core domain concepts shared across subdomains.
//!
//! - [`error::DomainError`] — validation failures rejected before any I/O

pub mod error;
