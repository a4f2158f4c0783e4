//! Domain error types

use thiserror::Error;

/// Domain-level validation errors.
///
/// These reject input before any network call is made; no state is mutated
/// when one of them is raised.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Message must not be empty")]
    EmptyUserMessage,

    #[error("Title must not be empty")]
    EmptyTitle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_display() {
        assert_eq!(
            DomainError::EmptyUserMessage.to_string(),
            "Message must not be empty"
        );
    }

    #[test]
    fn empty_title_display() {
        assert_eq!(
            DomainError::EmptyTitle.to_string(),
            "Title must not be empty"
        );
    }
}
