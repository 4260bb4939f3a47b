use thiserror::Error;

/// A required input is missing or malformed.
///
/// Raised before any remote call is attempted; never sent to the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Participant {id} is missing {field}")]
    IncompleteParticipant { id: String, field: &'static str },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Message is too long: {len} characters (max {max})")]
    MessageTooLong { len: usize, max: usize },
}
