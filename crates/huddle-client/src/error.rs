use serde::Serialize;
use thiserror::Error;

use huddle_shared::ValidationError;
use huddle_store::{AuthError, StoreError};

/// Every failure a client operation can report.
///
/// Store errors are classified at the call site that issued them: a failed
/// fetch or subscription becomes [`ClientError::RemoteRead`], a failed
/// create/update/delete becomes [`ClientError::RemoteWrite`], and a missing
/// document becomes [`ClientError::NotFound`] either way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Write failed: {0}")]
    RemoteWrite(String),

    #[error("Read failed: {0}")]
    RemoteRead(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("You must be signed in")]
    NotSignedIn,

    #[error("The editor is not open")]
    NotEditing,
}

impl ClientError {
    /// Classify a store error raised by a read.
    pub fn read(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { collection, id } => Self::not_found_in(&collection, id),
            other => ClientError::RemoteRead(other.to_string()),
        }
    }

    /// Classify a store error raised by a write.
    pub fn write(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { collection, id } => Self::not_found_in(&collection, id),
            other => ClientError::RemoteWrite(other.to_string()),
        }
    }

    pub fn not_found_in(collection: &str, id: impl Into<String>) -> Self {
        ClientError::NotFound {
            kind: kind_of(collection),
            id: id.into(),
        }
    }

    /// Whether the UI should redirect away instead of offering a retry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// The dismissible notification shown for this error.
    pub fn notice(&self) -> Notice {
        let text = match self {
            ClientError::Validation(e) => e.to_string(),
            ClientError::RemoteWrite(_) => "Error saving changes. Please try again.".to_string(),
            ClientError::RemoteRead(_) => "Error loading data.".to_string(),
            ClientError::NotFound { kind, .. } => format!("{kind} not found."),
            ClientError::Auth(e) => e.to_string(),
            ClientError::NotSignedIn => "Please sign in to continue.".to_string(),
            ClientError::NotEditing => self.to_string(),
        };
        Notice::error(text)
    }
}

fn kind_of(collection: &str) -> &'static str {
    let last = collection.rsplit('/').next().unwrap_or(collection);
    match last {
        "groups" => "Group",
        "users" => "User",
        "participants" => "Participant",
        "messages" => "Message",
        "accounts" => "Account",
        _ => "Document",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
