//! Domain model structs exchanged with the document store.
//!
//! Every struct derives `Serialize` and `Deserialize`; the document id is
//! carried in the `id` field when decoded and stripped again before a write,
//! so documents hold only their data fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::NO_PARTICIPANTS_LINE;
use crate::types::{AccountId, GroupId, MessageId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A user profile, one document per account in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Account id issued by the auth provider.
    pub id: AccountId,
    pub name: String,
    pub surname: String,
    pub email: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }

    /// Label shown when picking users, e.g. `Ada Lovelace (ada@x.com)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.full_name(), self.email)
    }

    /// Case-insensitive match of `term` against name, surname and email.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.name, &self.surname, &self.email]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A member of a group.
///
/// This is a copy of the user's profile taken when the member was added, not
/// a reference: later profile edits do not reach existing participant
/// records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: AccountId,
    pub name: String,
    pub surname: String,
    pub email: String,
}

impl Participant {
    /// One line of the membership list, e.g. `Ada Lovelace — ada@x.com`.
    pub fn display_line(&self) -> String {
        format!("{} {} — {}", self.name, self.surname, self.email)
    }
}

impl From<&User> for Participant {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<&Participant> for User {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            surname: p.surname.clone(),
            email: p.email.clone(),
        }
    }
}

/// Render a membership list, one line per participant.
pub fn render_participants(participants: &[Participant]) -> Vec<String> {
    if participants.is_empty() {
        return vec![NO_PARTICIPANTS_LINE.to_string()];
    }
    participants.iter().map(Participant::display_line).collect()
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// The editable fields of a group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupFields {
    pub title: String,
    pub description: String,
    pub location: String,
    /// Local date-time as entered by the user, e.g. `2024-01-01T10:00`.
    pub time: String,
}

/// A group activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub time: String,
    /// Stamped once at creation; older documents may lack it.
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Group {
    pub fn fields(&self) -> GroupFields {
        GroupFields {
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            time: self.time.clone(),
        }
    }

    pub fn with_fields(mut self, fields: GroupFields) -> Self {
        self.title = fields.title;
        self.description = fields.description;
        self.location = fields.location;
        self.time = fields.time;
        self
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A chat message inside a group. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    /// Stored as integer microseconds so the feed orders numerically.
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub timestamp: DateTime<Utc>,
    /// Snapshot of the sender's profile at send time.
    pub sender: User,
}
