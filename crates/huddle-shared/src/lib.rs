//! # huddle-shared
//!
//! Domain types shared by the storage and client crates: identifiers, the
//! group / participant / message / user models, and field validation.

pub mod constants;
pub mod error;
pub mod models;
pub mod types;
pub mod validation;

pub use error::ValidationError;
pub use models::*;
pub use types::{AccountId, GroupId, MessageId};
