//! Client command handlers.
//!
//! Each sub-module groups related commands by domain.  Every command is a
//! free async function taking the [`AppContext`](crate::state::AppContext)
//! plus its arguments, and returns a [`ClientError`](crate::error::ClientError)
//! that the UI shell turns into a notice.

pub mod auth;
pub mod groups;
pub mod messaging;
pub mod participants;
pub mod profile;
