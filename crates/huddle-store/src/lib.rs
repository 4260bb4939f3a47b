//! # huddle-store
//!
//! The backend collaborators of the Huddle client: a document store with
//! live-query subscriptions and an email/password authentication provider.
//!
//! Both are described by traits ([`DocumentStore`], [`AuthProvider`]) so the
//! client core never depends on a concrete backend.  [`LocalBackend`]
//! implements both on top of a single SQLite database: a synchronous
//! [`Database`] handle provides typed CRUD helpers, and the backend adds the
//! async surface, atomic batches and change fan-out for subscriptions.

pub mod accounts;
pub mod backend;
pub mod database;
pub mod documents;
pub mod migrations;
pub mod query;
pub mod remote;
pub mod subscription;

mod error;

pub use backend::LocalBackend;
pub use database::Database;
pub use error::{AuthError, Result, StoreError};
pub use query::{Document, Fields, Filter, Query, WriteBatch, WriteOp};
pub use remote::{AuthProvider, DocumentStore};
pub use subscription::Subscription;
