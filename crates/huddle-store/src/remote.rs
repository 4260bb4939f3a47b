//! Collaborator interfaces consumed by the client core.
//!
//! The client only ever talks to these traits.  Implementations must be
//! cheap to clone (handles around shared state) so views and commands can
//! each hold their own copy.

use std::future::Future;

use tokio::sync::watch;

use huddle_shared::AccountId;

use crate::error::{AuthError, Result};
use crate::query::{Document, Fields, Query, WriteBatch};
use crate::subscription::Subscription;

/// A document database with live-query subscriptions.
pub trait DocumentStore: Clone + Send + Sync + 'static {
    /// Point read; `None` when the document does not exist.
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Document>>> + Send;

    /// Create or overwrite a document.
    fn set(&self, collection: &str, id: &str, fields: Fields)
        -> impl Future<Output = Result<()>> + Send;

    /// Insert a document under a store-generated id and return that id.
    fn add(&self, collection: &str, fields: Fields) -> impl Future<Output = Result<String>> + Send;

    /// Merge fields into an existing document; `NotFound` if it is missing.
    fn update(
        &self,
        collection: &str,
        id: &str,
        partial: Fields,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a document.  Deleting a missing document succeeds.
    fn delete(&self, collection: &str, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Enumerate a collection.
    fn list(&self, query: &Query) -> impl Future<Output = Result<Vec<Document>>> + Send;

    /// Apply every write of the batch atomically.
    fn commit(&self, batch: WriteBatch) -> impl Future<Output = Result<()>> + Send;

    /// Start a live query.  The current result set is delivered first, then
    /// the full result set again after every change to the collection.
    ///
    /// Must be called from within a tokio runtime.
    fn subscribe(&self, query: Query) -> Result<Subscription>;
}

/// Email/password account management.
pub trait AuthProvider: Clone + Send + Sync + 'static {
    /// Create an account and sign it in.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = std::result::Result<AccountId, AuthError>> + Send;

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = std::result::Result<AccountId, AuthError>> + Send;

    fn sign_out(&self) -> impl Future<Output = ()> + Send;

    /// Replace the password of the signed-in account.
    fn update_password(
        &self,
        new_password: &str,
    ) -> impl Future<Output = std::result::Result<(), AuthError>> + Send;

    /// Delete the signed-in account and sign out.
    fn delete_account(&self) -> impl Future<Output = std::result::Result<(), AuthError>> + Send;

    fn current_account_id(&self) -> Option<AccountId>;

    /// Observe sign-in / sign-out transitions.
    fn on_auth_state_change(&self) -> watch::Receiver<Option<AccountId>>;
}
