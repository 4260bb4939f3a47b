//! SQLite-backed implementation of both collaborator traits.
//!
//! [`LocalBackend`] shares one [`Database`] behind a mutex.  The lock is
//! only taken inside synchronous helpers and never held across an await.
//! Every successful write broadcasts the touched collection path; each live
//! subscription runs a task that re-queries on a matching broadcast and
//! pushes the full result set.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use huddle_shared::constants::MIN_PASSWORD_LEN;
use huddle_shared::validation::validate_email;
use huddle_shared::AccountId;

use crate::accounts::Account;
use crate::database::Database;
use crate::error::{AuthError, Result, StoreError};
use crate::query::{Document, Fields, Query, WriteBatch};
use crate::remote::{AuthProvider, DocumentStore};
use crate::subscription::Subscription;

/// Capacity of the change fan-out.  A lagging subscriber re-queries, so
/// dropped notifications only coalesce snapshots.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct LocalBackend {
    db: Arc<Mutex<Database>>,
    changes: broadcast::Sender<String>,
    auth_state: Arc<watch::Sender<Option<AccountId>>>,
}

impl LocalBackend {
    pub fn new(db: Database) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let (auth_state, _) = watch::channel(None);
        Self {
            db: Arc::new(Mutex::new(db)),
            changes,
            auth_state: Arc::new(auth_state),
        }
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        with_db(&self.db, f)
    }

    fn notify(&self, collection: &str) {
        // No receivers simply means no open subscriptions.
        let _ = self.changes.send(collection.to_string());
    }

    fn require_account(&self) -> std::result::Result<AccountId, AuthError> {
        self.auth_state.borrow().clone().ok_or(AuthError::NotSignedIn)
    }
}

fn with_db<T>(db: &Mutex<Database>, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
    let guard = db.lock().map_err(|_| StoreError::LockPoisoned)?;
    f(&guard)
}

fn check_password_strength(password: &str) -> std::result::Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

impl DocumentStore for LocalBackend {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.with_db(|db| db.get_document(collection, id))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        self.with_db(|db| db.set_document(collection, id, &fields))?;
        debug!(collection, id, "document set");
        self.notify(collection);
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.with_db(|db| db.set_document(collection, &id, &fields))?;
        debug!(collection, id = %id, "document added");
        self.notify(collection);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, partial: Fields) -> Result<()> {
        self.with_db(|db| db.update_document(collection, id, &partial))?;
        debug!(collection, id, "document updated");
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        if self.with_db(|db| db.delete_document(collection, id))? {
            debug!(collection, id, "document deleted");
            self.notify(collection);
        }
        Ok(())
    }

    async fn list(&self, query: &Query) -> Result<Vec<Document>> {
        self.with_db(|db| db.query_documents(query))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.with_db(|db| db.apply_batch(&batch))?;
        debug!(ops = batch.len(), "batch committed");
        for collection in batch.collections() {
            self.notify(&collection);
        }
        Ok(())
    }

    fn subscribe(&self, query: Query) -> Result<Subscription> {
        // Listen before the first read so no change can slip in between.
        let mut changes = self.changes.subscribe();
        let initial = self.with_db(|db| db.query_documents(&query))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Ok(initial));

        let db = Arc::clone(&self.db);
        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(collection) if collection != query.collection => continue,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, collection = %query.collection, "subscription lagged, re-reading");
                    }
                    Err(RecvError::Closed) => break,
                }

                let snapshot = with_db(&db, |db| db.query_documents(&query));
                let failed = snapshot.is_err();
                if tx.send(snapshot).is_err() || failed {
                    break;
                }
            }
            debug!(collection = %query.collection, "subscription task finished");
        });

        Ok(Subscription::new(rx, task))
    }
}

impl AuthProvider for LocalBackend {
    async fn sign_up(&self, email: &str, password: &str) -> std::result::Result<AccountId, AuthError> {
        validate_email(email).map_err(|_| AuthError::InvalidEmail)?;
        check_password_strength(password)?;

        let account = Account::create(email, password);
        let inserted = self.with_db(|db| {
            if db.find_account_by_email(&account.email)?.is_some() {
                return Ok(false);
            }
            db.insert_account(&account)?;
            Ok(true)
        })?;

        if !inserted {
            return Err(AuthError::EmailInUse);
        }

        info!(account = %account.id.short(), "Account created");
        self.auth_state.send_replace(Some(account.id.clone()));
        Ok(account.id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<AccountId, AuthError> {
        let account = self
            .with_db(|db| db.find_account_by_email(email))?
            .filter(|account| account.verify(password))
            .ok_or(AuthError::InvalidCredentials)?;

        info!(account = %account.id.short(), "Signed in");
        self.auth_state.send_replace(Some(account.id.clone()));
        Ok(account.id)
    }

    async fn sign_out(&self) {
        if let Some(previous) = self.auth_state.send_replace(None) {
            info!(account = %previous.short(), "Signed out");
        }
    }

    async fn update_password(&self, new_password: &str) -> std::result::Result<(), AuthError> {
        let id = self.require_account()?;
        check_password_strength(new_password)?;

        self.with_db(|db| {
            let mut account = db.get_account(&id)?.ok_or_else(|| StoreError::NotFound {
                collection: "accounts".to_string(),
                id: id.to_string(),
            })?;
            account.set_password(new_password);
            db.update_account_password(&account)
        })?;

        info!(account = %id.short(), "Password updated");
        Ok(())
    }

    async fn delete_account(&self) -> std::result::Result<(), AuthError> {
        let id = self.require_account()?;
        self.with_db(|db| db.delete_account(&id))?;
        self.auth_state.send_replace(None);
        info!(account = %id.short(), "Account deleted");
        Ok(())
    }

    fn current_account_id(&self) -> Option<AccountId> {
        self.auth_state.borrow().clone()
    }

    fn on_auth_state_change(&self) -> watch::Receiver<Option<AccountId>> {
        self.auth_state.subscribe()
    }
}
