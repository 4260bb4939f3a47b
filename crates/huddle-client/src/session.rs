//! Process-wide sign-in state.
//!
//! A [`Session`] is created once when the client starts and shut down when it
//! stops.  It mirrors the auth provider's state channel and republishes every
//! transition on the event bus.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use huddle_shared::AccountId;
use huddle_store::AuthProvider;

use crate::error::{ClientError, Result};
use crate::events::{ClientEvent, EventBus};

pub struct Session<A> {
    auth: A,
    state: watch::Receiver<Option<AccountId>>,
    watcher: Option<JoinHandle<()>>,
}

impl<A: AuthProvider> Session<A> {
    /// Start observing `auth`.  Must be called inside a tokio runtime.
    pub fn start(auth: A, events: EventBus) -> Self {
        let state = auth.on_auth_state_change();
        let mut changes = auth.on_auth_state_change();

        let watcher = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let account = changes.borrow_and_update().clone();
                debug!(signed_in = account.is_some(), "auth state changed");
                events.emit(ClientEvent::AuthChanged { account });
            }
        });

        info!("Session started");
        Self {
            auth,
            state,
            watcher: Some(watcher),
        }
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn current(&self) -> Option<AccountId> {
        self.state.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// The signed-in account, or [`ClientError::NotSignedIn`].
    pub fn require(&self) -> Result<AccountId> {
        self.current().ok_or(ClientError::NotSignedIn)
    }

    /// A fresh receiver of sign-in transitions.
    pub fn changes(&self) -> watch::Receiver<Option<AccountId>> {
        self.state.clone()
    }

    /// Stop republishing auth transitions.
    pub fn shutdown(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
            info!("Session stopped");
        }
    }
}

impl<A> Drop for Session<A> {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}
