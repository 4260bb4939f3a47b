//! Application context shared by every command.
//!
//! [`AppContext`] bundles the configuration, the store gateway, the auth
//! provider and the session.  It is created once at startup and passed
//! explicitly to each command; there is no global state.

use huddle_shared::GroupId;
use huddle_store::{AuthProvider, DocumentStore, LocalBackend};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::EventBus;
use crate::gateway::Gateway;
use crate::live::GroupDetailView;
use crate::reconcile::ParticipantReconciler;
use crate::session::Session;
use crate::workflow::GroupEditWorkflow;

pub struct AppContext<S, A> {
    pub config: ClientConfig,
    pub gateway: Gateway<S>,
    pub auth: A,
    pub session: Session<A>,
    pub events: EventBus,
}

impl<S: DocumentStore, A: AuthProvider> AppContext<S, A> {
    /// Must be called inside a tokio runtime.
    pub fn new(config: ClientConfig, store: S, auth: A) -> Self {
        let events = EventBus::new(config.event_capacity);
        let session = Session::start(auth.clone(), events.clone());
        Self {
            config,
            gateway: Gateway::new(store),
            auth,
            session,
            events,
        }
    }

    pub fn reconciler(&self) -> ParticipantReconciler<S> {
        ParticipantReconciler::new(self.gateway.clone(), self.config.reconcile_strategy)
    }

    /// A fresh editor for one group.  Call `open()` on it to load.
    pub fn edit_group(&self, group_id: GroupId) -> GroupEditWorkflow<S> {
        GroupEditWorkflow::new(
            self.gateway.clone(),
            self.reconciler(),
            self.events.clone(),
            group_id,
        )
    }

    /// Unmounted live views for a group detail screen.
    pub fn group_detail_view(&self) -> GroupDetailView<S> {
        GroupDetailView::new(self.gateway.store().clone())
    }

    pub fn shutdown(&mut self) {
        self.session.shutdown();
        info!("Client stopped");
    }
}

impl AppContext<LocalBackend, LocalBackend> {
    /// Open the SQLite backend at the configured path.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let backend = LocalBackend::open_at(&config.database_path).map_err(ClientError::read)?;
        info!(path = %config.database_path.display(), "Client started");
        Ok(Self::new(config, backend.clone(), backend))
    }

    /// An in-memory backend, for tests and demos.
    pub fn in_memory(config: ClientConfig) -> Result<Self> {
        let backend = LocalBackend::open_in_memory().map_err(ClientError::read)?;
        Ok(Self::new(config, backend.clone(), backend))
    }
}
