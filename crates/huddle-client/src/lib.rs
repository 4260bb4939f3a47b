//! # huddle-client
//!
//! Client core of the Huddle group-activity app.
//!
//! - [`gateway`] is the typed access layer over the document store.
//! - [`reconcile`] keeps a group's stored participants equal to an edited
//!   selection.
//! - [`live`] holds views that mirror store subscriptions.
//! - [`workflow`] drives the group edit screen.
//! - [`commands`] are the operations a UI shell invokes: auth, groups,
//!   participants, chat and profile.
//!
//! Everything hangs off an [`AppContext`], which the shell creates at startup
//! and passes to each command.

pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod live;
pub mod reconcile;
pub mod session;
pub mod state;
pub mod workflow;

#[cfg(test)]
mod testing;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use error::{ClientError, Notice, Result, Severity};
pub use events::{ClientEvent, EventBus};
pub use gateway::Gateway;
pub use live::{GroupDetailView, LiveView, ViewState};
pub use reconcile::{ParticipantReconciler, ReconcilePlan, ReconcileReport, ReconcileStrategy};
pub use session::Session;
pub use state::AppContext;
pub use workflow::{EditDraft, EditState, GroupEditWorkflow};

/// Install the global `tracing` subscriber.
///
/// Honours `RUST_LOG`; otherwise logs this crate at debug and the store at
/// info.  Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("huddle_client=debug,huddle_store=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
