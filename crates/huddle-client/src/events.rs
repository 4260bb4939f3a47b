use serde::Serialize;
use tokio::sync::broadcast;

use huddle_shared::{AccountId, GroupId, MessageId};

/// Something open views may want to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    GroupCreated { group_id: GroupId },
    GroupUpdated { group_id: GroupId },
    GroupDeleted { group_id: GroupId },
    MessageSent { group_id: GroupId, message_id: MessageId },
    AuthChanged { account: Option<AccountId> },
}

/// In-process fan-out of [`ClientEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: ClientEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("no event listeners");
        }
    }
}
