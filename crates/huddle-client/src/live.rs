//! Live, read-only projections of store state.
//!
//! A [`LiveView`] owns at most one subscription.  Every snapshot pushed by
//! the store replaces the view state wholesale; there is no merging and no
//! re-sorting.  Mounting, switching keys and unmounting are synchronous:
//! once `unmount` or `switch_to` returns, the cancelled subscription can no
//! longer touch the state.

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use huddle_shared::{render_participants, Group, GroupId, Message, Participant};
use huddle_store::{Document, DocumentStore, Query, Subscription};

use crate::error::{ClientError, Result};
use crate::gateway::{decode, decode_all, group_query, messages_query, participants_query};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    NotFound,
    Failed(ClientError),
}

impl<T> ViewState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}

/// How one kind of view reads the store.
pub trait Projection: Send + Sync + 'static {
    type Key: Clone + PartialEq + fmt::Display + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    fn query(key: &Self::Key) -> Query;

    fn project(docs: Vec<Document>) -> ViewState<Self::Output>;
}

/// The group document itself.
pub struct GroupDoc;

impl Projection for GroupDoc {
    type Key = GroupId;
    type Output = Group;

    fn query(key: &GroupId) -> Query {
        group_query(key)
    }

    fn project(docs: Vec<Document>) -> ViewState<Group> {
        match docs.first() {
            Some(doc) => into_state(decode(doc)),
            None => ViewState::NotFound,
        }
    }
}

/// The group's members.
pub struct ParticipantList;

impl Projection for ParticipantList {
    type Key = GroupId;
    type Output = Vec<Participant>;

    fn query(key: &GroupId) -> Query {
        participants_query(key)
    }

    fn project(docs: Vec<Document>) -> ViewState<Vec<Participant>> {
        into_state(decode_all(&docs))
    }
}

/// The group's chat, oldest first as delivered by the store.
pub struct MessageFeed;

impl Projection for MessageFeed {
    type Key = GroupId;
    type Output = Vec<Message>;

    fn query(key: &GroupId) -> Query {
        messages_query(key)
    }

    fn project(docs: Vec<Document>) -> ViewState<Vec<Message>> {
        into_state(decode_all(&docs))
    }
}

fn into_state<T>(result: Result<T>) -> ViewState<T> {
    match result {
        Ok(value) => ViewState::Ready(value),
        Err(e) => ViewState::Failed(e),
    }
}

struct Mount<K> {
    key: K,
    active: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

pub struct LiveView<S, P: Projection> {
    store: S,
    state: Arc<watch::Sender<ViewState<P::Output>>>,
    mounted: Option<Mount<P::Key>>,
}

impl<S: DocumentStore, P: Projection> LiveView<S, P> {
    pub fn new(store: S) -> Self {
        let (state, _) = watch::channel(ViewState::Loading);
        Self {
            store,
            state: Arc::new(state),
            mounted: None,
        }
    }

    pub fn key(&self) -> Option<&P::Key> {
        self.mounted.as_ref().map(|m| &m.key)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Observe state changes.
    pub fn watch(&self) -> watch::Receiver<ViewState<P::Output>> {
        self.state.subscribe()
    }

    pub fn current(&self) -> ViewState<P::Output> {
        self.state.borrow().clone()
    }

    /// Start the subscription for `key`.  Same as [`LiveView::switch_to`]
    /// when already mounted.
    pub fn mount(&mut self, key: P::Key) -> Result<()> {
        self.switch_to(key)
    }

    /// Cancel the current subscription, then subscribe for `key`.  No-op
    /// when `key` is already mounted and its feed is still healthy; a feed
    /// that ended or failed is replaced.
    pub fn switch_to(&mut self, key: P::Key) -> Result<()> {
        if self.key() == Some(&key) && self.is_live() {
            return Ok(());
        }
        self.unmount();
        self.start(key)
    }

    fn is_live(&self) -> bool {
        let Some(mount) = &self.mounted else {
            return false;
        };
        !mount.task.is_finished() && !matches!(*self.state.borrow(), ViewState::Failed(_))
    }

    /// Cancel the subscription.  The last state is kept but never updated
    /// again.
    pub fn unmount(&mut self) {
        if let Some(mount) = self.mounted.take() {
            if let Ok(mut active) = mount.active.lock() {
                *active = false;
            }
            mount.task.abort();
            debug!(key = %mount.key, "live view unmounted");
        }
    }

    fn start(&mut self, key: P::Key) -> Result<()> {
        self.state.send_replace(ViewState::Loading);

        let subscription = match self.store.subscribe(P::query(&key)) {
            Ok(sub) => sub,
            Err(e) => {
                let error = ClientError::read(e);
                self.state.send_replace(ViewState::Failed(error.clone()));
                return Err(error);
            }
        };

        let active = Arc::new(Mutex::new(true));
        let task = tokio::spawn(feed::<P>(
            subscription,
            Arc::clone(&active),
            Arc::clone(&self.state),
        ));

        debug!(key = %key, "live view mounted");
        self.mounted = Some(Mount { key, active, task });
        Ok(())
    }
}

impl<S, P: Projection> Drop for LiveView<S, P> {
    fn drop(&mut self) {
        if let Some(mount) = self.mounted.take() {
            if let Ok(mut active) = mount.active.lock() {
                *active = false;
            }
            mount.task.abort();
        }
    }
}

async fn feed<P: Projection>(
    mut subscription: Subscription,
    active: Arc<Mutex<bool>>,
    state: Arc<watch::Sender<ViewState<P::Output>>>,
) {
    while let Some(snapshot) = subscription.next().await {
        let next = match snapshot {
            Ok(docs) => P::project(docs),
            Err(e) => ViewState::Failed(ClientError::read(e)),
        };
        if !publish(&active, &state, next) {
            break;
        }
    }
}

/// Replace the state unless the mount was cancelled.  The flag stays locked
/// while publishing so `unmount` cannot return in between.
fn publish<T>(active: &Mutex<bool>, state: &watch::Sender<ViewState<T>>, next: ViewState<T>) -> bool {
    let Ok(guard) = active.lock() else {
        return false;
    };
    if !*guard {
        return false;
    }
    state.send_replace(next);
    true
}

/// The live data behind a group's detail screen.
pub struct GroupDetailView<S: DocumentStore> {
    pub group: LiveView<S, GroupDoc>,
    pub participants: LiveView<S, ParticipantList>,
    pub messages: LiveView<S, MessageFeed>,
}

impl<S: DocumentStore> GroupDetailView<S> {
    pub fn new(store: S) -> Self {
        Self {
            group: LiveView::new(store.clone()),
            participants: LiveView::new(store.clone()),
            messages: LiveView::new(store),
        }
    }

    pub fn mount(&mut self, group_id: GroupId) -> Result<()> {
        self.switch_to(group_id)
    }

    pub fn switch_to(&mut self, group_id: GroupId) -> Result<()> {
        let result = self
            .group
            .switch_to(group_id.clone())
            .and_then(|_| self.participants.switch_to(group_id.clone()))
            .and_then(|_| self.messages.switch_to(group_id));
        if result.is_err() {
            self.unmount();
        }
        result
    }

    pub fn unmount(&mut self) {
        self.group.unmount();
        self.participants.unmount();
        self.messages.unmount();
    }

    /// The membership list as display lines, once loaded.
    pub fn participant_lines(&self) -> Option<Vec<String>> {
        self.participants
            .current()
            .ready()
            .map(|participants| render_participants(participants))
    }
}
