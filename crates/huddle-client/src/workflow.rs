//! The group edit screen as a state machine.
//!
//! ```text
//! Idle ─open─▶ Loading ─▶ Editing ─submit─▶ Submitting ─▶ Success
//!                 │          ▲                   │
//!                 ▼          └───── write failed ┘
//!               Failed ─open─▶ Loading
//! ```
//!
//! A validation failure keeps the workflow in `Editing` without touching the
//! store.  A failed save also returns to `Editing`, with the draft intact and
//! the error attached, so the user can retry.

use tracing::{info, warn};

use huddle_shared::validation::{validate_group_fields, validate_participants};
use huddle_shared::{AccountId, Group, GroupFields, GroupId, User};
use huddle_store::DocumentStore;

use crate::error::{ClientError, Result};
use crate::events::{ClientEvent, EventBus};
use crate::gateway::Gateway;
use crate::reconcile::{ParticipantReconciler, ReconcileReport};

/// The user's pending edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub fields: GroupFields,
    pub selection: Vec<User>,
    base: Group,
}

impl EditDraft {
    fn seeded(group: Group, selection: Vec<User>) -> Self {
        Self {
            fields: group.fields(),
            selection,
            base: group,
        }
    }

    /// The group as it was when the editor opened.
    pub fn original(&self) -> &Group {
        &self.base
    }

    pub fn is_selected(&self, id: &AccountId) -> bool {
        self.selection.iter().any(|u| &u.id == id)
    }

    /// Add `user` to the selection.  Returns false if already selected.
    pub fn select(&mut self, user: User) -> bool {
        if self.is_selected(&user.id) {
            return false;
        }
        self.selection.push(user);
        true
    }

    /// Remove a user from the selection.  Returns false if not selected.
    pub fn deselect(&mut self, id: &AccountId) -> bool {
        let before = self.selection.len();
        self.selection.retain(|u| &u.id != id);
        self.selection.len() != before
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    Idle,
    Loading,
    Editing {
        draft: EditDraft,
        /// The last validation or save error, shown inline.
        error: Option<ClientError>,
    },
    Submitting {
        draft: EditDraft,
    },
    Success {
        group: Group,
        report: ReconcileReport,
    },
    Failed {
        error: ClientError,
    },
}

pub struct GroupEditWorkflow<S> {
    gateway: Gateway<S>,
    reconciler: ParticipantReconciler<S>,
    events: EventBus,
    group_id: GroupId,
    state: EditState,
    candidates: Vec<User>,
}

impl<S: DocumentStore> GroupEditWorkflow<S> {
    pub fn new(
        gateway: Gateway<S>,
        reconciler: ParticipantReconciler<S>,
        events: EventBus,
        group_id: GroupId,
    ) -> Self {
        Self {
            gateway,
            reconciler,
            events,
            group_id,
            state: EditState::Idle,
            candidates: Vec::new(),
        }
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// Load the group, its participants and the users that can be picked.
    /// Does nothing while already editing.
    pub async fn open(&mut self) -> Result<()> {
        if matches!(self.state, EditState::Editing { .. }) {
            return Ok(());
        }
        self.state = EditState::Loading;

        let loaded = tokio::try_join!(
            self.gateway.get_group(&self.group_id),
            self.gateway.list_participants(&self.group_id),
            self.gateway.list_users(),
        );

        match loaded {
            Ok((group, participants, users)) => {
                let selection = participants.iter().map(User::from).collect();
                self.candidates = users;
                self.state = EditState::Editing {
                    draft: EditDraft::seeded(group, selection),
                    error: None,
                };
                Ok(())
            }
            Err(e) => {
                warn!(group_id = %self.group_id, error = %e, "Failed to open group editor");
                self.state = EditState::Failed { error: e.clone() };
                Err(e)
            }
        }
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        match &self.state {
            EditState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn draft_mut(&mut self) -> Result<&mut EditDraft> {
        match &mut self.state {
            EditState::Editing { draft, .. } => Ok(draft),
            _ => Err(ClientError::NotEditing),
        }
    }

    /// Candidates that are not in the selection yet.
    pub fn available_users(&self) -> Vec<&User> {
        let Some(draft) = self.draft() else {
            return Vec::new();
        };
        self.candidates
            .iter()
            .filter(|u| !draft.is_selected(&u.id))
            .collect()
    }

    /// Validate and save the draft.
    pub async fn submit(&mut self) -> Result<ReconcileReport> {
        let draft = match std::mem::replace(&mut self.state, EditState::Loading) {
            EditState::Editing { draft, .. } => draft,
            other => {
                self.state = other;
                return Err(ClientError::NotEditing);
            }
        };

        let checked = validate_group_fields(&draft.fields)
            .and_then(|_| validate_participants(&draft.selection));
        if let Err(e) = checked {
            let error = ClientError::from(e);
            self.state = EditState::Editing {
                draft,
                error: Some(error.clone()),
            };
            return Err(error);
        }

        self.state = EditState::Submitting {
            draft: draft.clone(),
        };

        match self
            .reconciler
            .reconcile(&self.group_id, &draft.selection, Some(&draft.fields))
            .await
        {
            Ok(report) => {
                let group = draft.base.with_fields(draft.fields);
                info!(group_id = %self.group_id, members = draft.selection.len(), "Group updated");
                self.events.emit(ClientEvent::GroupUpdated {
                    group_id: self.group_id.clone(),
                });
                self.state = EditState::Success { group, report };
                Ok(report)
            }
            Err(e) => {
                warn!(group_id = %self.group_id, error = %e, "Failed to save group");
                self.state = EditState::Editing {
                    draft,
                    error: Some(e.clone()),
                };
                Err(e)
            }
        }
    }

    /// Discard the editor.
    pub fn close(&mut self) {
        self.state = EditState::Idle;
        self.candidates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::ReconcileStrategy;
    use crate::testing::FaultyStore;

    fn user(id: &str, name: &str) -> User {
        User {
            id: AccountId::from(id),
            name: name.into(),
            surname: "Tester".into(),
            email: format!("{id}@x.com"),
        }
    }

    fn run_club() -> GroupFields {
        GroupFields {
            title: "Run Club".into(),
            description: "5k".into(),
            location: "Park".into(),
            time: "2024-01-01T10:00".into(),
        }
    }

    struct Fixture {
        store: FaultyStore,
        events: EventBus,
        group_id: GroupId,
    }

    impl Fixture {
        async fn new(members: &[User]) -> Self {
            let store = FaultyStore::new();
            let gw = Gateway::new(store.clone());
            for u in [user("u1", "Ada"), user("u2", "Grace"), user("u3", "Alan")] {
                gw.put_user(&u).await.unwrap();
            }
            let group = gw.create_group(&run_club(), members).await.unwrap();
            Self {
                store,
                events: EventBus::new(8),
                group_id: group.id,
            }
        }

        fn workflow(&self, strategy: ReconcileStrategy) -> GroupEditWorkflow<FaultyStore> {
            let gw = Gateway::new(self.store.clone());
            GroupEditWorkflow::new(
                gw.clone(),
                ParticipantReconciler::new(gw, strategy),
                self.events.clone(),
                self.group_id.clone(),
            )
        }

        async fn member_ids(&self) -> Vec<String> {
            let gw = Gateway::new(self.store.clone());
            let mut ids: Vec<String> = gw
                .list_participants(&self.group_id)
                .await
                .unwrap()
                .into_iter()
                .map(|p| p.id.to_string())
                .collect();
            ids.sort();
            ids
        }
    }

    #[tokio::test]
    async fn open_seeds_the_draft() {
        let fx = Fixture::new(&[user("u1", "Ada")]).await;
        let mut wf = fx.workflow(ReconcileStrategy::Diff);
        wf.open().await.unwrap();

        let draft = wf.draft().unwrap();
        assert_eq!(draft.fields, run_club());
        assert_eq!(draft.selection, vec![user("u1", "Ada")]);

        let available = wf.available_users();
        let available: Vec<&str> = available.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(available.len(), 2);
        assert!(!available.contains(&"u1"));
    }

    #[tokio::test]
    async fn missing_group_fails_with_not_found() {
        let fx = Fixture::new(&[]).await;
        let mut wf = GroupEditWorkflow::new(
            Gateway::new(fx.store.clone()),
            ParticipantReconciler::new(Gateway::new(fx.store.clone()), ReconcileStrategy::Diff),
            fx.events.clone(),
            GroupId::from("ghost"),
        );
        let err = wf.open().await.unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(wf.state(), EditState::Failed { .. }));
        assert_eq!(wf.draft_mut().unwrap_err(), ClientError::NotEditing);
    }

    #[tokio::test]
    async fn submit_saves_fields_and_selection() {
        for strategy in [ReconcileStrategy::Diff, ReconcileStrategy::FullReplace] {
            let fx = Fixture::new(&[user("u1", "Ada"), user("u2", "Grace")]).await;
            let mut events = fx.events.subscribe();
            let mut wf = fx.workflow(strategy);
            wf.open().await.unwrap();

            let draft = wf.draft_mut().unwrap();
            draft.fields.title = "Trail Club".into();
            assert!(draft.deselect(&AccountId::from("u1")));
            assert!(draft.select(user("u3", "Alan")));
            assert!(!draft.select(user("u3", "Alan")));

            wf.submit().await.unwrap();

            match wf.state() {
                EditState::Success { group, .. } => assert_eq!(group.title, "Trail Club"),
                other => panic!("unexpected state {other:?}"),
            }
            assert_eq!(fx.member_ids().await, vec!["u2", "u3"]);
            let gw = Gateway::new(fx.store.clone());
            assert_eq!(gw.get_group(&fx.group_id).await.unwrap().title, "Trail Club");
            assert_eq!(
                events.recv().await.unwrap(),
                ClientEvent::GroupUpdated {
                    group_id: fx.group_id.clone()
                }
            );
        }
    }

    #[tokio::test]
    async fn resubmitting_the_same_selection_writes_no_participants() {
        let fx = Fixture::new(&[user("u1", "Ada")]).await;
        let mut wf = fx.workflow(ReconcileStrategy::Diff);
        wf.open().await.unwrap();
        let report = wf.submit().await.unwrap();
        assert_eq!(report, ReconcileReport::default());
        assert_eq!(fx.member_ids().await, vec!["u1"]);
    }

    #[tokio::test]
    async fn validation_error_stays_in_editing() {
        let fx = Fixture::new(&[]).await;
        let mut wf = fx.workflow(ReconcileStrategy::Diff);
        wf.open().await.unwrap();
        wf.draft_mut().unwrap().fields.location.clear();

        let err = wf.submit().await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        match wf.state() {
            EditState::Editing { draft, error } => {
                assert!(draft.fields.location.is_empty());
                assert_eq!(error.as_ref(), Some(&err));
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_save_keeps_the_draft_for_retry() {
        let fx = Fixture::new(&[]).await;
        let mut wf = fx.workflow(ReconcileStrategy::Diff);
        wf.open().await.unwrap();
        wf.draft_mut().unwrap().select(user("u1", "Ada"));

        fx.store.fail_writes(true);
        let err = wf.submit().await.unwrap_err();
        assert!(matches!(err, ClientError::RemoteWrite(_)));
        assert_eq!(err.notice().text, "Error saving changes. Please try again.");
        assert!(fx.member_ids().await.is_empty());
        assert_eq!(wf.draft().unwrap().selection.len(), 1);

        fx.store.fail_writes(false);
        wf.submit().await.unwrap();
        assert_eq!(fx.member_ids().await, vec!["u1"]);
    }

    #[tokio::test]
    async fn submit_outside_editing_is_rejected() {
        let fx = Fixture::new(&[]).await;
        let mut wf = fx.workflow(ReconcileStrategy::Diff);
        assert_eq!(wf.submit().await.unwrap_err(), ClientError::NotEditing);
        assert_eq!(wf.state(), &EditState::Idle);

        wf.open().await.unwrap();
        wf.close();
        assert_eq!(wf.state(), &EditState::Idle);
        assert!(wf.available_users().is_empty());
    }
}
