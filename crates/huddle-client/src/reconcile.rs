//! Participant reconciliation.
//!
//! Makes a group's persisted participant set equal an edited selection.
//! Two write strategies exist:
//!
//! - [`ReconcileStrategy::Diff`] removes `current - desired`, inserts
//!   `desired - current`, and commits both (plus an optional group field
//!   update) as one atomic batch.  Members kept across the edit retain the
//!   snapshot taken when they joined.
//! - [`ReconcileStrategy::FullReplace`] deletes every stored participant and
//!   then inserts a fresh snapshot for every selected user.  The phases are
//!   independent writes awaited together; a failure between them leaves the
//!   group short of members and is not rolled back.

use std::fmt;
use std::str::FromStr;

use futures::future::join_all;
use tracing::{info, warn};

use huddle_shared::constants::GROUPS_COLLECTION;
use huddle_shared::validation::{validate_group_fields, validate_participants};
use huddle_shared::{AccountId, GroupFields, GroupId, Participant, User};
use huddle_store::{DocumentStore, StoreError, WriteBatch};

use crate::error::{ClientError, Result};
use crate::gateway::{dedup_members, encode, Gateway};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcileStrategy {
    #[default]
    Diff,
    FullReplace,
}

impl FromStr for ReconcileStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diff" => Ok(Self::Diff),
            "replace" | "full-replace" => Ok(Self::FullReplace),
            other => Err(format!("unknown reconcile strategy: {other}")),
        }
    }
}

impl fmt::Display for ReconcileStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diff => f.write_str("diff"),
            Self::FullReplace => f.write_str("replace"),
        }
    }
}

/// The participant writes needed for one edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub removals: Vec<AccountId>,
    pub inserts: Vec<Participant>,
}

impl ReconcilePlan {
    /// Delete everything stored, insert everything desired.
    pub fn full_replace(current: &[Participant], desired: &[User]) -> Result<Self> {
        validate_participants(desired)?;
        Ok(Self {
            removals: current.iter().map(|p| p.id.clone()).collect(),
            inserts: dedup_members(desired),
        })
    }

    /// Only the members that changed.
    pub fn diff(current: &[Participant], desired: &[User]) -> Result<Self> {
        validate_participants(desired)?;
        let desired = dedup_members(desired);

        let removals = current
            .iter()
            .filter(|p| !desired.iter().any(|d| d.id == p.id))
            .map(|p| p.id.clone())
            .collect();
        let inserts = desired
            .into_iter()
            .filter(|d| !current.iter().any(|p| p.id == d.id))
            .collect();

        Ok(Self { removals, inserts })
    }

    pub fn for_strategy(
        strategy: ReconcileStrategy,
        current: &[Participant],
        desired: &[User],
    ) -> Result<Self> {
        match strategy {
            ReconcileStrategy::Diff => Self::diff(current, desired),
            ReconcileStrategy::FullReplace => Self::full_replace(current, desired),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.inserts.is_empty()
    }

    /// Append this plan's writes to `batch`.  Removals come first so a
    /// re-inserted member ends up present.
    pub fn append_to(&self, group_id: &GroupId, batch: &mut WriteBatch) -> Result<()> {
        let path = group_id.participants_path();
        for id in &self.removals {
            batch.delete(path.as_str(), id.as_str());
        }
        for participant in &self.inserts {
            batch.set(path.as_str(), participant.id.as_str(), encode(participant)?);
        }
        Ok(())
    }
}

/// What a reconciliation wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub removed: usize,
    pub inserted: usize,
}

#[derive(Clone)]
pub struct ParticipantReconciler<S> {
    gateway: Gateway<S>,
    strategy: ReconcileStrategy,
}

impl<S: DocumentStore> ParticipantReconciler<S> {
    pub fn new(gateway: Gateway<S>, strategy: ReconcileStrategy) -> Self {
        Self { gateway, strategy }
    }

    pub fn strategy(&self) -> ReconcileStrategy {
        self.strategy
    }

    /// Make the participants of `group_id` equal `desired`, optionally
    /// updating the group's fields in the same operation.
    pub async fn reconcile(
        &self,
        group_id: &GroupId,
        desired: &[User],
        group_update: Option<&GroupFields>,
    ) -> Result<ReconcileReport> {
        validate_participants(desired)?;
        let current = self.gateway.list_participants(group_id).await?;
        let plan = ReconcilePlan::for_strategy(self.strategy, &current, desired)?;

        let report = match self.strategy {
            ReconcileStrategy::Diff => self.commit_atomic(group_id, &plan, group_update).await?,
            ReconcileStrategy::FullReplace => {
                if let Some(fields) = group_update {
                    self.gateway.update_group_fields(group_id, fields).await?;
                }
                self.replace_in_phases(group_id, &plan).await?
            }
        };

        info!(
            group_id = %group_id,
            strategy = %self.strategy,
            removed = report.removed,
            inserted = report.inserted,
            "Participants reconciled"
        );
        Ok(report)
    }

    async fn commit_atomic(
        &self,
        group_id: &GroupId,
        plan: &ReconcilePlan,
        group_update: Option<&GroupFields>,
    ) -> Result<ReconcileReport> {
        let mut batch = WriteBatch::new();
        if let Some(fields) = group_update {
            validate_group_fields(fields)?;
            batch.update(GROUPS_COLLECTION, group_id.as_str(), encode(fields)?);
        }
        plan.append_to(group_id, &mut batch)?;

        self.gateway
            .store()
            .commit(batch)
            .await
            .map_err(ClientError::write)?;

        Ok(ReconcileReport {
            removed: plan.removals.len(),
            inserted: plan.inserts.len(),
        })
    }

    async fn replace_in_phases(
        &self,
        group_id: &GroupId,
        plan: &ReconcilePlan,
    ) -> Result<ReconcileReport> {
        let store = self.gateway.store();
        let path = group_id.participants_path();

        let deletes = join_all(plan.removals.iter().map(|id| store.delete(&path, id.as_str()))).await;
        aggregate("delete", group_id, deletes)?;

        let mut encoded = Vec::with_capacity(plan.inserts.len());
        for participant in &plan.inserts {
            encoded.push((participant.id.as_str(), encode(participant)?));
        }
        let inserts = join_all(
            encoded
                .into_iter()
                .map(|(id, fields)| store.set(&path, id, fields)),
        )
        .await;
        aggregate("insert", group_id, inserts)?;

        Ok(ReconcileReport {
            removed: plan.removals.len(),
            inserted: plan.inserts.len(),
        })
    }
}

/// Fold independent write results into one error.
fn aggregate(
    phase: &str,
    group_id: &GroupId,
    results: Vec<std::result::Result<(), StoreError>>,
) -> Result<()> {
    let total = results.len();
    let mut failures = results.into_iter().filter_map(|r| r.err());
    let Some(first) = failures.next() else {
        return Ok(());
    };
    let failed = 1 + failures.count();

    warn!(group_id = %group_id, phase, failed, total, error = %first, "participant writes failed");
    Err(ClientError::RemoteWrite(format!(
        "{failed} of {total} participant {phase}s failed: {first}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FaultyStore;

    fn user(id: &str) -> User {
        User {
            id: AccountId::from(id),
            name: format!("Name{id}"),
            surname: "Tester".into(),
            email: format!("{id}@x.com"),
        }
    }

    fn member(id: &str) -> Participant {
        Participant::from(&user(id))
    }

    fn ids(plan: &ReconcilePlan) -> (Vec<&str>, Vec<&str>) {
        (
            plan.removals.iter().map(|id| id.as_str()).collect(),
            plan.inserts.iter().map(|p| p.id.as_str()).collect(),
        )
    }

    #[test]
    fn diff_touches_only_changes() {
        let plan =
            ReconcilePlan::diff(&[member("a"), member("b")], &[user("b"), user("c")]).unwrap();
        assert_eq!(ids(&plan), (vec!["a"], vec!["c"]));
    }

    #[test]
    fn diff_of_identical_selection_is_empty() {
        let plan = ReconcilePlan::diff(&[member("a")], &[user("a")]).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn full_replace_rewrites_everything() {
        let plan =
            ReconcilePlan::full_replace(&[member("a"), member("b")], &[user("b"), user("b")])
                .unwrap();
        assert_eq!(ids(&plan), (vec!["a", "b"], vec!["b"]));
    }

    #[test]
    fn partial_user_is_rejected_before_planning() {
        let mut partial = user("a");
        partial.email.clear();
        let err = ReconcilePlan::diff(&[], &[partial]).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!("diff".parse(), Ok(ReconcileStrategy::Diff));
        assert_eq!(" Replace ".parse(), Ok(ReconcileStrategy::FullReplace));
        assert!("merge".parse::<ReconcileStrategy>().is_err());
        assert_eq!(ReconcileStrategy::FullReplace.to_string(), "replace");
    }

    #[test]
    fn removals_precede_inserts_in_batch() {
        let plan = ReconcilePlan {
            removals: vec![AccountId::from("a")],
            inserts: vec![member("a")],
        };
        let mut batch = WriteBatch::new();
        plan.append_to(&GroupId::from("g1"), &mut batch).unwrap();
        assert!(matches!(batch.ops()[0], huddle_store::WriteOp::Delete { .. }));
        assert!(matches!(batch.ops()[1], huddle_store::WriteOp::Set { .. }));
    }

    fn run_club() -> GroupFields {
        GroupFields {
            title: "Run Club".into(),
            description: "5k".into(),
            location: "Park".into(),
            time: "2024-01-01T10:00".into(),
        }
    }

    #[tokio::test]
    async fn failed_insert_phase_is_reported_once_and_not_rolled_back() {
        let store = FaultyStore::new();
        let gateway = Gateway::new(store.clone());
        let group = gateway
            .create_group(&run_club(), &[user("a"), user("b")])
            .await
            .unwrap();

        store.fail_sets(true);
        let reconciler = ParticipantReconciler::new(gateway.clone(), ReconcileStrategy::FullReplace);
        let err = reconciler
            .reconcile(&group.id, &[user("a"), user("c")], None)
            .await
            .unwrap_err();

        match err {
            ClientError::RemoteWrite(msg) => {
                assert!(msg.starts_with("2 of 2 participant inserts failed"), "{msg}")
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(gateway.list_participants(&group.id).await.unwrap().is_empty());

        store.fail_sets(false);
        let report = reconciler
            .reconcile(&group.id, &[user("a"), user("c")], None)
            .await
            .unwrap();
        assert_eq!(report, ReconcileReport { removed: 0, inserted: 2 });
        assert_eq!(gateway.list_participants(&group.id).await.unwrap().len(), 2);
    }
}
