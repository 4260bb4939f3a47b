use tracing::info;

use huddle_shared::{Group, GroupFields, GroupId, User};
use huddle_store::{AuthProvider, DocumentStore};

use crate::error::Result;
use crate::events::ClientEvent;
use crate::state::AppContext;

/// Create a group with its initial members.
pub async fn create_group<S: DocumentStore, A: AuthProvider>(
    ctx: &AppContext<S, A>,
    fields: &GroupFields,
    members: &[User],
) -> Result<Group> {
    ctx.session.require()?;
    let group = ctx.gateway.create_group(fields, members).await?;
    ctx.events.emit(ClientEvent::GroupCreated {
        group_id: group.id.clone(),
    });
    Ok(group)
}

/// Every group, newest first.
pub async fn list_groups<S: DocumentStore, A: AuthProvider>(
    ctx: &AppContext<S, A>,
) -> Result<Vec<Group>> {
    ctx.gateway.list_groups().await
}

pub async fn get_group<S: DocumentStore, A: AuthProvider>(
    ctx: &AppContext<S, A>,
    group_id: &GroupId,
) -> Result<Group> {
    ctx.gateway.get_group(group_id).await
}

/// Delete a group with its members and chat.
pub async fn delete_group<S: DocumentStore, A: AuthProvider>(
    ctx: &AppContext<S, A>,
    group_id: &GroupId,
) -> Result<()> {
    let account = ctx.session.require()?;
    ctx.gateway.delete_group(group_id).await?;
    info!(group_id = %group_id, by = %account.short(), "Group removed");
    ctx.events.emit(ClientEvent::GroupDeleted {
        group_id: group_id.clone(),
    });
    Ok(())
}

/// Users that can be picked as members of a new group: everyone except the
/// signed-in user.
pub async fn candidate_users<S: DocumentStore, A: AuthProvider>(
    ctx: &AppContext<S, A>,
) -> Result<Vec<User>> {
    let me = ctx.session.current();
    let users = ctx.gateway.list_users().await?;
    Ok(users
        .into_iter()
        .filter(|u| Some(&u.id) != me.as_ref())
        .collect())
}
