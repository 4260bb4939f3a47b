use tracing::debug;

use huddle_shared::{GroupId, User};
use huddle_store::{AuthProvider, DocumentStore};

use crate::error::Result;
use crate::events::ClientEvent;
use crate::state::AppContext;

/// Users matching `term` that are not members of the group yet, excluding
/// the signed-in user.  A blank term matches nobody.
pub async fn search_users<S: DocumentStore, A: AuthProvider>(
    ctx: &AppContext<S, A>,
    group_id: &GroupId,
    term: &str,
) -> Result<Vec<User>> {
    if term.trim().is_empty() {
        return Ok(Vec::new());
    }
    let me = ctx.session.current();
    let (users, members) = tokio::try_join!(
        ctx.gateway.list_users(),
        ctx.gateway.list_participants(group_id),
    )?;

    let found: Vec<User> = users
        .into_iter()
        .filter(|u| Some(&u.id) != me.as_ref())
        .filter(|u| u.matches(term))
        .filter(|u| !members.iter().any(|m| m.id == u.id))
        .collect();
    debug!(group_id = %group_id, term, found = found.len(), "user search");
    Ok(found)
}

/// Add users to a group, skipping current members.  Returns how many joined.
pub async fn add_participants<S: DocumentStore, A: AuthProvider>(
    ctx: &AppContext<S, A>,
    group_id: &GroupId,
    users: &[User],
) -> Result<usize> {
    ctx.session.require()?;
    let added = ctx.gateway.add_participants(group_id, users).await?;
    if added > 0 {
        ctx.events.emit(ClientEvent::GroupUpdated {
            group_id: group_id.clone(),
        });
    }
    Ok(added)
}
