use serde::Deserialize;
use tracing::info;

use huddle_shared::validation::validate_profile;
use huddle_shared::{User, ValidationError};
use huddle_store::{AuthProvider, DocumentStore};

use crate::error::Result;
use crate::state::AppContext;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    pub surname: String,
    /// Leave empty to keep the current password.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// The signed-in user's profile.
pub async fn get_profile<S: DocumentStore, A: AuthProvider>(ctx: &AppContext<S, A>) -> Result<User> {
    let id = ctx.session.require()?;
    ctx.gateway.get_user(&id).await
}

/// Update name and surname, and the password when one is given.
///
/// Existing participant records keep the names they were created with.
pub async fn update_profile<S: DocumentStore, A: AuthProvider>(
    ctx: &AppContext<S, A>,
    update: &ProfileUpdate,
) -> Result<User> {
    let id = ctx.session.require()?;
    validate_profile(&update.name, &update.surname)?;
    if update.password != update.confirm_password {
        return Err(ValidationError::PasswordMismatch.into());
    }

    ctx.gateway
        .update_user_names(&id, update.name.trim(), update.surname.trim())
        .await?;
    if !update.password.is_empty() {
        ctx.auth.update_password(&update.password).await?;
    }

    info!(account = %id.short(), password_changed = !update.password.is_empty(), "Profile updated");
    ctx.gateway.get_user(&id).await
}
