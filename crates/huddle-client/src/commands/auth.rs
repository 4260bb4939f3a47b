use serde::Deserialize;
use tracing::{info, warn};

use huddle_shared::validation::{validate_email, validate_profile};
use huddle_shared::{AccountId, User};
use huddle_store::{AuthProvider, DocumentStore};

use crate::error::Result;
use crate::state::AppContext;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}

/// Create an account and its profile document.  Leaves the user signed in.
pub async fn sign_up<S: DocumentStore, A: AuthProvider>(
    ctx: &AppContext<S, A>,
    form: &SignUpForm,
) -> Result<User> {
    validate_profile(&form.name, &form.surname)?;
    validate_email(&form.email)?;

    let id = ctx.auth.sign_up(form.email.trim(), &form.password).await?;
    let user = User {
        id,
        name: form.name.trim().to_string(),
        surname: form.surname.trim().to_string(),
        email: form.email.trim().to_string(),
    };
    if let Err(e) = ctx.gateway.put_user(&user).await {
        warn!(account = %user.id.short(), error = %e, "account created but profile write failed");
        return Err(e);
    }

    info!(account = %user.id.short(), "Signed up");
    Ok(user)
}

pub async fn sign_in<S: DocumentStore, A: AuthProvider>(
    ctx: &AppContext<S, A>,
    email: &str,
    password: &str,
) -> Result<AccountId> {
    Ok(ctx.auth.sign_in(email.trim(), password).await?)
}

pub async fn sign_out<S: DocumentStore, A: AuthProvider>(ctx: &AppContext<S, A>) {
    ctx.auth.sign_out().await;
}

/// Delete the profile document, then the account itself.
pub async fn delete_account<S: DocumentStore, A: AuthProvider>(ctx: &AppContext<S, A>) -> Result<()> {
    let id = ctx.session.require()?;
    ctx.gateway.delete_user(&id).await?;
    if let Err(e) = ctx.auth.delete_account().await {
        warn!(account = %id.short(), error = %e, "profile removed but account deletion failed");
        return Err(e.into());
    }
    info!(account = %id.short(), "Account deleted");
    Ok(())
}
