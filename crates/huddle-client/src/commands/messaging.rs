use chrono::Utc;
use tracing::info;

use huddle_shared::validation::validate_message_text;
use huddle_shared::{GroupId, Message, MessageId};
use huddle_store::{AuthProvider, DocumentStore};

use crate::error::Result;
use crate::events::ClientEvent;
use crate::state::AppContext;

/// Post a chat message as the signed-in user.
///
/// The sender's profile is copied into the message as it is right now.
pub async fn send_message<S: DocumentStore, A: AuthProvider>(
    ctx: &AppContext<S, A>,
    group_id: &GroupId,
    text: &str,
) -> Result<Message> {
    let account = ctx.session.require()?;
    validate_message_text(text, ctx.config.message_max_len)?;

    let (_, sender) = tokio::try_join!(
        ctx.gateway.get_group(group_id),
        ctx.gateway.get_user(&account),
    )?;

    let message = Message {
        id: MessageId::new(),
        text: text.trim().to_string(),
        timestamp: Utc::now(),
        sender,
    };
    ctx.gateway.post_message(group_id, &message).await?;

    info!(group_id = %group_id, message_id = %message.id, "Message sent");
    ctx.events.emit(ClientEvent::MessageSent {
        group_id: group_id.clone(),
        message_id: message.id.clone(),
    });
    Ok(message)
}

/// The group's chat, oldest first.
pub async fn list_messages<S: DocumentStore, A: AuthProvider>(
    ctx: &AppContext<S, A>,
    group_id: &GroupId,
) -> Result<Vec<Message>> {
    ctx.gateway.list_messages(group_id).await
}
