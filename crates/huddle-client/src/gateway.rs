//! Typed access to the document store.
//!
//! [`Gateway`] is the one place that knows collection paths and document
//! encodings.  Views, the edit workflow and the commands all go through it.

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::info;

use huddle_shared::constants::{
    GROUP_ORDER_FIELD, GROUPS_COLLECTION, MESSAGE_ORDER_FIELD, USERS_COLLECTION,
};
use huddle_shared::validation::{validate_group_fields, validate_participants};
use huddle_shared::{AccountId, Group, GroupFields, GroupId, Message, Participant, User};
use huddle_store::{Document, DocumentStore, Fields, Filter, Query, Subscription, WriteBatch};

use crate::error::{ClientError, Result};

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub fn group_query(group_id: &GroupId) -> Query {
    Query::document(GROUPS_COLLECTION, group_id.as_str())
}

pub fn participants_query(group_id: &GroupId) -> Query {
    Query::collection(group_id.participants_path())
}

/// Messages in ascending `timestamp` order.
pub fn messages_query(group_id: &GroupId) -> Query {
    Query::collection(group_id.messages_path()).order_by(MESSAGE_ORDER_FIELD)
}

/// Users with a non-empty email.
pub fn users_query() -> Query {
    Query::collection(USERS_COLLECTION)
        .filter(Filter::Ne("email".to_string(), serde_json::Value::from("")))
}

#[derive(Clone)]
pub struct Gateway<S> {
    store: S,
}

impl<S: DocumentStore> Gateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    pub async fn get_group(&self, group_id: &GroupId) -> Result<Group> {
        let doc = self
            .store
            .get(GROUPS_COLLECTION, group_id.as_str())
            .await
            .map_err(ClientError::read)?
            .ok_or_else(|| ClientError::not_found_in(GROUPS_COLLECTION, group_id.as_str()))?;
        decode(&doc)
    }

    /// All groups, newest first.
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        let query = Query::collection(GROUPS_COLLECTION).order_by(GROUP_ORDER_FIELD);
        let mut groups: Vec<Group> = self.list(&query).await?;
        groups.reverse();
        Ok(groups)
    }

    /// Create a group and its initial members in one batch.
    pub async fn create_group(&self, fields: &GroupFields, members: &[User]) -> Result<Group> {
        validate_group_fields(fields)?;
        validate_participants(members)?;

        let group = Group {
            id: GroupId::new(),
            title: fields.title.clone(),
            description: fields.description.clone(),
            location: fields.location.clone(),
            time: fields.time.clone(),
            created_at: Some(Utc::now()),
        };

        let mut batch = WriteBatch::new();
        batch.set(GROUPS_COLLECTION, group.id.as_str(), encode(&group)?);
        let path = group.id.participants_path();
        for participant in dedup_members(members) {
            batch.set(path.as_str(), participant.id.as_str(), encode(&participant)?);
        }

        self.store.commit(batch).await.map_err(ClientError::write)?;
        info!(group_id = %group.id, members = members.len(), "Group created");
        Ok(group)
    }

    pub async fn update_group_fields(&self, group_id: &GroupId, fields: &GroupFields) -> Result<()> {
        validate_group_fields(fields)?;
        self.store
            .update(GROUPS_COLLECTION, group_id.as_str(), encode(fields)?)
            .await
            .map_err(ClientError::write)
    }

    /// Delete a group together with its participants and messages.
    pub async fn delete_group(&self, group_id: &GroupId) -> Result<()> {
        // Surfaces NotFound for a group that is already gone.
        self.get_group(group_id).await?;

        let participants = self
            .store
            .list(&participants_query(group_id))
            .await
            .map_err(ClientError::read)?;
        let messages = self
            .store
            .list(&Query::collection(group_id.messages_path()))
            .await
            .map_err(ClientError::read)?;

        let mut batch = WriteBatch::new();
        for doc in &participants {
            batch.delete(group_id.participants_path(), doc.id.as_str());
        }
        for doc in &messages {
            batch.delete(group_id.messages_path(), doc.id.as_str());
        }
        batch.delete(GROUPS_COLLECTION, group_id.as_str());

        self.store.commit(batch).await.map_err(ClientError::write)?;
        info!(
            group_id = %group_id,
            participants = participants.len(),
            messages = messages.len(),
            "Group deleted"
        );
        Ok(())
    }

    pub fn subscribe_group(&self, group_id: &GroupId) -> Result<Subscription> {
        self.store
            .subscribe(group_query(group_id))
            .map_err(ClientError::read)
    }

    // ------------------------------------------------------------------
    // Participants
    // ------------------------------------------------------------------

    pub async fn list_participants(&self, group_id: &GroupId) -> Result<Vec<Participant>> {
        self.list(&participants_query(group_id)).await
    }

    /// Add users that are not members yet.  Returns how many were added.
    pub async fn add_participants(&self, group_id: &GroupId, users: &[User]) -> Result<usize> {
        validate_participants(users)?;
        self.get_group(group_id).await?;

        let current = self.list_participants(group_id).await?;
        let path = group_id.participants_path();
        let mut batch = WriteBatch::new();
        for participant in dedup_members(users) {
            if current.iter().any(|p| p.id == participant.id) {
                continue;
            }
            batch.set(path.as_str(), participant.id.as_str(), encode(&participant)?);
        }

        let added = batch.len();
        self.store.commit(batch).await.map_err(ClientError::write)?;
        info!(group_id = %group_id, added, "Participants added");
        Ok(added)
    }

    pub fn subscribe_participants(&self, group_id: &GroupId) -> Result<Subscription> {
        self.store
            .subscribe(participants_query(group_id))
            .map_err(ClientError::read)
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn get_user(&self, id: &AccountId) -> Result<User> {
        let doc = self
            .store
            .get(USERS_COLLECTION, id.as_str())
            .await
            .map_err(ClientError::read)?
            .ok_or_else(|| ClientError::not_found_in(USERS_COLLECTION, id.as_str()))?;
        decode(&doc)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.list(&users_query()).await
    }

    pub async fn put_user(&self, user: &User) -> Result<()> {
        self.store
            .set(USERS_COLLECTION, user.id.as_str(), encode(user)?)
            .await
            .map_err(ClientError::write)
    }

    pub async fn update_user_names(&self, id: &AccountId, name: &str, surname: &str) -> Result<()> {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), name.into());
        fields.insert("surname".to_string(), surname.into());
        self.store
            .update(USERS_COLLECTION, id.as_str(), fields)
            .await
            .map_err(ClientError::write)
    }

    pub async fn delete_user(&self, id: &AccountId) -> Result<()> {
        self.store
            .delete(USERS_COLLECTION, id.as_str())
            .await
            .map_err(ClientError::write)
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    pub async fn list_messages(&self, group_id: &GroupId) -> Result<Vec<Message>> {
        self.list(&messages_query(group_id)).await
    }

    pub async fn post_message(&self, group_id: &GroupId, message: &Message) -> Result<()> {
        self.store
            .set(&group_id.messages_path(), &message.id.0, encode(message)?)
            .await
            .map_err(ClientError::write)
    }

    pub fn subscribe_messages(&self, group_id: &GroupId) -> Result<Subscription> {
        self.store
            .subscribe(messages_query(group_id))
            .map_err(ClientError::read)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn list<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>> {
        let docs = self.store.list(query).await.map_err(ClientError::read)?;
        decode_all(&docs)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(doc: &Document) -> Result<T> {
    doc.decode().map_err(ClientError::read)
}

pub(crate) fn decode_all<T: DeserializeOwned>(docs: &[Document]) -> Result<Vec<T>> {
    docs.iter().map(decode::<T>).collect()
}

pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Result<Fields> {
    Document::encode(value).map_err(ClientError::write)
}

/// Participant snapshots of `users`, first occurrence of each id wins.
pub(crate) fn dedup_members(users: &[User]) -> Vec<Participant> {
    let mut out: Vec<Participant> = Vec::with_capacity(users.len());
    for user in users {
        if !out.iter().any(|p| p.id == user.id) {
            out.push(Participant::from(user));
        }
    }
    out
}
