use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{GROUPS_COLLECTION, MESSAGES_COLLECTION, PARTICIPANTS_COLLECTION};

// Account identity = opaque id issued by the auth provider. It doubles as the
// key of the user's profile document and of their participant records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> String {
        self.0.chars().take(8).collect()
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of this group's participant sub-collection.
    pub fn participants_path(&self) -> String {
        format!("{GROUPS_COLLECTION}/{}/{PARTICIPANTS_COLLECTION}", self.0)
    }

    /// Path of this group's message sub-collection.
    pub fn messages_path(&self) -> String {
        format!("{GROUPS_COLLECTION}/{}/{MESSAGES_COLLECTION}", self.0)
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_collection_paths() {
        let id = GroupId::from("g1");
        assert_eq!(id.participants_path(), "groups/g1/participants");
        assert_eq!(id.messages_path(), "groups/g1/messages");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(GroupId::new(), GroupId::new());
        assert_eq!(AccountId::new().as_str().len(), 32);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&AccountId::from("u1")).unwrap();
        assert_eq!(json, "\"u1\"");
    }
}
