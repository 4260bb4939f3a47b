/// Application name
pub const APP_NAME: &str = "Huddle";

/// Top-level collection holding one document per group
pub const GROUPS_COLLECTION: &str = "groups";

/// Top-level collection holding one profile document per account
pub const USERS_COLLECTION: &str = "users";

/// Per-group sub-collection of participant snapshots
pub const PARTICIPANTS_COLLECTION: &str = "participants";

/// Per-group sub-collection of chat messages
pub const MESSAGES_COLLECTION: &str = "messages";

/// Field the message feed is ordered by
pub const MESSAGE_ORDER_FIELD: &str = "timestamp";

/// Field the group list is ordered by
pub const GROUP_ORDER_FIELD: &str = "created_at";

/// Minimum password length accepted by the auth provider
pub const MIN_PASSWORD_LEN: usize = 6;

/// Default maximum chat message length in characters
pub const DEFAULT_MESSAGE_MAX_LEN: usize = 2000;

/// Line rendered for a group without members
pub const NO_PARTICIPANTS_LINE: &str = "No participants found.";
