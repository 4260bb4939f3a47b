//! v001 -- Initial schema creation.
//!
//! Creates the `documents` table backing every collection and the
//! `accounts` table of the auth provider.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Documents (every collection and sub-collection)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS documents (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT, -- insertion order
    collection TEXT NOT NULL,                     -- e.g. groups/{gid}/messages
    id         TEXT NOT NULL,
    fields     TEXT NOT NULL,                     -- JSON object
    updated_at TEXT NOT NULL,                     -- RFC-3339

    UNIQUE (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection
    ON documents(collection, seq);

-- ----------------------------------------------------------------
-- Accounts (auth provider)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    id            TEXT PRIMARY KEY NOT NULL,
    email         TEXT NOT NULL UNIQUE,          -- lower-cased
    password_hash TEXT NOT NULL,                 -- hex BLAKE3(salt || password)
    salt          TEXT NOT NULL,                 -- hex, 16 bytes
    created_at    TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
