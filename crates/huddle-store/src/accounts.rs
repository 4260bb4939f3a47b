//! Account records of the local auth provider.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use huddle_shared::AccountId;

use crate::database::Database;
use crate::error::{Result, StoreError};

/// A stored email/password account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    /// Lower-cased email address.
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Build a new account with a fresh random salt.
    pub fn create(email: &str, password: &str) -> Self {
        let salt: [u8; 16] = rand::random();
        let salt = hex::encode(salt);
        Self {
            id: AccountId::new(),
            email: normalize_email(email),
            password_hash: hash_password(&salt, password),
            salt,
            created_at: Utc::now(),
        }
    }

    /// Compare `password` against the stored hash in constant time.
    pub fn verify(&self, password: &str) -> bool {
        let Ok(stored) = blake3::Hash::from_hex(&self.password_hash) else {
            return false;
        };
        stored == password_digest(&self.salt, password)
    }

    pub fn set_password(&mut self, password: &str) {
        let salt: [u8; 16] = rand::random();
        self.salt = hex::encode(salt);
        self.password_hash = hash_password(&self.salt, password);
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn password_digest(salt: &str, password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize()
}

fn hash_password(salt: &str, password: &str) -> String {
    password_digest(salt, password).to_hex().to_string()
}

impl Database {
    pub fn insert_account(&self, account: &Account) -> Result<()> {
        self.conn().execute(
            "INSERT INTO accounts (id, email, password_hash, salt, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.id.as_str(),
                account.email,
                account.password_hash,
                account.salt,
                account.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.conn()
            .query_row(
                "SELECT id, email, password_hash, salt, created_at
                 FROM accounts WHERE email = ?1",
                params![normalize_email(email)],
                row_to_account,
            )
            .optional()
            .map_err(StoreError::from)
    }

    pub fn get_account(&self, id: &AccountId) -> Result<Option<Account>> {
        self.conn()
            .query_row(
                "SELECT id, email, password_hash, salt, created_at
                 FROM accounts WHERE id = ?1",
                params![id.as_str()],
                row_to_account,
            )
            .optional()
            .map_err(StoreError::from)
    }

    pub fn update_account_password(&self, account: &Account) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE accounts SET password_hash = ?1, salt = ?2 WHERE id = ?3",
            params![account.password_hash, account.salt, account.id.as_str()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                collection: "accounts".to_string(),
                id: account.id.to_string(),
            });
        }
        Ok(())
    }

    /// Delete an account.  Returns `true` if a row was deleted.
    pub fn delete_account(&self, id: &AccountId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM accounts WHERE id = ?1", params![id.as_str()])?;
        Ok(affected > 0)
    }
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    let id: String = row.get(0)?;
    let created_str: String = row.get(4)?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Account {
        id: AccountId(id),
        email: row.get(1)?,
        password_hash: row.get(2)?,
        salt: row.get(3)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_verification() {
        let account = Account::create("Ada@X.com ", "secret1");
        assert_eq!(account.email, "ada@x.com");
        assert!(account.verify("secret1"));
        assert!(!account.verify("secret2"));
    }

    #[test]
    fn same_password_different_salt() {
        let a = Account::create("a@x.com", "secret1");
        let b = Account::create("b@x.com", "secret1");
        assert_ne!(a.password_hash, b.password_hash);
    }

    #[test]
    fn account_crud() {
        let db = Database::open_in_memory().unwrap();
        let mut account = Account::create("ada@x.com", "secret1");
        db.insert_account(&account).unwrap();

        let found = db.find_account_by_email("ADA@x.com").unwrap().unwrap();
        assert_eq!(found.id, account.id);

        account.set_password("another1");
        db.update_account_password(&account).unwrap();
        let reloaded = db.get_account(&account.id).unwrap().unwrap();
        assert!(reloaded.verify("another1"));

        assert!(db.delete_account(&account.id).unwrap());
        assert!(db.get_account(&account.id).unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.insert_account(&Account::create("ada@x.com", "secret1"))
            .unwrap();
        assert!(db
            .insert_account(&Account::create("ADA@x.com", "secret2"))
            .is_err());
    }
}
