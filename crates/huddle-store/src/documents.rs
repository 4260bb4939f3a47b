//! CRUD operations for [`Document`] records.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::query::{Document, Fields, Query, WriteBatch, WriteOp};

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single document, `None` if it does not exist.
    pub fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let row = self
            .conn()
            .query_row(
                "SELECT id, fields FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(id, body)| parse_document(id, &body)).transpose()
    }

    /// Run a query.  Ordering is applied by SQLite, filtering afterwards.
    pub fn query_documents(&self, query: &Query) -> Result<Vec<Document>> {
        let mut rows: Vec<(String, String)> = Vec::new();

        match &query.order_by {
            Some(field) => {
                let mut stmt = self.conn().prepare(
                    "SELECT id, fields FROM documents
                     WHERE collection = ?1
                     ORDER BY json_extract(fields, ?2) ASC, seq ASC",
                )?;
                let mapped = stmt.query_map(params![query.collection, format!("$.{field}")], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
                for row in mapped {
                    rows.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn().prepare(
                    "SELECT id, fields FROM documents
                     WHERE collection = ?1
                     ORDER BY seq ASC",
                )?;
                let mapped = stmt.query_map(params![query.collection], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
                for row in mapped {
                    rows.push(row?);
                }
            }
        }

        let mut documents = Vec::with_capacity(rows.len());
        for (id, body) in rows {
            let doc = parse_document(id, &body)?;
            if query.filter.as_ref().map_or(true, |f| f.matches(&doc)) {
                documents.push(doc);
            }
        }
        Ok(documents)
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Create or overwrite a document.  Overwriting keeps its original
    /// insertion position.
    pub fn set_document(&self, collection: &str, id: &str, fields: &Fields) -> Result<()> {
        set_in(self.conn(), collection, id, fields)
    }

    /// Merge `partial` into an existing document.
    pub fn update_document(&self, collection: &str, id: &str, partial: &Fields) -> Result<()> {
        update_in(self.conn(), collection, id, partial)
    }

    /// Delete a document.  Returns `true` if a row was deleted; deleting a
    /// missing document is not an error.
    pub fn delete_document(&self, collection: &str, id: &str) -> Result<bool> {
        delete_in(self.conn(), collection, id)
    }

    /// Apply every write of `batch` inside one transaction.
    pub fn apply_batch(&self, batch: &WriteBatch) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        for op in batch.ops() {
            match op {
                WriteOp::Set {
                    collection,
                    id,
                    fields,
                } => set_in(&tx, collection, id, fields)?,
                WriteOp::Update {
                    collection,
                    id,
                    fields,
                } => update_in(&tx, collection, id, fields)?,
                WriteOp::Delete { collection, id } => {
                    delete_in(&tx, collection, id)?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn set_in(conn: &Connection, collection: &str, id: &str, fields: &Fields) -> Result<()> {
    let body = serde_json::to_string(fields)?;
    conn.execute(
        "INSERT INTO documents (collection, id, fields, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (collection, id)
         DO UPDATE SET fields = excluded.fields, updated_at = excluded.updated_at",
        params![collection, id, body, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn update_in(conn: &Connection, collection: &str, id: &str, partial: &Fields) -> Result<()> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT fields FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(body) = existing else {
        return Err(StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    };

    let mut fields: Fields = serde_json::from_str(&body)?;
    for (key, value) in partial {
        fields.insert(key.clone(), value.clone());
    }

    conn.execute(
        "UPDATE documents SET fields = ?1, updated_at = ?2
         WHERE collection = ?3 AND id = ?4",
        params![
            serde_json::to_string(&fields)?,
            Utc::now().to_rfc3339(),
            collection,
            id
        ],
    )?;
    Ok(())
}

fn delete_in(conn: &Connection, collection: &str, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection, id],
    )?;
    Ok(affected > 0)
}

fn parse_document(id: String, body: &str) -> Result<Document> {
    let fields: Fields = serde_json::from_str(body)?;
    Ok(Document { id, fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Filter;
    use serde_json::{json, Value};

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn set_get_delete() {
        let db = Database::open_in_memory().unwrap();
        db.set_document("users", "u1", &fields(json!({ "name": "Ada" })))
            .unwrap();

        let doc = db.get_document("users", "u1").unwrap().unwrap();
        assert_eq!(doc.fields["name"], "Ada");

        assert!(db.delete_document("users", "u1").unwrap());
        assert!(!db.delete_document("users", "u1").unwrap());
        assert!(db.get_document("users", "u1").unwrap().is_none());
    }

    #[test]
    fn update_merges_and_requires_existing() {
        let db = Database::open_in_memory().unwrap();
        db.set_document(
            "users",
            "u1",
            &fields(json!({ "name": "Ada", "surname": "Byron" })),
        )
        .unwrap();
        db.update_document("users", "u1", &fields(json!({ "surname": "Lovelace" })))
            .unwrap();

        let doc = db.get_document("users", "u1").unwrap().unwrap();
        assert_eq!(doc.fields["name"], "Ada");
        assert_eq!(doc.fields["surname"], "Lovelace");

        let err = db
            .update_document("users", "ghost", &Fields::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn ordered_query_uses_field_then_insertion() {
        let db = Database::open_in_memory().unwrap();
        let path = "groups/g1/messages";
        db.set_document(path, "late", &fields(json!({ "timestamp": 300 })))
            .unwrap();
        db.set_document(path, "early", &fields(json!({ "timestamp": 100 })))
            .unwrap();
        db.set_document(path, "tie", &fields(json!({ "timestamp": 100 })))
            .unwrap();

        let ids: Vec<String> = db
            .query_documents(&Query::collection(path).order_by("timestamp"))
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["early", "tie", "late"]);
    }

    #[test]
    fn collections_are_isolated() {
        let db = Database::open_in_memory().unwrap();
        db.set_document("groups/g1/participants", "u1", &Fields::new())
            .unwrap();
        db.set_document("groups/g2/participants", "u2", &Fields::new())
            .unwrap();

        let docs = db
            .query_documents(&Query::collection("groups/g1/participants"))
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "u1");
    }

    #[test]
    fn filtered_query() {
        let db = Database::open_in_memory().unwrap();
        db.set_document("users", "u1", &fields(json!({ "email": "ada@x.com" })))
            .unwrap();
        db.set_document("users", "u2", &fields(json!({ "email": "" })))
            .unwrap();

        let docs = db
            .query_documents(&Query::collection("users").filter(Filter::Ne("email".into(), json!(""))))
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "u1");
    }

    #[test]
    fn failed_batch_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        db.set_document("groups/g1/participants", "u1", &Fields::new())
            .unwrap();

        let mut batch = WriteBatch::new();
        batch
            .delete("groups/g1/participants", "u1")
            .update("groups", "missing", Fields::new());

        assert!(db.apply_batch(&batch).is_err());
        assert!(db
            .get_document("groups/g1/participants", "u1")
            .unwrap()
            .is_some());
    }
}
