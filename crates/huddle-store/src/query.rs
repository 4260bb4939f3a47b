//! Documents, queries and write batches.
//!
//! A document lives in a collection addressed by a slash-separated path
//! (`groups`, `groups/{gid}/participants`) and carries a JSON object of
//! fields.  The document id is kept outside the field map.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

/// The data fields of a document.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode into a model, exposing the document id as the `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    /// Encode a model into document fields.  An `id` field, if present, is
    /// dropped: the id is the document key, not part of its body.
    pub fn encode<T: Serialize>(value: &T) -> Result<Fields> {
        match serde_json::to_value(value)? {
            Value::Object(mut fields) => {
                fields.remove("id");
                Ok(fields)
            }
            other => Err(StoreError::Unavailable(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Row filter evaluated against each candidate document.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Only the document with this id.
    IdEq(String),
    /// `field == value`.
    Eq(String, Value),
    /// `field != value`.  Documents lacking the field do not match, the same
    /// way an inequality query skips documents without the field.
    Ne(String, Value),
}

impl Filter {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::IdEq(id) => doc.id == *id,
            Filter::Eq(field, value) => doc.field(field) == Some(value),
            Filter::Ne(field, value) => doc.field(field).is_some_and(|v| v != value),
        }
    }
}

/// A read over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filter: Option<Filter>,
    /// Ascending order by this field; insertion order when `None`.
    pub order_by: Option<String>,
}

impl Query {
    pub fn collection(path: impl Into<String>) -> Self {
        Self {
            collection: path.into(),
            filter: None,
            order_by: None,
        }
    }

    /// A query matching a single document.
    pub fn document(path: impl Into<String>, id: impl Into<String>) -> Self {
        Self::collection(path).filter(Filter::IdEq(id.into()))
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or overwrite.
    Set {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Merge fields into an existing document; fails if it is missing.
    Update {
        collection: String,
        id: String,
        fields: Fields,
    },
    Delete { collection: String, id: String },
}

impl WriteOp {
    pub fn collection(&self) -> &str {
        match self {
            WriteOp::Set { collection, .. }
            | WriteOp::Update { collection, .. }
            | WriteOp::Delete { collection, .. } => collection,
        }
    }
}

/// A group of writes committed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, collection: impl Into<String>, id: impl Into<String>, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Set {
            collection: collection.into(),
            id: id.into(),
            fields,
        });
        self
    }

    pub fn update(
        &mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        fields: Fields,
    ) -> &mut Self {
        self.ops.push(WriteOp::Update {
            collection: collection.into(),
            id: id.into(),
            fields,
        });
        self
    }

    pub fn delete(&mut self, collection: impl Into<String>, id: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.into(),
            id: id.into(),
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Distinct collections touched by the batch, in first-touch order.
    pub fn collections(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for op in &self.ops {
            if !seen.iter().any(|c| c == op.collection()) {
                seen.push(op.collection().to_string());
            }
        }
        seen
    }
}
