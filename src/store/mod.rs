pub mod memory;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Field map for one stored document, keyed by wire field name.
pub type Fields = serde_json::Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {path}/{id}")]
    NotFound { path: String, id: String },
    #[error("write rejected by store")]
    WriteRejected,
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Path to one of the collections the assistant persists into. Tasks and
/// summaries live under their owning meeting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionPath {
    Meetings,
    Summaries { meeting_id: String },
    Tasks { meeting_id: String },
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionPath::Meetings => write!(f, "meetings"),
            CollectionPath::Summaries { meeting_id } => {
                write!(f, "meetings/{}/summaries", meeting_id)
            }
            CollectionPath::Tasks { meeting_id } => write!(f, "meetings/{}/tasks", meeting_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Collection query: optional equality filter, single-field ordering, limit,
/// and a cursor that resumes strictly after a given document. The cursor
/// carries both the order-by value and the document id; the id breaks ties
/// between documents with equal order-by values so no document is skipped or
/// repeated across pages.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Option<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
    pub start_after: Option<(Value, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filter = Some((field.into(), value));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, value: Value, doc_id: impl Into<String>) -> Self {
        self.start_after = Some((value, doc_id.into()));
        self
    }
}

/// One document returned from a query.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub id: String,
    pub fields: Fields,
}

#[derive(Debug, Clone)]
pub enum WriteOp {
    Set {
        path: CollectionPath,
        id: String,
        fields: Fields,
    },
    Update {
        path: CollectionPath,
        id: String,
        fields: Fields,
    },
    Delete {
        path: CollectionPath,
        id: String,
    },
}

/// Group of writes committed atomically: either every operation applies or
/// none do.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: CollectionPath, id: impl Into<String>, fields: Fields) {
        self.ops.push(WriteOp::Set {
            path,
            id: id.into(),
            fields,
        });
    }

    pub fn update(&mut self, path: CollectionPath, id: impl Into<String>, fields: Fields) {
        self.ops.push(WriteOp::Update {
            path,
            id: id.into(),
            fields,
        });
    }

    pub fn delete(&mut self, path: CollectionPath, id: impl Into<String>) {
        self.ops.push(WriteOp::Delete {
            path,
            id: id.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Cloud document store boundary. Production deployments back this with a
/// hosted document database; tests and tooling use
/// [`memory::MemoryStore`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document with a generated id; returns the id.
    async fn insert(&self, path: &CollectionPath, fields: Fields) -> Result<String, StoreError>;

    async fn get(&self, path: &CollectionPath, id: &str) -> Result<Option<Fields>, StoreError>;

    /// Merge the given fields into an existing document.
    async fn update(
        &self,
        path: &CollectionPath,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, path: &CollectionPath, id: &str) -> Result<(), StoreError>;

    async fn query(
        &self,
        path: &CollectionPath,
        query: Query,
    ) -> Result<Vec<DocumentSnapshot>, StoreError>;

    /// Apply a batch of writes atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// Serialize a record into a store field map.
pub fn to_fields<T: Serialize>(record: &T) -> Result<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("record serialized to non-object value: {}", other)),
    }
}

/// Deserialize a record from a store field map.
pub fn from_fields<T: DeserializeOwned>(fields: Fields) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(fields))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_paths_nest_under_meeting() {
        assert_eq!(CollectionPath::Meetings.to_string(), "meetings");
        assert_eq!(
            CollectionPath::Tasks {
                meeting_id: "m1".to_string()
            }
            .to_string(),
            "meetings/m1/tasks"
        );
        assert_eq!(
            CollectionPath::Summaries {
                meeting_id: "m1".to_string()
            }
            .to_string(),
            "meetings/m1/summaries"
        );
    }

    #[test]
    fn test_batch_collects_ops_in_order() {
        let mut batch = WriteBatch::new();
        batch.set(CollectionPath::Meetings, "a", Fields::new());
        batch.delete(CollectionPath::Meetings, "b");
        assert_eq!(batch.len(), 2);
        let ops = batch.into_ops();
        assert!(matches!(&ops[0], WriteOp::Set { id, .. } if id == "a"));
        assert!(matches!(&ops[1], WriteOp::Delete { id, .. } if id == "b"));
    }
}
