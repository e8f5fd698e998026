use super::{
    CollectionPath, Direction, DocumentSnapshot, DocumentStore, Fields, Query, StoreError,
    WriteBatch, WriteOp,
};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;
use uuid::Uuid;

type Collections = HashMap<String, BTreeMap<String, Fields>>;

/// In-memory [`DocumentStore`] used by tests and tooling. A single lock makes
/// batch commits atomic; `fail_writes` lets tests exercise the rollback paths
/// of callers.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every write (single or batched) fails with
    /// [`StoreError::WriteRejected`]. Reads are unaffected.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            Err(StoreError::WriteRejected)
        } else {
            Ok(())
        }
    }
}

fn apply_op(collections: &mut Collections, op: WriteOp) -> Result<(), StoreError> {
    match op {
        WriteOp::Set { path, id, fields } => {
            collections
                .entry(path.to_string())
                .or_default()
                .insert(id, fields);
            Ok(())
        }
        WriteOp::Update { path, id, fields } => {
            let doc = collections
                .get_mut(&path.to_string())
                .and_then(|docs| docs.get_mut(&id))
                .ok_or_else(|| StoreError::NotFound {
                    path: path.to_string(),
                    id: id.clone(),
                })?;
            for (key, value) in fields {
                doc.insert(key, value);
            }
            Ok(())
        }
        WriteOp::Delete { path, id } => {
            if let Some(docs) = collections.get_mut(&path.to_string()) {
                docs.remove(&id);
            }
            Ok(())
        }
    }
}

/// Order two field values the way the backing store would: nulls first, then
/// booleans, numbers, strings (ISO-8601 timestamps order correctly here).
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn type_rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(f64::NAN)
            .partial_cmp(&y.as_f64().unwrap_or(f64::NAN))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, path: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        self.check_writable()?;
        let id = Uuid::new_v4().to_string();
        let mut collections = self.collections.lock().expect("store lock poisoned");
        collections
            .entry(path.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn get(&self, path: &CollectionPath, id: &str) -> Result<Option<Fields>, StoreError> {
        let collections = self.collections.lock().expect("store lock poisoned");
        Ok(collections
            .get(&path.to_string())
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn update(
        &self,
        path: &CollectionPath,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut collections = self.collections.lock().expect("store lock poisoned");
        apply_op(
            &mut collections,
            WriteOp::Update {
                path: path.clone(),
                id: id.to_string(),
                fields,
            },
        )
    }

    async fn delete(&self, path: &CollectionPath, id: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut collections = self.collections.lock().expect("store lock poisoned");
        apply_op(
            &mut collections,
            WriteOp::Delete {
                path: path.clone(),
                id: id.to_string(),
            },
        )
    }

    async fn query(
        &self,
        path: &CollectionPath,
        query: Query,
    ) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let collections = self.collections.lock().expect("store lock poisoned");
        let Some(docs) = collections.get(&path.to_string()) else {
            return Ok(Vec::new());
        };

        let mut snapshots: Vec<DocumentSnapshot> = docs
            .iter()
            .filter(|(_, fields)| match &query.filter {
                Some((field, expected)) => fields.get(field) == Some(expected),
                None => true,
            })
            .map(|(id, fields)| DocumentSnapshot {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect();

        if let Some((field, direction)) = &query.order_by {
            // Document id is the secondary sort key so documents with equal
            // order-by values have a stable, resumable position.
            snapshots.sort_by(|a, b| {
                let ordering = compare_values(
                    a.fields.get(field).unwrap_or(&Value::Null),
                    b.fields.get(field).unwrap_or(&Value::Null),
                )
                .then_with(|| a.id.cmp(&b.id));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });

            // Cursor resumes strictly after the given (value, id) pair.
            if let Some((cursor_value, cursor_id)) = &query.start_after {
                snapshots.retain(|snapshot| {
                    let value = snapshot.fields.get(field).unwrap_or(&Value::Null);
                    let ordering = compare_values(value, cursor_value)
                        .then_with(|| snapshot.id.as_str().cmp(cursor_id.as_str()));
                    match direction {
                        Direction::Ascending => ordering == Ordering::Greater,
                        Direction::Descending => ordering == Ordering::Less,
                    }
                });
            }
        }

        if let Some(limit) = query.limit {
            snapshots.truncate(limit);
        }

        Ok(snapshots)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut collections = self.collections.lock().expect("store lock poisoned");

        // Stage against a copy so a failing op leaves nothing applied.
        let mut staged = collections.clone();
        for op in batch.into_ops() {
            apply_op(&mut staged, op)?;
        }
        *collections = staged;
        Ok(())
    }
}
