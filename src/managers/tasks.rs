use crate::store::{
    from_fields, to_fields, CollectionPath, Direction, DocumentStore, Fields, Query, WriteBatch,
};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// A single action item belonging to one meeting. `rank` alone defines the
/// display order (ascending); `created_at` is a pure creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Document id; not a stored field.
    #[serde(skip)]
    pub id: String,
    pub description: String,
    pub completed: bool,
    pub rank: i64,
    pub created_at: String,
}

impl Task {
    pub(crate) fn new(description: String, rank: i64, created_at: String) -> Self {
        Self {
            id: String::new(),
            description,
            completed: false,
            rank,
            created_at,
        }
    }
}

/// Ordered task list for one meeting, kept consistent between an in-memory
/// view and the backing store.
///
/// Every mutation persists first and mirrors into the in-memory list only
/// after the store confirms, so a failed write leaves local state untouched.
/// The one exception is reordering, which swaps optimistically and reloads
/// the list from the store if the commit is rejected.
pub struct TaskList {
    store: Arc<dyn DocumentStore>,
    meeting_id: String,
    page_size: usize,
    tasks: Vec<Task>,
}

impl TaskList {
    /// Load the task list for a meeting, ordered by rank.
    pub async fn load(
        store: Arc<dyn DocumentStore>,
        meeting_id: impl Into<String>,
        page_size: usize,
    ) -> Result<Self> {
        let mut list = Self {
            store,
            meeting_id: meeting_id.into(),
            page_size,
            tasks: Vec::new(),
        };
        list.reload().await?;
        Ok(list)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn meeting_id(&self) -> &str {
        &self.meeting_id
    }

    fn path(&self) -> CollectionPath {
        CollectionPath::Tasks {
            meeting_id: self.meeting_id.clone(),
        }
    }

    fn index_of(&self, task_id: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == task_id)
            .ok_or_else(|| anyhow!("unknown task: {}", task_id))
    }

    /// One past the highest persisted rank for this meeting. Asking the
    /// store (not the loaded page) keeps ranks unique even when the meeting
    /// has more tasks than the page limit.
    async fn next_rank(&self) -> Result<i64> {
        let highest = self
            .store
            .query(
                &self.path(),
                Query::new()
                    .order_by("rank", Direction::Descending)
                    .limit(1),
            )
            .await
            .context("failed to determine next task rank")?;
        Ok(highest
            .first()
            .and_then(|snapshot| snapshot.fields.get("rank"))
            .and_then(Value::as_i64)
            .map_or(0, |rank| rank + 1))
    }

    /// Discard local state and re-read the list from the store.
    pub async fn reload(&mut self) -> Result<()> {
        let snapshots = self
            .store
            .query(
                &self.path(),
                Query::new()
                    .order_by("rank", Direction::Ascending)
                    .limit(self.page_size),
            )
            .await
            .context("failed to load tasks")?;

        let mut tasks = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            let mut task: Task = from_fields(snapshot.fields)
                .with_context(|| format!("malformed task document {}", snapshot.id))?;
            task.id = snapshot.id;
            tasks.push(task);
        }
        self.tasks = tasks;
        Ok(())
    }

    /// Append a new task. Input that trims to empty is a validation no-op
    /// and returns `Ok(None)`.
    pub async fn add(&mut self, description: &str) -> Result<Option<&Task>> {
        let description = description.trim();
        if description.is_empty() {
            return Ok(None);
        }

        let rank = self.next_rank().await?;
        let mut task = Task::new(description.to_string(), rank, Utc::now().to_rfc3339());

        let id = self
            .store
            .insert(&self.path(), to_fields(&task)?)
            .await
            .context("failed to persist new task")?;
        task.id = id;

        log::info!("Added task {} to meeting {}", task.id, self.meeting_id);
        self.tasks.push(task);
        Ok(self.tasks.last())
    }

    pub async fn set_completed(&mut self, task_id: &str, completed: bool) -> Result<()> {
        let index = self.index_of(task_id)?;

        let mut fields = Fields::new();
        fields.insert("completed".to_string(), json!(completed));
        self.store
            .update(&self.path(), task_id, fields)
            .await
            .context("failed to persist task completion")?;

        self.tasks[index].completed = completed;
        Ok(())
    }

    /// Replace a task's description. Input that trims to empty is a
    /// validation no-op and returns `Ok(false)`.
    pub async fn edit(&mut self, task_id: &str, description: &str) -> Result<bool> {
        let description = description.trim();
        if description.is_empty() {
            return Ok(false);
        }
        let index = self.index_of(task_id)?;

        let mut fields = Fields::new();
        fields.insert("description".to_string(), json!(description));
        self.store
            .update(&self.path(), task_id, fields)
            .await
            .context("failed to persist task edit")?;

        self.tasks[index].description = description.to_string();
        Ok(true)
    }

    pub async fn remove(&mut self, task_id: &str) -> Result<()> {
        let index = self.index_of(task_id)?;
        self.store
            .delete(&self.path(), task_id)
            .await
            .context("failed to delete task")?;
        self.tasks.remove(index);
        Ok(())
    }

    /// Move a task one position toward the front. Returns `Ok(false)` if it
    /// is already first.
    pub async fn move_up(&mut self, task_id: &str) -> Result<bool> {
        let index = self.index_of(task_id)?;
        if index == 0 {
            return Ok(false);
        }
        self.swap_positions(index, index - 1).await?;
        Ok(true)
    }

    /// Move a task one position toward the back. Returns `Ok(false)` if it
    /// is already last.
    pub async fn move_down(&mut self, task_id: &str) -> Result<bool> {
        let index = self.index_of(task_id)?;
        if index + 1 >= self.tasks.len() {
            return Ok(false);
        }
        self.swap_positions(index, index + 1).await?;
        Ok(true)
    }

    /// Swap two adjacent tasks optimistically, then persist both new ranks in
    /// one atomic batch; only the two affected records are written. A
    /// rejected commit rolls the local list back by reloading from the store
    /// and propagates the error.
    async fn swap_positions(&mut self, index: usize, neighbor: usize) -> Result<()> {
        let rank_a = self.tasks[index].rank;
        let rank_b = self.tasks[neighbor].rank;
        self.tasks[index].rank = rank_b;
        self.tasks[neighbor].rank = rank_a;
        self.tasks.swap(index, neighbor);

        let mut batch = WriteBatch::new();
        for i in [index, neighbor] {
            let mut fields = Fields::new();
            fields.insert("rank".to_string(), json!(self.tasks[i].rank));
            batch.update(self.path(), self.tasks[i].id.clone(), fields);
        }

        if let Err(err) = self.store.commit(batch).await {
            log::error!(
                "Reorder of task in meeting {} was rejected, reloading list: {}",
                self.meeting_id,
                err
            );
            self.reload()
                .await
                .context("failed to reload tasks after rejected reorder")?;
            return Err(err).context("failed to persist task reorder");
        }
        Ok(())
    }
}
