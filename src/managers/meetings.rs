use crate::extraction;
use crate::managers::tasks::{Task, TaskList};
use crate::services::{SpeechToText, Summarizer};
use crate::session::UserSession;
use crate::settings::AppSettings;
use crate::store::{
    from_fields, to_fields, CollectionPath, Direction, DocumentStore, Query, WriteBatch,
};
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// A recorded or uploaded meeting. Created once at ingestion, never mutated,
/// deleted as a unit with its summary and tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    /// Document id; not a stored field.
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub date: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(skip)]
    pub id: String,
    pub content: String,
    pub created_at: String,
}

/// Where the transcript for an ingestion comes from: pasted/uploaded text,
/// or recorded audio that still needs transcription.
pub enum TranscriptSource {
    Text(String),
    Audio(Vec<u8>),
}

/// Resume point for meeting pagination: the last meeting of the previous
/// page. Carrying the id as well as the date keeps pagination exact when
/// several meetings share a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingCursor {
    pub date: String,
    pub id: String,
}

/// One page of a user's meetings, newest first.
#[derive(Debug)]
pub struct MeetingPage {
    pub meetings: Vec<Meeting>,
    /// Cursor for the next page; `None` once everything is loaded.
    pub next_cursor: Option<MeetingCursor>,
    pub all_loaded: bool,
}

/// Expanded view of one meeting: its summary (the store permits multiple
/// summary documents, only the first is read) and its task list.
pub struct MeetingDetails {
    pub summary: Option<Summary>,
    pub tasks: TaskList,
}

/// Coordinates ingestion and lifecycle of meetings: transcript resolution,
/// summarization, extraction, and persistence.
pub struct MeetingManager {
    store: Arc<dyn DocumentStore>,
    speech_to_text: Arc<dyn SpeechToText>,
    summarizer: Arc<dyn Summarizer>,
    settings: AppSettings,
}

impl MeetingManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        speech_to_text: Arc<dyn SpeechToText>,
        summarizer: Arc<dyn Summarizer>,
        settings: AppSettings,
    ) -> Self {
        Self {
            store,
            speech_to_text,
            summarizer,
            settings,
        }
    }

    /// Ingest one meeting: resolve the transcript, summarize it, extract the
    /// summary and task list, and persist the meeting with its children in a
    /// single atomic batch. Any failure propagates as one error with nothing
    /// committed; nothing is retried internally.
    pub async fn ingest(
        &self,
        session: &UserSession,
        title: &str,
        source: TranscriptSource,
    ) -> Result<Meeting> {
        let transcript = match source {
            TranscriptSource::Text(text) => text,
            TranscriptSource::Audio(audio) => self
                .speech_to_text
                .transcribe(&audio)
                .await
                .context("speech-to-text failed")?,
        };
        if transcript.trim().is_empty() {
            bail!("transcript is empty, nothing to ingest");
        }

        let completion = self
            .summarizer
            .summarize(&transcript)
            .await
            .context("summarization failed")?;
        let extracted = extraction::extract(&completion);
        log::info!(
            "Extracted {} char summary and {} tasks for \"{}\"",
            extracted.summary.chars().count(),
            extracted.tasks.len(),
            title
        );

        let now = Utc::now().to_rfc3339();
        let meeting = Meeting {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            user_id: session.user_id.clone(),
            date: now.clone(),
            created_at: now.clone(),
        };

        let mut batch = WriteBatch::new();
        batch.set(
            CollectionPath::Meetings,
            meeting.id.clone(),
            to_fields(&meeting)?,
        );

        let summary = Summary {
            id: Uuid::new_v4().to_string(),
            content: extracted.summary,
            created_at: now.clone(),
        };
        batch.set(
            CollectionPath::Summaries {
                meeting_id: meeting.id.clone(),
            },
            summary.id.clone(),
            to_fields(&summary)?,
        );

        for (rank, description) in extracted.tasks.iter().enumerate() {
            let task = Task::new(description.clone(), rank as i64, now.clone());
            batch.set(
                CollectionPath::Tasks {
                    meeting_id: meeting.id.clone(),
                },
                Uuid::new_v4().to_string(),
                to_fields(&task)?,
            );
        }

        self.store
            .commit(batch)
            .await
            .context("failed to persist meeting")?;

        log::info!("Ingested meeting {} ({})", meeting.id, meeting.title);
        Ok(meeting)
    }

    /// Default title for the next ingestion: "Meeting N" where N counts the
    /// user's existing meetings plus one.
    pub async fn next_meeting_title(&self, session: &UserSession) -> Result<String> {
        let existing = self
            .store
            .query(
                &CollectionPath::Meetings,
                Query::new().filter("userId", json!(session.user_id)),
            )
            .await
            .context("failed to count meetings")?;
        Ok(format!("Meeting {}", existing.len() + 1))
    }

    pub async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting> {
        let fields = self
            .store
            .get(&CollectionPath::Meetings, meeting_id)
            .await
            .context("failed to load meeting")?
            .ok_or_else(|| anyhow!("meeting not found: {}", meeting_id))?;
        let mut meeting: Meeting = from_fields(fields)
            .with_context(|| format!("malformed meeting document {}", meeting_id))?;
        meeting.id = meeting_id.to_string();
        Ok(meeting)
    }

    /// One page of the user's meetings, newest first. Pass the previous
    /// page's `next_cursor` to continue.
    pub async fn list_meetings(
        &self,
        session: &UserSession,
        cursor: Option<MeetingCursor>,
    ) -> Result<MeetingPage> {
        let mut query = Query::new()
            .filter("userId", json!(session.user_id))
            .order_by("date", Direction::Descending)
            .limit(self.settings.meetings_page_size);
        if let Some(cursor) = cursor {
            query = query.start_after(json!(cursor.date), cursor.id);
        }

        let snapshots = self
            .store
            .query(&CollectionPath::Meetings, query)
            .await
            .context("failed to load meetings")?;

        let all_loaded = snapshots.len() < self.settings.meetings_page_size;
        let mut meetings = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            let mut meeting: Meeting = from_fields(snapshot.fields)
                .with_context(|| format!("malformed meeting document {}", snapshot.id))?;
            meeting.id = snapshot.id;
            meetings.push(meeting);
        }

        let next_cursor = if all_loaded {
            None
        } else {
            meetings.last().map(|meeting| MeetingCursor {
                date: meeting.date.clone(),
                id: meeting.id.clone(),
            })
        };

        Ok(MeetingPage {
            meetings,
            next_cursor,
            all_loaded,
        })
    }

    /// Load the expanded view of one meeting: its first summary (if any) and
    /// its ordered task list.
    pub async fn load_details(&self, meeting_id: &str) -> Result<MeetingDetails> {
        let summaries = self
            .store
            .query(
                &CollectionPath::Summaries {
                    meeting_id: meeting_id.to_string(),
                },
                Query::new().limit(1),
            )
            .await
            .context("failed to load summary")?;

        let summary = match summaries.into_iter().next() {
            Some(snapshot) => {
                let mut summary: Summary = from_fields(snapshot.fields)
                    .with_context(|| format!("malformed summary document {}", snapshot.id))?;
                summary.id = snapshot.id;
                Some(summary)
            }
            None => None,
        };

        let tasks = TaskList::load(
            self.store.clone(),
            meeting_id,
            self.settings.tasks_page_size,
        )
        .await?;

        Ok(MeetingDetails { summary, tasks })
    }

    /// Delete a meeting and all of its summary and task children in one
    /// atomic batch, so an interrupted delete never leaves orphans.
    pub async fn delete_meeting(&self, meeting_id: &str) -> Result<()> {
        let summaries_path = CollectionPath::Summaries {
            meeting_id: meeting_id.to_string(),
        };
        let tasks_path = CollectionPath::Tasks {
            meeting_id: meeting_id.to_string(),
        };

        let mut batch = WriteBatch::new();
        for snapshot in self
            .store
            .query(&summaries_path, Query::new())
            .await
            .context("failed to list summaries for delete")?
        {
            batch.delete(summaries_path.clone(), snapshot.id);
        }
        for snapshot in self
            .store
            .query(&tasks_path, Query::new())
            .await
            .context("failed to list tasks for delete")?
        {
            batch.delete(tasks_path.clone(), snapshot.id);
        }
        batch.delete(CollectionPath::Meetings, meeting_id.to_string());

        self.store
            .commit(batch)
            .await
            .context("failed to delete meeting")?;
        log::info!("Deleted meeting {} and its children", meeting_id);
        Ok(())
    }
}
