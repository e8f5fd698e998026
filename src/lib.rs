//! Core of a meeting assistant: transcript ingestion through external
//! speech-to-text and summarization services, heuristic extraction of the
//! summary and task list from model output, and an ordered task list
//! persisted in a cloud document store.

pub mod extraction;
pub mod managers;
pub mod services;
pub mod session;
pub mod settings;
pub mod store;

pub use extraction::{extract, Extraction};
pub use managers::meetings::{
    Meeting, MeetingCursor, MeetingDetails, MeetingManager, MeetingPage, Summary, TranscriptSource,
};
pub use managers::tasks::{Task, TaskList};
pub use services::{ChatCompletionSummarizer, HttpSpeechToText, SpeechToText, Summarizer};
pub use session::UserSession;
pub use settings::AppSettings;
pub use store::{memory::MemoryStore, DocumentStore};
