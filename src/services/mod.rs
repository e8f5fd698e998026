pub mod speech_to_text;
pub mod summarization;

pub use speech_to_text::{HttpSpeechToText, SpeechToText};
pub use summarization::{ChatCompletionSummarizer, Summarizer};
