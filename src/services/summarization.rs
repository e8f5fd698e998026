use crate::settings::AppSettings;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Summarization collaborator: transcript in, raw completion text out. The
/// caller runs extraction over the result; output format compliance is not
/// guaranteed by the service.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str) -> Result<String>;
}

const SYSTEM_PROMPT: &str = "You are an AI assistant that creates meeting summaries and extracts action items from meeting transcripts.";

/// The prompt pins the response format the extraction cascade expects: a
/// `Summary:` line followed by a `Tasks:` section with dash-prefixed lines.
fn build_user_prompt(transcript: &str) -> String {
    format!(
        "Please analyze this meeting transcript and provide: \n\
         1. A concise summary of the key points discussed (begin with \"Summary:\")\n\
         2. A list of action items or tasks mentioned in the meeting (begin with \"Tasks:\")\n\
         \n\
         Format your response exactly like this:\n\
         Summary: [your summary here]\n\
         \n\
         Tasks:\n\
         - [task 1]\n\
         - [task 2]\n\
         - [task 3]\n\
         \n\
         Transcript: {}",
        transcript
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String, // "system" or "user"
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct ChatCompletionSummarizer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatCompletionSummarizer {
    pub fn new(settings: &AppSettings, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: settings.llm_api_url.clone(),
            api_key,
            model: settings.llm_model.clone(),
            temperature: settings.llm_temperature,
        }
    }
}

#[async_trait]
impl Summarizer for ChatCompletionSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_user_prompt(transcript),
                },
            ],
            temperature: self.temperature,
        };

        log::info!(
            "Requesting summary for {} char transcript from {}",
            transcript.chars().count(),
            self.model
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to send completion request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Completion API error {}: {}", status, error_text));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse completion response: {}", e))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("No choices in completion response"))
    }
}
