use crate::settings::AppSettings;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

/// Speech-to-text collaborator: audio bytes in, transcript out.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct TranscriptionRequest {
    inputs: String,
    model: String,
    parameters: TranscriptionParameters,
}

#[derive(Debug, Serialize)]
struct TranscriptionParameters {
    /// Timestamp tokens are required for long-form audio support.
    return_timestamps: bool,
    chunk_length_s: u32,
    stride_length_s: u32,
}

/// The inference API returns either an array of recognized chunks (long
/// audio) or a single object with the full text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranscriptionResponse {
    Chunks(Vec<TranscriptionChunk>),
    Single { text: String },
}

#[derive(Debug, Deserialize)]
struct TranscriptionChunk {
    text: String,
}

fn collect_transcript(response: TranscriptionResponse) -> String {
    match response {
        TranscriptionResponse::Chunks(chunks) => chunks
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        TranscriptionResponse::Single { text } => text,
    }
}

/// Whisper client against a hosted inference API. Audio is shipped as a
/// base64 JSON payload; chunked responses are concatenated into one
/// transcript.
pub struct HttpSpeechToText {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    chunk_length_s: u32,
    stride_length_s: u32,
}

impl HttpSpeechToText {
    pub fn new(settings: &AppSettings, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: settings.stt_api_url.clone(),
            api_key,
            model: settings.stt_model.clone(),
            chunk_length_s: settings.stt_chunk_length_s,
            stride_length_s: settings.stt_stride_length_s,
        }
    }
}

#[async_trait]
impl SpeechToText for HttpSpeechToText {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        log::info!("Transcribing {} bytes of audio", audio.len());

        let request = TranscriptionRequest {
            inputs: BASE64.encode(audio),
            model: self.model.clone(),
            parameters: TranscriptionParameters {
                return_timestamps: true,
                chunk_length_s: self.chunk_length_s,
                stride_length_s: self.stride_length_s,
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to send transcription request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Transcription API error {}: {}", status, error_text));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse transcription response: {}", e))?;

        Ok(collect_transcript(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunked_response_joined_with_spaces() {
        let parsed: TranscriptionResponse =
            serde_json::from_str(r#"[{"text": "hello"}, {"text": "world"}]"#).unwrap();
        assert_eq!(collect_transcript(parsed), "hello world");
    }

    #[test]
    fn test_single_response_used_verbatim() {
        let parsed: TranscriptionResponse =
            serde_json::from_str(r#"{"text": "full transcript"}"#).unwrap();
        assert_eq!(collect_transcript(parsed), "full transcript");
    }

    #[test]
    fn test_response_without_text_is_an_error() {
        let parsed: Result<TranscriptionResponse, _> = serde_json::from_str(r#"{"error": "busy"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let request = TranscriptionRequest {
            inputs: BASE64.encode(b"abc"),
            model: "openai/whisper-large-v3".to_string(),
            parameters: TranscriptionParameters {
                return_timestamps: true,
                chunk_length_s: 30,
                stride_length_s: 5,
            },
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["inputs"], "YWJj");
        assert_eq!(body["parameters"]["chunk_length_s"], 30);
        assert_eq!(body["parameters"]["return_timestamps"], true);
    }
}
