use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppSettings {
    #[serde(default = "default_stt_api_url")]
    pub stt_api_url: String,
    #[serde(default = "default_stt_model")]
    pub stt_model: String,
    #[serde(default = "default_stt_chunk_length_s")]
    pub stt_chunk_length_s: u32,
    #[serde(default = "default_stt_stride_length_s")]
    pub stt_stride_length_s: u32,
    #[serde(default = "default_llm_api_url")]
    pub llm_api_url: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_llm_temperature")]
    pub llm_temperature: f32,
    #[serde(default = "default_meetings_page_size")]
    pub meetings_page_size: usize,
    #[serde(default = "default_tasks_page_size")]
    pub tasks_page_size: usize,
}

fn default_stt_api_url() -> String {
    "https://api-inference.huggingface.co/models/openai/whisper-large-v3".to_string()
}

fn default_stt_model() -> String {
    "openai/whisper-large-v3".to_string()
}

fn default_stt_chunk_length_s() -> u32 {
    30
}

fn default_stt_stride_length_s() -> u32 {
    5
}

fn default_llm_api_url() -> String {
    "https://api.studio.nebius.ai/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "meta-llama/Llama-3.3-70B-Instruct-fast".to_string()
}

fn default_llm_temperature() -> f32 {
    0.7
}

fn default_meetings_page_size() -> usize {
    10
}

fn default_tasks_page_size() -> usize {
    20
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            stt_api_url: default_stt_api_url(),
            stt_model: default_stt_model(),
            stt_chunk_length_s: default_stt_chunk_length_s(),
            stt_stride_length_s: default_stt_stride_length_s(),
            llm_api_url: default_llm_api_url(),
            llm_model: default_llm_model(),
            llm_temperature: default_llm_temperature(),
            meetings_page_size: default_meetings_page_size(),
            tasks_page_size: default_tasks_page_size(),
        }
    }
}

impl AppSettings {
    /// Load settings from a JSON file. A missing file yields defaults;
    /// missing fields in an existing file get their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse settings file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("failed to write settings file: {}", path.display()))?;
        log::info!("Saved settings to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = AppSettings::load(&temp_dir.path().join("settings.json")).unwrap();
        assert_eq!(settings.meetings_page_size, 10);
        assert_eq!(settings.stt_model, "openai/whisper-large-v3");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut settings = AppSettings::default();
        settings.llm_model = "some-other-model".to_string();
        settings.save(&path).unwrap();

        let loaded = AppSettings::load(&path).unwrap();
        assert_eq!(loaded.llm_model, "some-other-model");
        assert_eq!(loaded.llm_temperature, 0.7);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, r#"{"tasks_page_size": 50}"#).unwrap();

        let loaded = AppSettings::load(&path).unwrap();
        assert_eq!(loaded.tasks_page_size, 50);
        assert_eq!(loaded.meetings_page_size, 10);
    }
}
