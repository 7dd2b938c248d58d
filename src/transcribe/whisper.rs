use crate::error::Result;
use crate::inference::{InferenceClient, ModelRef};
use crate::transcribe::{Transcriber, Transcript, TranscriptChunk};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Whisper speech recognition served by an inference endpoint.
pub struct WhisperTranscriber {
    client: InferenceClient,
    model: ModelRef,
    language: String,
    chunk_length_s: u32,
}

impl WhisperTranscriber {
    pub fn new(client: InferenceClient, model: ModelRef) -> Self {
        Self {
            client,
            model,
            language: "ko".to_string(),
            chunk_length_s: 30,
        }
    }

    /// Set the spoken language (ISO 639-1 code) passed to generation.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the window length for long-form audio, in seconds.
    pub fn with_chunk_length(mut self, seconds: u32) -> Self {
        self.chunk_length_s = seconds;
        self
    }

    fn parameters(&self) -> Value {
        json!({
            "return_timestamps": true,
            "chunk_length_s": self.chunk_length_s,
            "generate_kwargs": { "language": self.language },
        })
    }

    fn parse_response(response: AsrResponse) -> Transcript {
        let chunks = response
            .chunks
            .unwrap_or_default()
            .into_iter()
            .map(|c| TranscriptChunk {
                text: c.text,
                start: c.timestamp.0.unwrap_or(0.0),
                end: c.timestamp.1,
            })
            .collect();

        Transcript {
            chunks,
            text: response.text,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Transcript> {
        let audio_bytes = fs::read(audio).await?;
        debug!(
            "Transcribing {} ({} bytes) with {}",
            audio.display(),
            audio_bytes.len(),
            self.model
        );

        let inputs = Value::String(base64::engine::general_purpose::STANDARD.encode(&audio_bytes));
        let response: AsrResponse = self
            .client
            .infer(&self.model, &inputs, &self.parameters())
            .await?;

        let transcript = Self::parse_response(response);
        debug!("{} returned {} chunks", self.model, transcript.chunks.len());

        Ok(transcript)
    }

    fn name(&self) -> String {
        self.model.to_string()
    }
}

// API response types

#[derive(Debug, Deserialize)]
struct AsrResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    chunks: Option<Vec<AsrChunk>>,
}

#[derive(Debug, Deserialize)]
struct AsrChunk {
    text: String,
    /// `[start, end]`; the final chunk may have an open end.
    #[serde(default)]
    timestamp: (Option<f64>, Option<f64>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_with_chunks() {
        let response: AsrResponse = serde_json::from_str(
            r#"{
                "text": " 안녕하세요. 오늘 회의를 시작하겠습니다.",
                "chunks": [
                    {"timestamp": [0.0, 2.5], "text": " 안녕하세요."},
                    {"timestamp": [2.5, null], "text": " 오늘 회의를 시작하겠습니다."}
                ]
            }"#,
        )
        .unwrap();

        let transcript = WhisperTranscriber::parse_response(response);
        assert_eq!(transcript.chunks.len(), 2);
        assert_eq!(transcript.chunks[1].start, 2.5);
        assert_eq!(transcript.chunks[1].end, None);
        assert_eq!(
            transcript.full_text(),
            " 안녕하세요. 오늘 회의를 시작하겠습니다."
        );
    }

    #[test]
    fn test_parse_response_without_chunks() {
        let response: AsrResponse = serde_json::from_str(r#"{"text": "네."}"#).unwrap();
        let transcript = WhisperTranscriber::parse_response(response);
        assert!(transcript.chunks.is_empty());
        assert_eq!(transcript.full_text(), "네.");
    }

    #[test]
    fn test_parameters() {
        let config = crate::config::Config::default();
        let client = InferenceClient::new(&config, crate::inference::Device::Cpu).unwrap();
        let transcriber = WhisperTranscriber::new(
            client,
            ModelRef::Remote("openai/whisper-small".to_string()),
        )
        .with_language("ko")
        .with_chunk_length(20);

        let params = transcriber.parameters();
        assert_eq!(params["return_timestamps"], true);
        assert_eq!(params["chunk_length_s"], 20);
        assert_eq!(params["generate_kwargs"]["language"], "ko");
        assert_eq!(transcriber.name(), "openai/whisper-small");
    }
}
