pub mod whisper;

pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// A piece of recognized speech with its position in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptChunk {
    pub text: String,
    pub start: f64,
    pub end: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub chunks: Vec<TranscriptChunk>,
    /// Whole-utterance text as returned by the recognizer.
    pub text: String,
}

impl Transcript {
    /// Chunk texts joined without a separator; Whisper chunks carry their own
    /// leading whitespace. Falls back to `text` when there are no chunks.
    pub fn full_text(&self) -> String {
        if self.chunks.is_empty() {
            return self.text.clone();
        }
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<Transcript>;
    fn name(&self) -> String;
}
