pub mod bart;

pub use bart::BartSummarizer;

use crate::error::Result;
use async_trait::async_trait;

/// Token bounds for generated summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryLength {
    pub min_length: u32,
    pub max_length: u32,
}

impl SummaryLength {
    /// Short English abstract (distilbart-cnn).
    pub fn english() -> Self {
        Self {
            min_length: 15,
            max_length: 60,
        }
    }

    /// Longer Korean summary (kobart).
    pub fn korean() -> Self {
        Self {
            min_length: 12,
            max_length: 300,
        }
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
    fn name(&self) -> String;
}
