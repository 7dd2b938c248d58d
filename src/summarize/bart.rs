use crate::error::{KosumError, Result};
use crate::inference::{InferenceClient, ModelRef};
use crate::summarize::{Summarizer, SummaryLength};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// Abstractive summarizer for BART-family models (distilbart, kobart).
/// Decoding is greedy.
pub struct BartSummarizer {
    client: InferenceClient,
    model: ModelRef,
    length: SummaryLength,
}

impl BartSummarizer {
    pub fn new(client: InferenceClient, model: ModelRef, length: SummaryLength) -> Self {
        Self {
            client,
            model,
            length,
        }
    }

    fn parameters(&self) -> Value {
        json!({
            "min_length": self.length.min_length,
            "max_length": self.length.max_length,
            "do_sample": false,
        })
    }
}

#[derive(Deserialize, Debug)]
struct SummaryOutput {
    summary_text: String,
}

#[async_trait]
impl Summarizer for BartSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        debug!(
            "Summarizing {} chars with {} ({}..{} tokens)",
            text.chars().count(),
            self.model,
            self.length.min_length,
            self.length.max_length
        );

        let inputs = Value::String(text.to_string());
        let response: Vec<SummaryOutput> = self
            .client
            .infer(&self.model, &inputs, &self.parameters())
            .await?;

        response
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .ok_or_else(|| KosumError::EmptyResponse(self.model.to_string()))
    }

    fn name(&self) -> String {
        self.model.to_string()
    }
}
