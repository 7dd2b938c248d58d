//! Korean to English translation with a MarianMT (OPUS-MT) model.

use crate::error::{KosumError, Result};
use crate::inference::{InferenceClient, ModelRef};
use crate::translate::Translator;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub struct OpusTranslator {
    client: InferenceClient,
    model: ModelRef,
}

impl OpusTranslator {
    pub fn new(client: InferenceClient, model: ModelRef) -> Self {
        Self { client, model }
    }

    fn first_translation(&self, response: Vec<TranslationOutput>) -> Result<String> {
        response
            .into_iter()
            .next()
            .map(|o| o.translation_text)
            .ok_or_else(|| KosumError::EmptyResponse(self.model.to_string()))
    }
}

#[derive(Deserialize, Debug)]
struct TranslationOutput {
    translation_text: String,
}

#[async_trait]
impl Translator for OpusTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        debug!("Translating {} chars with {}", text.chars().count(), self.model);

        let inputs = Value::String(text.to_string());
        let response: Vec<TranslationOutput> =
            self.client.infer(&self.model, &inputs, &Value::Null).await?;

        self.first_translation(response)
    }

    fn name(&self) -> String {
        self.model.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::inference::Device;

    fn translator() -> OpusTranslator {
        let client = InferenceClient::new(&Config::default(), Device::Cpu).unwrap();
        OpusTranslator::new(
            client,
            ModelRef::Remote("Helsinki-NLP/opus-mt-ko-en".to_string()),
        )
    }

    #[test]
    fn test_first_translation() {
        let response: Vec<TranslationOutput> = serde_json::from_str(
            r#"[{"translation_text": "Hello."}, {"translation_text": "Ignored."}]"#,
        )
        .unwrap();
        assert_eq!(translator().first_translation(response).unwrap(), "Hello.");
    }

    #[test]
    fn test_empty_response_is_an_error() {
        let err = translator().first_translation(vec![]).unwrap_err();
        assert!(matches!(err, KosumError::EmptyResponse(_)));
    }

    #[test]
    fn test_name() {
        assert_eq!(translator().name(), "Helsinki-NLP/opus-mt-ko-en");
    }
}
