use crate::config::Config;
use crate::error::{KosumError, Result};
use crate::inference::{Device, ModelRef};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Longest response prefix written to the debug log.
const LOG_BODY_CHARS: usize = 500;

/// HTTP client for a Hugging Face style inference endpoint.
///
/// Remote models are posted to `{remote_endpoint}/models/{id}`. Local model
/// directories are posted to `{local_endpoint}/models/{dir_name}`, together
/// with the selected device.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: reqwest::Client,
    remote_endpoint: String,
    local_endpoint: String,
    token: Option<String>,
    device: Device,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    parameters: &'a Value,
    options: RequestOptions,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
    use_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<i64>,
}

impl InferenceClient {
    pub fn new(config: &Config, device: Device) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            remote_endpoint: config.remote_endpoint.trim_end_matches('/').to_string(),
            local_endpoint: config.local_endpoint.trim_end_matches('/').to_string(),
            token: config.hf_token.clone(),
            device,
        })
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn model_url(&self, model: &ModelRef) -> String {
        let base = if model.is_local() {
            &self.local_endpoint
        } else {
            &self.remote_endpoint
        };
        format!("{}/models/{}", base, model.endpoint_name())
    }

    /// Run one inference call and decode the JSON response.
    pub async fn infer<T: DeserializeOwned>(
        &self,
        model: &ModelRef,
        inputs: &Value,
        parameters: &Value,
    ) -> Result<T> {
        let url = self.model_url(model);
        let request = InferenceRequest {
            inputs,
            parameters,
            options: RequestOptions {
                wait_for_model: true,
                use_cache: false,
                device: model.is_local().then(|| self.device.pipeline_index()),
            },
        };

        debug!("POST {}", url);

        let mut builder = self.client.post(&url).json(&request);
        if !model.is_local() {
            if let Some(ref token) = self.token {
                builder = builder.bearer_auth(token);
            }
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(
            "{} responded {}: {}",
            model,
            status,
            body.chars().take(LOG_BODY_CHARS).collect::<String>()
        );

        if !status.is_success() {
            return Err(KosumError::Inference {
                model: model.to_string(),
                message: error_message(status, &body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Pull the server's `error` field out of a failed response, if it sent one.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| match v.get("error") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        });

    match detail {
        Some(detail) => format!("{} ({})", detail, status),
        None => format!("HTTP {}: {}", status, body.trim()),
    }
}
