use thiserror::Error;

#[derive(Error, Debug)]
pub enum KosumError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Inference failed for {model}: {message}")]
    Inference { model: String, message: String },

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Pipeline cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, KosumError>;
