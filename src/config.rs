use crate::error::{KosumError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Hosted inference API used when a model has no local copy.
pub const DEFAULT_REMOTE_ENDPOINT: &str = "https://api-inference.huggingface.co";

/// Self-hosted inference server that serves the local model directories.
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://127.0.0.1:8080";

/// The four model slots of the summarization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelRole {
    Asr,
    TranslateKoEn,
    SummarizeEn,
    SummarizeKo,
}

impl ModelRole {
    pub const ALL: [ModelRole; 4] = [
        ModelRole::Asr,
        ModelRole::TranslateKoEn,
        ModelRole::SummarizeEn,
        ModelRole::SummarizeKo,
    ];

    /// Directory name of the model under the models directory.
    pub fn local_dir_name(&self) -> &'static str {
        match self {
            ModelRole::Asr => "whisper-small",
            ModelRole::TranslateKoEn => "opus-mt-ko-en",
            ModelRole::SummarizeEn => "distilbart-cnn-12-6",
            ModelRole::SummarizeKo => "kobart-summary-v3",
        }
    }

    /// Hub identifier used when no local copy exists.
    pub fn remote_id(&self) -> &'static str {
        match self {
            ModelRole::Asr => "openai/whisper-small",
            ModelRole::TranslateKoEn => "Helsinki-NLP/opus-mt-ko-en",
            ModelRole::SummarizeEn => "sshleifer/distilbart-cnn-12-6",
            ModelRole::SummarizeKo => "EbanLee/kobart-summary-v3",
        }
    }

    pub fn default_spec(&self, models_dir: &Path) -> ModelSpec {
        ModelSpec {
            local: models_dir.join(self.local_dir_name()),
            remote: self.remote_id().to_string(),
        }
    }
}

impl std::fmt::Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelRole::Asr => write!(f, "asr"),
            ModelRole::TranslateKoEn => write!(f, "translate-ko-en"),
            ModelRole::SummarizeEn => write!(f, "summarize-en"),
            ModelRole::SummarizeKo => write!(f, "summarize-ko"),
        }
    }
}

impl std::str::FromStr for ModelRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "asr" => Ok(ModelRole::Asr),
            "translate-ko-en" => Ok(ModelRole::TranslateKoEn),
            "summarize-en" => Ok(ModelRole::SummarizeEn),
            "summarize-ko" => Ok(ModelRole::SummarizeKo),
            _ => Err(format!(
                "Unknown model role: {}. Use 'asr', 'translate-ko-en', 'summarize-en' or 'summarize-ko'",
                s
            )),
        }
    }
}

/// Where to look for a model: a local directory first, then a hub identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub local: PathBuf,
    pub remote: String,
}

/// Per-role overrides from the config file. Unset roles use the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOverrides {
    pub asr: Option<ModelSpec>,
    pub translate_ko_en: Option<ModelSpec>,
    pub summarize_en: Option<ModelSpec>,
    pub summarize_ko: Option<ModelSpec>,
}

impl ModelOverrides {
    fn get(&self, role: ModelRole) -> Option<&ModelSpec> {
        match role {
            ModelRole::Asr => self.asr.as_ref(),
            ModelRole::TranslateKoEn => self.translate_ko_en.as_ref(),
            ModelRole::SummarizeEn => self.summarize_en.as_ref(),
            ModelRole::SummarizeKo => self.summarize_ko.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hf_token: Option<String>,
    pub remote_endpoint: String,
    pub local_endpoint: String,
    /// `auto`, `cpu`, `cuda` or `cuda:N`.
    pub device: String,
    pub language: String,
    pub chunk_length_s: u32,
    pub timeout_secs: u64,
    pub models_dir: PathBuf,
    pub models: ModelOverrides,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hf_token: None,
            remote_endpoint: DEFAULT_REMOTE_ENDPOINT.to_string(),
            local_endpoint: DEFAULT_LOCAL_ENDPOINT.to_string(),
            device: "auto".to_string(),
            language: "ko".to_string(),
            chunk_length_s: 30,
            timeout_secs: 600,
            models_dir: PathBuf::from("./models"),
            models: ModelOverrides::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                config = Self::from_toml_str(&contents)?;
            }
        }

        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str::<Config>(contents)?)
    }

    /// Override settings from environment variables, looked up through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("HF_TOKEN").or_else(|| lookup("HUGGING_FACE_HUB_TOKEN")) {
            if !token.is_empty() {
                self.hf_token = Some(token);
            }
        }
        if let Some(endpoint) = lookup("KOSUM_REMOTE_ENDPOINT") {
            self.remote_endpoint = endpoint;
        }
        if let Some(endpoint) = lookup("KOSUM_LOCAL_ENDPOINT") {
            self.local_endpoint = endpoint;
        }
        if let Some(device) = lookup("KOSUM_DEVICE") {
            self.device = device;
        }
        if let Some(dir) = lookup("KOSUM_MODELS_DIR") {
            self.models_dir = PathBuf::from(dir);
        }
    }

    /// Model lookup for a role: the config file override, else the default
    /// rooted at `models_dir`.
    pub fn model(&self, role: ModelRole) -> ModelSpec {
        self.models
            .get(role)
            .cloned()
            .unwrap_or_else(|| role.default_spec(&self.models_dir))
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_length_s == 0 {
            return Err(KosumError::Config(
                "chunk_length_s must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(KosumError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.language.trim().is_empty() {
            return Err(KosumError::Config("language must not be empty".to_string()));
        }

        for (name, endpoint) in [
            ("remote_endpoint", &self.remote_endpoint),
            ("local_endpoint", &self.local_endpoint),
        ] {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(KosumError::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, endpoint
                )));
            }
        }

        crate::inference::Device::from_preference(&self.device)?;

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("kosum").join("config.toml"))
    }
}
