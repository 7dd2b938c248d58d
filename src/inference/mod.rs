pub mod client;
pub mod device;

pub use client::InferenceClient;
pub use device::Device;

use std::path::{Path, PathBuf};

/// A model as the inference endpoint will see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRef {
    /// A directory of weights on this machine, served by the local endpoint.
    Local(PathBuf),
    /// A hub identifier such as `openai/whisper-small`.
    Remote(String),
}

impl ModelRef {
    pub fn is_local(&self) -> bool {
        matches!(self, ModelRef::Local(_))
    }

    /// Name used in the endpoint URL: the directory name for local models,
    /// the hub identifier otherwise.
    pub fn endpoint_name(&self) -> String {
        match self {
            ModelRef::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            ModelRef::Remote(id) => id.clone(),
        }
    }
}

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelRef::Local(path) => write!(f, "{} (local)", path.display()),
            ModelRef::Remote(id) => write!(f, "{}", id),
        }
    }
}

/// Prefer the local copy when it exists, else fall back to the hub identifier.
pub fn resolve_model(local: &Path, remote: &str) -> ModelRef {
    if local.exists() {
        ModelRef::Local(local.to_path_buf())
    } else {
        ModelRef::Remote(remote.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_existing_local_dir() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("whisper-small");
        std::fs::create_dir(&local).unwrap();

        let model = resolve_model(&local, "openai/whisper-small");
        assert_eq!(model, ModelRef::Local(local));
        assert!(model.is_local());
    }

    #[test]
    fn test_resolve_falls_back_to_remote() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("whisper-small");

        let model = resolve_model(&local, "openai/whisper-small");
        assert_eq!(model, ModelRef::Remote("openai/whisper-small".to_string()));
        assert!(!model.is_local());
    }

    #[test]
    fn test_endpoint_name() {
        let local = ModelRef::Local(PathBuf::from("./models/opus-mt-ko-en"));
        assert_eq!(local.endpoint_name(), "opus-mt-ko-en");

        let remote = ModelRef::Remote("Helsinki-NLP/opus-mt-ko-en".to_string());
        assert_eq!(remote.endpoint_name(), "Helsinki-NLP/opus-mt-ko-en");
    }
}
