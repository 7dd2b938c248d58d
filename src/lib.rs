pub mod config;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod summarize;
pub mod transcribe;
pub mod translate;

pub use config::{Config, ModelRole, ModelSpec};
pub use error::{KosumError, Result};
pub use pipeline::{
    summarize_audio, summarize_audio_with_cancel, PipelineConfig, PipelineResult, PipelineStats,
    StageOutputs,
};
