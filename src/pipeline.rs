use crate::config::{Config, ModelRole};
use crate::error::{KosumError, Result};
use crate::inference::{resolve_model, Device, InferenceClient, ModelRef};
use crate::summarize::{BartSummarizer, Summarizer, SummaryLength};
use crate::transcribe::{Transcriber, WhisperTranscriber};
use crate::translate::{OpusTranslator, Translator};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Extension appended to the audio file name for the default output.
pub const OUTPUT_EXTENSION: &str = "out";

/// Configuration for a single pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Show a spinner per stage.
    pub show_progress: bool,
    /// Print every intermediate text to stdout once the run completes.
    pub echo_stages: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            echo_stages: true,
        }
    }
}

/// The six inference stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcribe,
    EarlyTranslation,
    SummarizeEn,
    SummarizeKo,
    LateTranslation,
    FinalSummary,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Transcribe,
        Stage::EarlyTranslation,
        Stage::SummarizeEn,
        Stage::SummarizeKo,
        Stage::LateTranslation,
        Stage::FinalSummary,
    ];

    /// Label used when echoing the stage output.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Transcribe => "[Transcript KO]",
            Stage::EarlyTranslation => "[Early Translation EN]",
            Stage::SummarizeEn => "[Summary EN]",
            Stage::SummarizeKo => "[Summary KO]",
            Stage::LateTranslation => "[Late Translation EN]",
            Stage::FinalSummary => "[Final Merged EN Summary]",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Stage::Transcribe => "Transcribing Korean audio",
            Stage::EarlyTranslation => "Translating transcript to English",
            Stage::SummarizeEn => "Summarizing English translation",
            Stage::SummarizeKo => "Summarizing Korean transcript",
            Stage::LateTranslation => "Translating Korean summary to English",
            Stage::FinalSummary => "Merging summaries",
        }
    }

    fn number(&self) -> usize {
        Stage::ALL.iter().position(|s| s == self).unwrap_or(0) + 1
    }
}

/// Every intermediate text produced by a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutputs {
    pub ko_transcript: String,
    pub en_early: String,
    pub en_summary: String,
    pub ko_summary: String,
    pub en_late: String,
    pub final_summary: String,
}

impl StageOutputs {
    pub fn get(&self, stage: Stage) -> &str {
        match stage {
            Stage::Transcribe => &self.ko_transcript,
            Stage::EarlyTranslation => &self.en_early,
            Stage::SummarizeEn => &self.en_summary,
            Stage::SummarizeKo => &self.ko_summary,
            Stage::LateTranslation => &self.en_late,
            Stage::FinalSummary => &self.final_summary,
        }
    }
}

/// Input of the final summarization: both English summaries, space separated.
pub fn merge_summaries(en_summary: &str, en_late: &str) -> String {
    format!("{} {}", en_summary, en_late)
}

/// The models a run talks to, behind their traits.
pub struct StageModels {
    pub transcriber: Box<dyn Transcriber>,
    pub translator: Box<dyn Translator>,
    pub summarizer_en: Box<dyn Summarizer>,
    pub summarizer_ko: Box<dyn Summarizer>,
}

impl StageModels {
    /// Build endpoint-backed models from already resolved references.
    pub fn from_resolved(
        config: &Config,
        client: &InferenceClient,
        resolved: &ResolvedModels,
    ) -> Self {
        Self {
            transcriber: Box::new(
                WhisperTranscriber::new(client.clone(), resolved.get(ModelRole::Asr).clone())
                    .with_language(config.language.clone())
                    .with_chunk_length(config.chunk_length_s),
            ),
            translator: Box::new(OpusTranslator::new(
                client.clone(),
                resolved.get(ModelRole::TranslateKoEn).clone(),
            )),
            summarizer_en: Box::new(BartSummarizer::new(
                client.clone(),
                resolved.get(ModelRole::SummarizeEn).clone(),
                SummaryLength::english(),
            )),
            summarizer_ko: Box::new(BartSummarizer::new(
                client.clone(),
                resolved.get(ModelRole::SummarizeKo).clone(),
                SummaryLength::korean(),
            )),
        }
    }
}

/// Model reference chosen for each role.
#[derive(Debug, Clone)]
pub struct ResolvedModels {
    pub asr: ModelRef,
    pub translate_ko_en: ModelRef,
    pub summarize_en: ModelRef,
    pub summarize_ko: ModelRef,
}

impl ResolvedModels {
    pub fn resolve(config: &Config) -> Self {
        let resolve = |role: ModelRole| {
            let spec = config.model(role);
            let model = resolve_model(&spec.local, &spec.remote);
            debug!("Resolved {} to {}", role, model);
            model
        };

        Self {
            asr: resolve(ModelRole::Asr),
            translate_ko_en: resolve(ModelRole::TranslateKoEn),
            summarize_en: resolve(ModelRole::SummarizeEn),
            summarize_ko: resolve(ModelRole::SummarizeKo),
        }
    }

    pub fn get(&self, role: ModelRole) -> &ModelRef {
        match role {
            ModelRole::Asr => &self.asr,
            ModelRole::TranslateKoEn => &self.translate_ko_en,
            ModelRole::SummarizeEn => &self.summarize_en,
            ModelRole::SummarizeKo => &self.summarize_ko,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelRole, &ModelRef)> {
        ModelRole::ALL.into_iter().map(move |role| (role, self.get(role)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
}

/// Statistics from a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub total_time: Duration,
    pub stage_times: Vec<StageTiming>,
    pub device: Device,
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct PipelineResult {
    pub output_path: PathBuf,
    pub outputs: StageOutputs,
    pub models: ResolvedModels,
    pub stats: PipelineStats,
}

/// `<cwd>/<audio file name>.out`, keeping the audio extension.
pub fn default_output_path(audio: &Path, cwd: &Path) -> PathBuf {
    let mut name = audio
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    cwd.join(name)
}

/// The explicit output path, or the default next to the working directory.
pub fn resolve_output_path(audio: &Path, explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(default_output_path(audio, &std::env::current_dir()?)),
    }
}

/// Write the summary as UTF-8 followed by a newline.
pub fn write_summary(path: &Path, summary: &str) -> Result<()> {
    fs::write(path, format!("{}\n", summary))?;
    Ok(())
}

/// Summarize a Korean audio file into English.
///
/// This is the main entry point. It:
/// 1. Checks the audio file exists, before any model is touched
/// 2. Selects the compute device and resolves the four models
/// 3. Runs the six inference stages one after another
/// 4. Writes the final merged summary to the output file
pub async fn summarize_audio(
    audio: &Path,
    output: Option<&Path>,
    config: &Config,
    pipeline_config: PipelineConfig,
) -> Result<PipelineResult> {
    let cancelled = Arc::new(AtomicBool::new(false));
    summarize_audio_with_cancel(audio, output, config, pipeline_config, cancelled).await
}

/// Summarize with cancellation support. The flag is checked between stages.
pub async fn summarize_audio_with_cancel(
    audio: &Path,
    output: Option<&Path>,
    config: &Config,
    pipeline_config: PipelineConfig,
    cancelled: Arc<AtomicBool>,
) -> Result<PipelineResult> {
    let start_time = Instant::now();

    if !audio.is_file() {
        return Err(KosumError::FileNotFound(audio.display().to_string()));
    }

    let output_path = resolve_output_path(audio, output)?;

    let device = Device::select(&config.device)?;
    info!("Device: {}", device);

    let client = InferenceClient::new(config, device)?;
    let resolved = ResolvedModels::resolve(config);
    for (role, model) in resolved.iter() {
        info!("Model {:<16} {}", role.to_string(), model);
    }
    let models = StageModels::from_resolved(config, &client, &resolved);

    let multi_progress = if pipeline_config.show_progress {
        Some(MultiProgress::new())
    } else {
        None
    };

    let (outputs, stage_times) =
        run_stages(&models, audio, &cancelled, multi_progress.as_ref()).await?;

    if pipeline_config.echo_stages {
        print_stage_outputs(&outputs);
    }

    write_summary(&output_path, &outputs.final_summary)?;
    info!("Wrote summary to {:?}", output_path);

    Ok(PipelineResult {
        output_path,
        outputs,
        models: resolved,
        stats: PipelineStats {
            total_time: start_time.elapsed(),
            stage_times,
            device,
        },
    })
}

/// Tracks spinners, timings and cancellation across stages.
struct StageRunner<'a> {
    progress: Option<&'a MultiProgress>,
    cancelled: &'a AtomicBool,
    timings: Vec<StageTiming>,
}

impl<'a> StageRunner<'a> {
    fn begin(&self, stage: Stage) -> Result<(Instant, Option<ProgressBar>)> {
        if self.cancelled.load(Ordering::Relaxed) {
            warn!("Cancelled before {}", stage.description().to_lowercase());
            return Err(KosumError::Cancelled);
        }

        info!(
            "Stage {}/{}: {}",
            stage.number(),
            Stage::ALL.len(),
            stage.description()
        );

        let pb = self.progress.map(|mp| {
            let pb = mp.add(ProgressBar::new_spinner());
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message(format!("{}...", stage.description()));
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        Ok((Instant::now(), pb))
    }

    fn finish(&mut self, stage: Stage, started: Instant, pb: Option<ProgressBar>, output: &str) {
        let elapsed = started.elapsed();

        if let Some(pb) = pb {
            pb.finish_with_message(format!(
                "✓ {} ({:.1}s)",
                stage.description(),
                elapsed.as_secs_f64()
            ));
        }

        if output.trim().is_empty() {
            warn!("{} produced empty text", stage.description());
        }

        debug!("{} {}", stage.label(), output);
        info!(
            "{} done: {} chars in {:.2}s",
            stage.description(),
            output.chars().count(),
            elapsed.as_secs_f64()
        );

        self.timings.push(StageTiming { stage, elapsed });
    }
}

/// Run the stage chain. Each stage consumes the full text of its
/// predecessor; the final summary merges both English summaries.
pub async fn run_stages(
    models: &StageModels,
    audio: &Path,
    cancelled: &AtomicBool,
    progress: Option<&MultiProgress>,
) -> Result<(StageOutputs, Vec<StageTiming>)> {
    let mut runner = StageRunner {
        progress,
        cancelled,
        timings: Vec::with_capacity(Stage::ALL.len()),
    };

    let (started, pb) = runner.begin(Stage::Transcribe)?;
    let ko_transcript = models.transcriber.transcribe(audio).await?.full_text();
    runner.finish(Stage::Transcribe, started, pb, &ko_transcript);

    let (started, pb) = runner.begin(Stage::EarlyTranslation)?;
    let en_early = models.translator.translate(&ko_transcript).await?;
    runner.finish(Stage::EarlyTranslation, started, pb, &en_early);

    let (started, pb) = runner.begin(Stage::SummarizeEn)?;
    let en_summary = models.summarizer_en.summarize(&en_early).await?;
    runner.finish(Stage::SummarizeEn, started, pb, &en_summary);

    let (started, pb) = runner.begin(Stage::SummarizeKo)?;
    let ko_summary = models.summarizer_ko.summarize(&ko_transcript).await?;
    runner.finish(Stage::SummarizeKo, started, pb, &ko_summary);

    let (started, pb) = runner.begin(Stage::LateTranslation)?;
    let en_late = models.translator.translate(&ko_summary).await?;
    runner.finish(Stage::LateTranslation, started, pb, &en_late);

    let (started, pb) = runner.begin(Stage::FinalSummary)?;
    let final_summary = models
        .summarizer_en
        .summarize(&merge_summaries(&en_summary, &en_late))
        .await?;
    runner.finish(Stage::FinalSummary, started, pb, &final_summary);

    let outputs = StageOutputs {
        ko_transcript,
        en_early,
        en_summary,
        ko_summary,
        en_late,
        final_summary,
    };

    Ok((outputs, runner.timings))
}

/// Print every stage output with its label.
pub fn print_stage_outputs(outputs: &StageOutputs) {
    for stage in Stage::ALL {
        println!("{} {}", stage.label(), outputs.get(stage));
    }
}

/// Print a summary of the pipeline results.
pub fn print_summary(result: &PipelineResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                        Summary Complete                       ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Output:     {}", result.output_path.display());
    println!("  Device:     {}", result.stats.device);
    println!();
    println!("  Models:");
    for (role, model) in result.models.iter() {
        println!("    {:<16} {}", role.to_string(), model);
    }
    println!();
    println!("  Timing:");
    for timing in &result.stats.stage_times {
        println!(
            "    {:<40} {:.2}s",
            timing.stage.description(),
            timing.elapsed.as_secs_f64()
        );
    }
    println!(
        "    {:<40} {:.2}s",
        "Total",
        result.stats.total_time.as_secs_f64()
    );
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert!(config.show_progress);
        assert!(config.echo_stages);
    }

    #[test]
    fn test_default_output_path_keeps_extension() {
        let output = default_output_path(Path::new("/data/calls/meeting.wav"), Path::new("/work"));
        assert_eq!(output, PathBuf::from("/work/meeting.wav.out"));
    }

    #[test]
    fn test_default_output_path_relative_input() {
        let output = default_output_path(Path::new("recordings/인터뷰.m4a"), Path::new("/tmp/run"));
        assert_eq!(output, PathBuf::from("/tmp/run/인터뷰.m4a.out"));
    }

    #[test]
    fn test_resolve_output_path_honors_explicit() {
        let explicit = Path::new("/tmp/summary.txt");
        let output = resolve_output_path(Path::new("a.wav"), Some(explicit)).unwrap();
        assert_eq!(output, explicit);
    }

    #[test]
    fn test_resolve_output_path_defaults_to_cwd() {
        let output = resolve_output_path(Path::new("/data/a.wav"), None).unwrap();
        assert_eq!(output, std::env::current_dir().unwrap().join("a.wav.out"));
    }

    #[test]
    fn test_write_summary_appends_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav.out");

        write_summary(&path, "The team agreed on the launch date.").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "The team agreed on the launch date.\n"
        );
    }

    #[test]
    fn test_merge_summaries() {
        assert_eq!(
            merge_summaries("Budget was approved.", "Hiring starts in May."),
            "Budget was approved. Hiring starts in May."
        );
    }

    #[test]
    fn test_stage_order_and_labels() {
        assert_eq!(Stage::ALL[0], Stage::Transcribe);
        assert_eq!(Stage::ALL[5], Stage::FinalSummary);
        assert_eq!(Stage::FinalSummary.number(), 6);
        assert_eq!(Stage::SummarizeKo.label(), "[Summary KO]");
    }

    #[test]
    fn test_resolved_models_use_remote_without_local_copies() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.models_dir = dir.path().to_path_buf();

        let resolved = ResolvedModels::resolve(&config);
        for role in ModelRole::ALL {
            assert_eq!(
                resolved.get(role),
                &ModelRef::Remote(role.remote_id().to_string())
            );
        }
    }

    #[test]
    fn test_resolved_models_mix_local_and_remote() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("opus-mt-ko-en")).unwrap();
        let mut config = Config::default();
        config.models_dir = dir.path().to_path_buf();

        let resolved = ResolvedModels::resolve(&config);
        assert_eq!(
            resolved.get(ModelRole::TranslateKoEn),
            &ModelRef::Local(dir.path().join("opus-mt-ko-en"))
        );
        assert!(!resolved.get(ModelRole::Asr).is_local());
    }
}
