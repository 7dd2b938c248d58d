use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use kosum::config::Config;
use kosum::pipeline::{print_summary, summarize_audio_with_cancel, PipelineConfig};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "kosum")]
#[command(version, about = "Summarize Korean audio in English")]
#[command(long_about = "Transcribe a Korean audio file, translate and summarize it in both \
languages, and write a merged English summary.")]
struct Cli {
    /// Korean audio file to summarize
    audio_path: PathBuf,

    /// Where to write the summary (defaults to <cwd>/<audio file name>.out)
    summary_out_path: Option<PathBuf>,

    /// Hide per-stage spinners
    #[arg(long)]
    no_progress: bool,

    /// Do not print the intermediate texts
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Parse arguments; usage errors exit with status 1.
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_cli();

    init_logging(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupted, stopping after the current stage");
            cancelled.store(true, Ordering::Relaxed);
        })
        .context("Failed to install Ctrl+C handler")?;
    }

    info!("Input:    {}", cli.audio_path.display());
    if let Some(ref output) = cli.summary_out_path {
        info!("Output:   {}", output.display());
    }
    info!("Language: {}", config.language);

    let pipeline_config = PipelineConfig {
        show_progress: !cli.no_progress,
        echo_stages: !cli.quiet,
    };

    let result = summarize_audio_with_cancel(
        &cli.audio_path,
        cli.summary_out_path.as_deref(),
        &config,
        pipeline_config,
        cancelled,
    )
    .await
    .with_context(|| format!("Failed to summarize {}", cli.audio_path.display()))?;

    if !cli.quiet {
        print_summary(&result);
    }

    Ok(())
}
