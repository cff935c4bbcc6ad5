use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use autocaptions::{CaptionConfig, CaptionJob, CaptionMode, StdoutProgress};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{:#}", e);
        println!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let matches = Command::new("AutoCaptions")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate SRT subtitles from the speech in a video file")
        .arg(
            Arg::new("input")
                .value_name("MEDIA")
                .help("Video or audio file to caption")
                .required(true),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("Cue layout: one cue per segment (normal) or short reflowed lines (line) [default: line]")
                .value_parser(["normal", "line"]),
        )
        .arg(
            Arg::new("max-chars")
                .long("max-chars")
                .value_name("NUM")
                .help("Maximum characters per caption line")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("chunk-seconds")
                .long("chunk-seconds")
                .value_name("SECS")
                .help("Length of audio chunks sent to the transcriber")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("padding")
                .long("padding")
                .value_name("SECS")
                .help("Seconds added to the end of each line-mode cue")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("NAME")
                .help("Whisper model name (tiny, base, small, medium, large)"),
        )
        .arg(
            Arg::new("language")
                .short('l')
                .long("language")
                .value_name("LANG")
                .help("Language hint for transcription"),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Output directory for the SRT file"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .help("Do not print PROGRESS lines on stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    // Initialize logging; stdout is reserved for progress lines
    let default_filter = if matches.get_flag("verbose") {
        "autocaptions=debug,warn"
    } else {
        "autocaptions=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    // The CLI defaults to line mode; config file and environment may override it
    let cli_defaults = CaptionConfig {
        mode: CaptionMode::Line,
        ..CaptionConfig::default()
    };
    let mut config = CaptionConfig::load_over(config_path.as_deref(), cli_defaults)
        .context("Failed to load configuration")?;

    if let Some(mode) = matches.get_one::<String>("mode") {
        config.mode = mode.parse::<CaptionMode>()?;
    }
    if let Some(max_chars) = matches.get_one::<usize>("max-chars") {
        config.max_chars = *max_chars;
    }
    if let Some(chunk_seconds) = matches.get_one::<u32>("chunk-seconds") {
        config.chunk_seconds = *chunk_seconds;
    }
    if let Some(padding) = matches.get_one::<f64>("padding") {
        config.padding_seconds = *padding;
    }
    if let Some(model) = matches.get_one::<String>("model") {
        config.model = model.clone();
    }
    if let Some(language) = matches.get_one::<String>("language") {
        config.language = Some(language.clone());
    }
    if let Some(output_dir) = matches.get_one::<String>("output-dir") {
        config.output_dir = PathBuf::from(output_dir);
    }
    config.validate()?;

    let input = PathBuf::from(
        matches
            .get_one::<String>("input")
            .context("missing input file")?,
    );
    if !input.is_file() {
        anyhow::bail!("File not found: {}", input.display());
    }

    info!("🚀 AutoCaptions starting...");
    for line in config.summary().lines() {
        info!("{}", line);
    }

    let mut job = CaptionJob::new(config);
    if !matches.get_flag("no-progress") {
        job = job.with_progress(Arc::new(StdoutProgress));
    }

    let output = job
        .run(&input)
        .await
        .with_context(|| format!("Captioning {} failed", input.display()))?;

    info!(
        "🎉 Wrote {} cues in {:.2}s",
        output.cues.len(),
        output.processing_time.as_secs_f64()
    );
    println!("SRT file saved to: {}", output.srt_path.display());

    Ok(())
}
