use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::audio::{ChunkSplitter, FfmpegSplitter};
use crate::captions::{emit_cues, NoProgress, ProgressSink};
use crate::config::CaptionConfig;
use crate::orchestrator::ChunkedTranscriber;
use crate::transcription::{SrtCue, SrtDocument, Transcriber, WhisperTranscriber};
use crate::{CaptionError, Result};

/// Result of captioning one media file
#[derive(Debug, Clone)]
pub struct CaptionOutput {
    pub srt_path: PathBuf,
    pub cues: Vec<SrtCue>,
    pub processing_time: Duration,
}

/// Media file to SRT file, end to end
pub struct CaptionJob {
    config: CaptionConfig,
    transcriber: Arc<dyn Transcriber>,
    splitter: Arc<dyn ChunkSplitter>,
    progress: Arc<dyn ProgressSink>,
}

impl CaptionJob {
    /// Job using the local Whisper and ffmpeg executables
    pub fn new(config: CaptionConfig) -> Self {
        let transcriber = Arc::new(WhisperTranscriber::new(&config));
        Self::with_collaborators(config, transcriber, Arc::new(FfmpegSplitter::new()))
    }

    /// Job with explicit transcription and splitting capabilities
    pub fn with_collaborators(
        config: CaptionConfig,
        transcriber: Arc<dyn Transcriber>,
        splitter: Arc<dyn ChunkSplitter>,
    ) -> Self {
        Self {
            config,
            transcriber,
            splitter,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &CaptionConfig {
        &self.config
    }

    /// Where the SRT for `media_path` is written
    pub fn srt_path_for(&self, media_path: &Path) -> Result<PathBuf> {
        let stem = media_path
            .file_stem()
            .ok_or_else(|| CaptionError::Config(format!("Invalid media filename: {}", media_path.display())))?;
        Ok(self
            .config
            .output_dir
            .join(format!("{}.srt", stem.to_string_lossy())))
    }

    /// Transcribe `media_path` and write `<output_dir>/<stem>.srt`
    pub async fn run(&self, media_path: &Path) -> Result<CaptionOutput> {
        let start_time = Instant::now();
        self.config.validate()?;

        if !tokio::fs::try_exists(media_path).await? {
            return Err(CaptionError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", media_path.display()),
            )));
        }
        let srt_path = self.srt_path_for(media_path)?;

        info!("Transcribing {} ... this may take a while", media_path.display());

        let chunked = ChunkedTranscriber::new(
            self.transcriber.clone(),
            self.splitter.clone(),
            self.config.chunk_seconds,
        );
        let result = chunked.transcribe(media_path, self.progress.as_ref()).await?;

        let captions = emit_cues(
            &result,
            self.config.mode,
            self.config.max_chars,
            self.config.padding_seconds,
            self.progress.as_ref(),
        );

        let document = SrtDocument::from(captions.cues);
        let issues = document.validate();
        if !issues.is_empty() {
            warn!("SRT validation issues: {:?}", issues);
        }

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        tokio::fs::write(&srt_path, &captions.srt).await?;

        info!("SRT file saved to: {}", srt_path.display());
        info!(
            "💾 {} cues from {} segments ({} mode)",
            document.len(),
            result.len(),
            self.config.mode
        );

        Ok(CaptionOutput {
            srt_path,
            cues: document.into_cues(),
            processing_time: start_time.elapsed(),
        })
    }
}
