use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{CaptionError, Result};

/// One fixed-duration slice of the source audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioChunk {
    pub path: PathBuf,
    /// Actual length of this chunk; the last chunk is usually shorter
    pub duration: Duration,
}

impl AudioChunk {
    pub fn new(path: impl Into<PathBuf>, duration: Duration) -> Self {
        Self {
            path: path.into(),
            duration,
        }
    }
}

/// Chunk-splitting capability: cut media into mono 16kHz audio chunks of at
/// most `chunk_seconds`, in chronological order, each starting at time zero.
#[async_trait]
pub trait ChunkSplitter: Send + Sync {
    async fn split(&self, media_path: &Path, chunk_seconds: u32, work_dir: &Path) -> Result<Vec<AudioChunk>>;
}

/// Splits media with ffmpeg's segment muxer
#[derive(Debug, Clone)]
pub struct FfmpegSplitter {
    /// ffmpeg executable
    pub ffmpeg: PathBuf,
    /// Sample rate for transcription (Whisper optimal)
    pub target_sample_rate: u32,
}

impl FfmpegSplitter {
    pub fn new() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            target_sample_rate: 16000, // 16kHz optimal for Whisper
        }
    }

    pub fn with_ffmpeg(mut self, ffmpeg: impl Into<PathBuf>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self
    }

    /// Check whether the ffmpeg executable runs
    pub async fn is_available(&self) -> bool {
        tokio::process::Command::new(&self.ffmpeg)
            .arg("-version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn segment_args(&self, media_path: &Path, chunk_seconds: u32, work_dir: &Path) -> Vec<String> {
        let pattern = work_dir.join("seg%05d.wav");
        vec![
            "-y".to_string(),
            "-i".to_string(),
            media_path.to_string_lossy().into_owned(),
            "-vn".to_string(), // No video stream
            "-ac".to_string(),
            "1".to_string(), // Mono channel
            "-ar".to_string(),
            self.target_sample_rate.to_string(),
            "-f".to_string(),
            "segment".to_string(),
            "-segment_time".to_string(),
            chunk_seconds.to_string(),
            "-reset_timestamps".to_string(),
            "1".to_string(),
            pattern.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for FfmpegSplitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChunkSplitter for FfmpegSplitter {
    async fn split(&self, media_path: &Path, chunk_seconds: u32, work_dir: &Path) -> Result<Vec<AudioChunk>> {
        info!(
            "✂️ Splitting {} into {}s chunks",
            media_path.display(),
            chunk_seconds
        );

        tokio::fs::create_dir_all(work_dir).await?;

        let output = tokio::process::Command::new(&self.ffmpeg)
            .args(self.segment_args(media_path, chunk_seconds, work_dir))
            .output()
            .await
            .map_err(|e| CaptionError::Split(format!("failed to run {}: {}", self.ffmpeg.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
            return Err(CaptionError::Split(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            )));
        }

        let fallback = Duration::from_secs(u64::from(chunk_seconds));
        let chunks: Vec<AudioChunk> = list_chunk_files(work_dir)
            .into_iter()
            .map(|path| {
                let duration = match wav_duration(&path) {
                    Ok(duration) => duration,
                    Err(e) => {
                        warn!(
                            "Could not read duration of {}, assuming {}s: {}",
                            path.display(),
                            chunk_seconds,
                            e
                        );
                        fallback
                    }
                };
                AudioChunk::new(path, duration)
            })
            .collect();

        info!("✅ Created {} audio chunks", chunks.len());
        Ok(chunks)
    }
}

/// `seg*.wav` files directly inside `dir`, sorted by name
pub fn list_chunk_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            name.starts_with("seg") && name.ends_with(".wav")
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Duration of a WAV file from its header
pub fn wav_duration(path: &Path) -> Result<Duration> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(CaptionError::Split(format!("{} has a zero sample rate", path.display())));
    }

    let seconds = f64::from(reader.duration()) / f64::from(spec.sample_rate);
    debug!("{}: {:.3}s at {}Hz", path.display(), seconds, spec.sample_rate);
    Ok(Duration::from_secs_f64(seconds))
}
