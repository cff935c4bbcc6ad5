//! AutoCaptions - Rust Implementation
//!
//! Turns timestamped speech transcription into caption-friendly SRT subtitles.
//! Long media is split into fixed-size audio chunks, transcribed one chunk at a
//! time and stitched back onto a single timeline before cues are emitted.

pub mod audio;
pub mod captions;
pub mod config;
pub mod orchestrator;
pub mod pipeline;
pub mod transcription;

// Re-export main types for easy access
pub use crate::audio::{AudioChunk, ChunkSplitter, FfmpegSplitter};
pub use crate::captions::{
    emit_cues, group_words, wrap_text, CaptionLine, EmittedCaptions, NoProgress, ProgressEvent,
    ProgressSink, StdoutProgress,
};
pub use crate::config::{CaptionConfig, CaptionMode, ConfigBuilder};
pub use crate::orchestrator::ChunkedTranscriber;
pub use crate::pipeline::{CaptionJob, CaptionOutput};
pub use crate::transcription::{
    Segment, SrtCue, SrtDocument, Transcriber, TranscriptionResult, WhisperTranscriber, Word,
};

/// Result type for caption operations
pub type Result<T> = std::result::Result<T, CaptionError>;

/// Error types for caption operations
#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio splitting failed: {0}")]
    Split(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Whisper error: {0}")]
    Whisper(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("WAV error: {0}")]
    Audio(#[from] hound::Error),
}
