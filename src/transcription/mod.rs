pub mod srt;
pub mod types;
pub mod whisper;

use async_trait::async_trait;
use std::path::Path;

use crate::Result;

pub use srt::{format_timestamp, parse_timestamp, SrtCue, SrtDocument};
pub use types::{Segment, TranscriptionResult, Word};
pub use whisper::WhisperTranscriber;

/// Speech-to-text capability: transcribe one audio or video file with
/// word-level timestamps where the backend supports them.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, media_path: &Path) -> Result<TranscriptionResult>;
}
