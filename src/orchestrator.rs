use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::audio::ChunkSplitter;
use crate::captions::{ProgressEvent, ProgressSink};
use crate::transcription::{Transcriber, TranscriptionResult};
use crate::{CaptionError, Result};

/// Transcribes long media chunk by chunk and stitches the results onto one
/// timeline.
///
/// Chunks are processed strictly in order. Each chunk's timestamps are shifted
/// by the summed duration of the chunks before it, so chunk boundaries do not
/// need to line up with `chunk_seconds`. If splitting fails or produces at most
/// one chunk, the whole file is transcribed in a single call instead.
///
/// A failing chunk aborts the run; no partial transcription is returned.
pub struct ChunkedTranscriber {
    transcriber: Arc<dyn Transcriber>,
    splitter: Arc<dyn ChunkSplitter>,
    chunk_seconds: u32,
    /// Parent of the per-run chunk directory; the system temp dir when unset
    work_root: Option<PathBuf>,
}

impl ChunkedTranscriber {
    pub fn new(transcriber: Arc<dyn Transcriber>, splitter: Arc<dyn ChunkSplitter>, chunk_seconds: u32) -> Self {
        Self {
            transcriber,
            splitter,
            chunk_seconds: chunk_seconds.max(1),
            work_root: None,
        }
    }

    /// Create chunk directories under `work_root`
    pub fn with_work_root(mut self, work_root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(work_root.into());
        self
    }

    pub fn chunk_seconds(&self) -> u32 {
        self.chunk_seconds
    }

    /// Transcribe `media_path`, reporting chunk progress to `progress`
    pub async fn transcribe(&self, media_path: &Path, progress: &dyn ProgressSink) -> Result<TranscriptionResult> {
        let start_time = Instant::now();

        let mut builder = tempfile::Builder::new();
        builder.prefix("autocaptions_");
        let work_dir = match &self.work_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };

        // Keep the work dir alive until every chunk is transcribed
        let (_work_dir, chunks) = match work_dir {
            Ok(work_dir) => {
                let chunks = match self
                    .splitter
                    .split(media_path, self.chunk_seconds, work_dir.path())
                    .await
                {
                    Ok(chunks) => chunks,
                    Err(e) => {
                        warn!("Chunk splitting unavailable, transcribing whole file: {}", e);
                        Vec::new()
                    }
                };
                (Some(work_dir), chunks)
            }
            Err(e) => {
                warn!("Could not create chunk work directory, transcribing whole file: {}", e);
                (None, Vec::new())
            }
        };

        if chunks.len() <= 1 {
            info!("🎤 Transcribing {} in a single pass", media_path.display());
            return self.transcriber.transcribe(media_path).await;
        }

        let total_chunks = chunks.len();
        info!(
            "🎤 Transcribing {} in {} chunks of up to {}s",
            media_path.display(),
            total_chunks,
            self.chunk_seconds
        );

        let mut segments = Vec::new();
        let mut cumulative = 0.0;

        for (i, chunk) in chunks.iter().enumerate() {
            let mut chunk_result = self.transcriber.transcribe(&chunk.path).await.map_err(|e| {
                CaptionError::Transcription(format!(
                    "chunk {}/{} ({}) failed: {}",
                    i + 1,
                    total_chunks,
                    chunk.path.display(),
                    e
                ))
            })?;

            chunk_result.offset_by(cumulative);
            segments.append(&mut chunk_result.segments);

            progress.report(ProgressEvent::Chunk {
                current: i + 1,
                total: total_chunks,
            });

            cumulative += chunk.duration.as_secs_f64();
        }

        info!(
            "✅ Stitched {} segments covering {:.1}s of audio in {:.1}s",
            segments.len(),
            cumulative,
            start_time.elapsed().as_secs_f64()
        );

        Ok(TranscriptionResult::new(segments))
    }
}
