use tracing::{debug, warn};

use super::lines::{group_words, CaptionLine};
use super::progress::{ProgressEvent, ProgressSink};
use super::wrap::wrap_text;
use crate::config::CaptionMode;
use crate::transcription::{Segment, SrtCue, SrtDocument, TranscriptionResult};

/// Smallest cue duration, used when an end time collapses onto its start
pub const MIN_CUE_DURATION: f64 = 0.001;

/// Emitted cues together with their SRT rendering
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedCaptions {
    pub cues: Vec<SrtCue>,
    pub srt: String,
}

/// Caption segmentation settings
#[derive(Debug, Clone, Copy)]
struct CueLayout {
    mode: CaptionMode,
    max_chars: usize,
    padding: f64,
}

impl CueLayout {
    /// Lines a segment is displayed as, with timing already padded where it applies
    fn segment_lines(&self, segment: &Segment) -> Vec<CaptionLine> {
        match self.mode {
            CaptionMode::Normal => vec![CaptionLine {
                text: segment.text.trim().to_string(),
                start: segment.start,
                end: segment.end,
            }],
            CaptionMode::Line => {
                let word_lines = group_words(&segment.words, self.max_chars);
                if word_lines.is_empty() {
                    self.distributed_lines(segment)
                } else {
                    word_lines
                        .into_iter()
                        .map(|line| CaptionLine {
                            start: line.start.or(segment.start),
                            end: line.end.or(segment.end).map(|end| end + self.padding),
                            text: line.text,
                        })
                        .collect()
                }
            }
        }
    }

    /// Wrap the plain segment text and spread the segment's duration evenly
    /// over the resulting lines.
    fn distributed_lines(&self, segment: &Segment) -> Vec<CaptionLine> {
        let text_lines = wrap_text(&segment.text, self.max_chars);
        let n = text_lines.len().max(1) as f64;

        match (segment.start, segment.duration()) {
            (Some(start), Some(duration)) if duration > 0.0 => text_lines
                .into_iter()
                .enumerate()
                .map(|(i, text)| CaptionLine {
                    text,
                    start: Some(start + duration * i as f64 / n),
                    end: Some(start + duration * (i + 1) as f64 / n + self.padding),
                })
                .collect(),
            _ => {
                if !text_lines.is_empty() {
                    debug!(
                        "Segment has no usable duration, collapsing {} lines onto its start",
                        text_lines.len()
                    );
                }
                let start = segment.start.unwrap_or(0.0);
                text_lines
                    .into_iter()
                    .map(|text| CaptionLine {
                        text,
                        start: Some(start),
                        end: Some(start),
                    })
                    .collect()
            }
        }
    }

    /// Number of cues a segment is planned to produce
    fn planned_cues(&self, segment: &Segment) -> usize {
        match self.mode {
            CaptionMode::Normal => 1,
            CaptionMode::Line => {
                let word_lines = group_words(&segment.words, self.max_chars).len();
                if word_lines > 0 {
                    word_lines
                } else {
                    wrap_text(&segment.text, self.max_chars).len().max(1)
                }
            }
        }
    }
}

/// Resolve missing times to zero and keep the end strictly after the start
fn settle(start: Option<f64>, end: Option<f64>) -> (f64, f64) {
    let start = start.unwrap_or(0.0);
    let mut end = end.unwrap_or(0.0);
    if end <= start {
        end = start + MIN_CUE_DURATION;
    }
    (start, end)
}

/// Total cues `emit_cues` will produce for `result`, used as the progress denominator
pub fn planned_cue_count(result: &TranscriptionResult, mode: CaptionMode, max_chars: usize) -> usize {
    let layout = CueLayout {
        mode,
        max_chars,
        padding: 0.0,
    };
    result.segments.iter().map(|seg| layout.planned_cues(seg)).sum()
}

/// Turn transcription segments into numbered SRT cues.
///
/// In [`CaptionMode::Normal`] each segment becomes one cue with its own
/// boundaries. In [`CaptionMode::Line`] segments are reflowed into lines of at
/// most `max_chars` characters, timed from word timestamps when present and
/// by even distribution over the segment otherwise; line ends are extended by
/// `padding` seconds. Every emitted cue is reported to `progress`.
pub fn emit_cues(
    result: &TranscriptionResult,
    mode: CaptionMode,
    max_chars: usize,
    padding: f64,
    progress: &dyn ProgressSink,
) -> EmittedCaptions {
    let padding = if padding.is_finite() && padding >= 0.0 {
        padding
    } else {
        warn!("Ignoring invalid caption padding {}", padding);
        0.0
    };
    let layout = CueLayout {
        mode,
        max_chars,
        padding,
    };

    let total = planned_cue_count(result, mode, max_chars);
    debug!(
        "Emitting {} planned cues from {} segments ({:?} mode)",
        total,
        result.segments.len(),
        mode
    );

    let mut document = SrtDocument::new();
    for segment in &result.segments {
        for line in layout.segment_lines(segment) {
            let (start, end) = settle(line.start, line.end);
            let index = document.len() + 1;
            document.add_cue(SrtCue::new(index as u32, start, end, line.text));
            progress.report(ProgressEvent::Cue {
                current: index,
                total,
            });
        }
    }

    EmittedCaptions {
        srt: document.generate(),
        cues: document.into_cues(),
    }
}
