use serde::{Deserialize, Serialize};

/// A single recognized word with optional timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Word text as produced by the model (may carry leading whitespace)
    #[serde(rename = "word", alias = "text")]
    pub text: String,
    /// Start time in seconds
    #[serde(default)]
    pub start: Option<f64>,
    /// End time in seconds
    #[serde(default)]
    pub end: Option<f64>,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// Word without timing information
    pub fn untimed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: None,
            end: None,
        }
    }
}

/// Contiguous span of recognized speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds
    #[serde(default)]
    pub start: Option<f64>,
    /// End time in seconds
    #[serde(default)]
    pub end: Option<f64>,
    /// Transcribed text
    #[serde(default)]
    pub text: String,
    /// Per-word timestamps, empty when the backend did not produce them
    #[serde(default, deserialize_with = "nullable_words")]
    pub words: Vec<Word>,
}

impl Segment {
    /// Create a segment without word timestamps
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            text: text.into(),
            words: Vec::new(),
        }
    }

    /// Attach word timestamps
    pub fn with_words(mut self, words: Vec<Word>) -> Self {
        self.words = words;
        self
    }

    /// Segment duration when both ends are known
    pub fn duration(&self) -> Option<f64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Move the segment onto a timeline starting at `offset` seconds.
    ///
    /// Missing segment bounds count as 0.0 on the local timeline, so they
    /// land at `offset`. Word timestamps are only shifted when present.
    pub fn offset_by(&mut self, offset: f64) {
        self.start = Some(self.start.unwrap_or(0.0) + offset);
        self.end = Some(self.end.unwrap_or(0.0) + offset);
        for word in &mut self.words {
            shift(&mut word.start, offset);
            shift(&mut word.end, offset);
        }
    }
}

fn shift(value: &mut Option<f64>, offset: f64) {
    if let Some(v) = value.as_mut() {
        *v += offset;
    }
}

fn nullable_words<'de, D>(deserializer: D) -> std::result::Result<Vec<Word>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Word>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Complete transcription: ordered, non-overlapping segments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl TranscriptionResult {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Move every segment onto a timeline starting at `offset` seconds
    pub fn offset_by(&mut self, offset: f64) {
        for segment in &mut self.segments {
            segment.offset_by(offset);
        }
    }

    /// Full text, segments joined by a single space
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|seg| seg.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
