use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::{CaptionError, Result};

/// SRT (SubRip Subtitle) cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrtCue {
    /// Sequential number, starting at 1
    pub index: u32,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Subtitle text
    pub text: String,
}

impl SrtCue {
    /// Create a new SRT cue
    pub fn new(index: u32, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    /// Cue duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for SrtCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{} --> {}\n{}\n",
            self.index,
            format_timestamp(Some(self.start)),
            format_timestamp(Some(self.end)),
            self.text
        )
    }
}

/// Ordered SRT cue list and its text rendering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SrtDocument {
    cues: Vec<SrtCue>,
}

impl SrtDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self { cues: Vec::new() }
    }

    /// Append a cue
    pub fn add_cue(&mut self, cue: SrtCue) {
        self.cues.push(cue);
    }

    /// Render the SRT text: index, time range, text and a blank line per cue,
    /// joined by newlines.
    pub fn generate(&self) -> String {
        self.cues
            .iter()
            .map(|cue| cue.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Save SRT to file (UTF-8)
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        tokio::fs::write(path.as_ref(), self.generate()).await?;
        Ok(())
    }

    /// End time of the last-ending cue
    pub fn total_duration(&self) -> f64 {
        self.cues.iter().map(|cue| cue.end).fold(0.0, f64::max)
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn cues(&self) -> &[SrtCue] {
        &self.cues
    }

    pub fn into_cues(self) -> Vec<SrtCue> {
        self.cues
    }

    /// Report cues that break the index or timing invariants
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (i, cue) in self.cues.iter().enumerate() {
            if cue.index as usize != i + 1 {
                issues.push(format!(
                    "Cue {}: index {} out of sequence",
                    i + 1,
                    cue.index
                ));
            }

            if cue.end <= cue.start {
                issues.push(format!("Cue {}: End time is not after start time", i + 1));
            }
        }

        for pair in self.cues.windows(2) {
            if pair[1].start < pair[0].start {
                issues.push(format!(
                    "Cues {} and {}: start times go backwards",
                    pair[0].index, pair[1].index
                ));
            }
        }

        issues
    }
}

impl From<Vec<SrtCue>> for SrtDocument {
    fn from(cues: Vec<SrtCue>) -> Self {
        Self { cues }
    }
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm).
///
/// Rounds to the nearest millisecond. Missing and negative values render as
/// zero; hours are not wrapped at 24.
pub fn format_timestamp(seconds: Option<f64>) -> String {
    let seconds = seconds.filter(|s| s.is_finite()).unwrap_or(0.0).max(0.0);
    let total_ms = (seconds * 1000.0).round() as u64;

    let milliseconds = total_ms % 1000;
    let total_seconds = total_ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, milliseconds)
}

/// Parse a single SRT timestamp (HH:MM:SS,mmm) into seconds
pub fn parse_timestamp(timestamp: &str) -> Result<f64> {
    let invalid = || CaptionError::Transcription(format!("Invalid timestamp format: {}", timestamp));

    let (clock, millis) = timestamp.trim().split_once(',').ok_or_else(invalid)?;
    let hms: Vec<&str> = clock.split(':').collect();
    if hms.len() != 3 {
        return Err(invalid());
    }

    let hours: u64 = hms[0].parse().map_err(|_| invalid())?;
    let minutes: u64 = hms[1].parse().map_err(|_| invalid())?;
    let seconds: u64 = hms[2].parse().map_err(|_| invalid())?;
    let milliseconds: u64 = millis.parse().map_err(|_| invalid())?;

    let total_ms = (hours * 3600 + minutes * 60 + seconds) * 1000 + milliseconds;
    Ok(total_ms as f64 / 1000.0)
}
