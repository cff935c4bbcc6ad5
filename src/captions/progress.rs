//! Progress side channel.
//!
//! Events are reported synchronously while cues and chunks are produced. A sink
//! must never influence the main computation; sinks that do I/O swallow their
//! own errors.

use regex::Regex;
use std::fmt;
use std::io::Write;
use std::sync::OnceLock;

/// Progress of one unit of work, as `current` out of `total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A subtitle cue was emitted
    Cue { current: usize, total: usize },
    /// An audio chunk finished transcribing
    Chunk { current: usize, total: usize },
}

impl ProgressEvent {
    pub fn current(&self) -> usize {
        match self {
            Self::Cue { current, .. } | Self::Chunk { current, .. } => *current,
        }
    }

    pub fn total(&self) -> usize {
        match self {
            Self::Cue { total, .. } | Self::Chunk { total, .. } => *total,
        }
    }

    /// Rounded completion percentage, 0 when nothing is planned
    pub fn percent(&self) -> u32 {
        if self.total() == 0 {
            return 0;
        }
        (self.current() as f64 * 100.0 / self.total() as f64).round() as u32
    }

    /// Parse a `PROGRESS: i/n` or `PROGRESS_CHUNK: i/n` line
    pub fn parse_line(line: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"^\s*PROGRESS(_CHUNK)?:\s*(\d+)\s*/\s*(\d+)\s*$").expect("valid regex")
        });

        let caps = pattern.captures(line)?;
        let current = caps[2].parse().ok()?;
        let total = caps[3].parse().ok()?;

        Some(if caps.get(1).is_some() {
            Self::Chunk { current, total }
        } else {
            Self::Cue { current, total }
        })
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cue { current, total } => write!(f, "PROGRESS: {}/{}", current, total),
            Self::Chunk { current, total } => write!(f, "PROGRESS_CHUNK: {}/{}", current, total),
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes machine-parsable progress lines to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn report(&self, event: ProgressEvent) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", event);
        let _ = stdout.flush();
    }
}
