use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::{CaptionError, Result};

/// How segments are laid out as cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionMode {
    /// One cue per transcription segment
    #[default]
    Normal,
    /// Segments reflowed into short, caption-friendly lines
    Line,
}

impl FromStr for CaptionMode {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "line" => Ok(Self::Line),
            other => Err(CaptionError::Config(format!(
                "Unknown caption mode '{}' (expected 'normal' or 'line')",
                other
            ))),
        }
    }
}

impl fmt::Display for CaptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Line => write!(f, "line"),
        }
    }
}

/// Configuration for caption generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Cue layout
    pub mode: CaptionMode,

    /// Maximum characters per caption line (line mode)
    pub max_chars: usize,

    /// Length of each audio chunk handed to the transcriber, in seconds
    pub chunk_seconds: u32,

    /// Seconds added to line-mode cue ends so trailing audio is not clipped
    pub padding_seconds: f64,

    /// Directory receiving `<media name>.srt`
    pub output_dir: PathBuf,

    /// Whisper model name
    pub model: String,

    /// Language hint for transcription (None for auto-detect)
    pub language: Option<String>,

    /// Timeout for one transcription call (seconds)
    pub whisper_timeout_seconds: u64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            mode: CaptionMode::Normal,
            max_chars: 20,
            chunk_seconds: 30,
            padding_seconds: 0.08,
            output_dir: PathBuf::from("transcriptions"),
            model: "small".to_string(),
            language: None,
            whisper_timeout_seconds: 3600, // 60 minutes for large files
        }
    }
}

impl CaptionConfig {
    /// Load configuration from `path`, or from the first default location that
    /// exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_over(path, Self::default())
    }

    /// Like [`CaptionConfig::load`], but fields missing from the file keep
    /// their value from `base` instead of the library defaults.
    pub fn load_over(path: Option<&Path>, base: Self) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file_over(path, base)?,
            None => {
                let config_paths = ["autocaptions.toml", "config/autocaptions.toml"];
                let mut loaded = None;

                for candidate in config_paths.iter().map(Path::new) {
                    if !candidate.is_file() {
                        continue;
                    }
                    match Self::from_file_over(candidate, base.clone()) {
                        Ok(config) => {
                            loaded = Some(config);
                            break;
                        }
                        Err(e) => warn!("Failed to parse config file {}: {}", candidate.display(), e),
                    }
                }

                loaded.unwrap_or(base)
            }
        };

        Ok(config.with_env_overrides())
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_over(path, Self::default())
    }

    /// Parse a TOML configuration file on top of `base`
    pub fn from_file_over(path: &Path, base: Self) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)?;
        let file_table: toml::Table = config_str.parse()?;

        let mut merged = match toml::Value::try_from(base) {
            Ok(toml::Value::Table(table)) => table,
            Ok(_) => toml::Table::new(),
            Err(e) => return Err(CaptionError::Config(e.to_string())),
        };
        merged.extend(file_table);
        let config: Self = toml::Value::Table(merged).try_into()?;
        info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Override fields from `AUTOCAPTIONS_*` environment variables.
    /// Unparsable values are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("AUTOCAPTIONS_MODE") {
            match mode.parse() {
                Ok(mode) => self.mode = mode,
                Err(e) => warn!("Ignoring AUTOCAPTIONS_MODE: {}", e),
            }
        }

        if let Some(max_chars) = lookup("AUTOCAPTIONS_MAXCHARS") {
            match max_chars.trim().parse() {
                Ok(value) => self.max_chars = value,
                Err(_) => warn!("Ignoring AUTOCAPTIONS_MAXCHARS={}", max_chars),
            }
        }

        if let Some(chunk_seconds) = lookup("AUTOCAPTIONS_CHUNK_SECONDS") {
            match chunk_seconds.trim().parse() {
                Ok(value) => self.chunk_seconds = value,
                Err(_) => warn!("Ignoring AUTOCAPTIONS_CHUNK_SECONDS={}", chunk_seconds),
            }
        }

        if let Some(padding) = lookup("AUTOCAPTIONS_PADDING") {
            match padding.trim().parse() {
                Ok(value) => self.padding_seconds = value,
                Err(_) => warn!("Ignoring AUTOCAPTIONS_PADDING={}", padding),
            }
        }

        if let Some(output_dir) = lookup("AUTOCAPTIONS_OUTDIR") {
            self.output_dir = PathBuf::from(output_dir);
        }

        if let Some(model) = lookup("AUTOCAPTIONS_MODEL") {
            self.model = model;
        }

        self
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str =
            toml::to_string_pretty(self).map_err(|e| CaptionError::Config(e.to_string()))?;
        std::fs::write(path, config_str)?;
        info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(CaptionError::Config("max_chars must be greater than 0".to_string()));
        }

        if self.chunk_seconds == 0 {
            return Err(CaptionError::Config("chunk_seconds must be greater than 0".to_string()));
        }

        if !self.padding_seconds.is_finite() || self.padding_seconds < 0.0 {
            return Err(CaptionError::Config(format!(
                "padding_seconds must be a non-negative number, got {}",
                self.padding_seconds
            )));
        }

        if self.model.trim().is_empty() {
            return Err(CaptionError::Config("model must not be empty".to_string()));
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "AutoCaptions Configuration:\n\
            - Mode: {}\n\
            - Max Chars: {}\n\
            - Chunk Seconds: {}\n\
            - Padding: {:.3}s\n\
            - Model: {}\n\
            - Output Directory: {}",
            self.mode,
            self.max_chars,
            self.chunk_seconds,
            self.padding_seconds,
            self.model,
            self.output_dir.display(),
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: CaptionConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CaptionConfig::default(),
        }
    }

    pub fn with_mode(mut self, mode: CaptionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.config.max_chars = max_chars;
        self
    }

    pub fn with_chunk_seconds(mut self, chunk_seconds: u32) -> Self {
        self.config.chunk_seconds = chunk_seconds;
        self
    }

    pub fn with_padding(mut self, padding_seconds: f64) -> Self {
        self.config.padding_seconds = padding_seconds;
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.output_dir = dir;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.config.language = language;
        self
    }

    pub fn build(self) -> CaptionConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
