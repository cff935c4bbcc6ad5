use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::srt::parse_timestamp;
use super::types::{Segment, TranscriptionResult};
use super::Transcriber;
use crate::config::CaptionConfig;
use crate::{CaptionError, Result};

/// Command-line Whisper implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhisperBackend {
    /// OpenAI Whisper (Python CLI), produces word timestamps
    Python,
    /// whisper.cpp via the named executable (`whisper-cli` or `whisper-cpp`);
    /// segment timestamps only, expects 16kHz WAV input
    Cpp(String),
}

impl WhisperBackend {
    fn name(&self) -> &str {
        match self {
            Self::Python => "whisper",
            Self::Cpp(cmd) => cmd,
        }
    }

    /// Whether `media_path` can be handed to this backend as-is
    fn accepts(&self, media_path: &Path) -> bool {
        match self {
            Self::Python => true,
            Self::Cpp(_) => media_path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("wav"))
                .unwrap_or(false),
        }
    }
}

/// Transcriber that shells out to a locally installed Whisper
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    /// Whisper model name
    model: String,
    /// Language hint
    language: Option<String>,
    /// Limit for a single transcription call
    timeout: Duration,
    /// Backend to use; detected once on first use when unset
    backend: OnceCell<WhisperBackend>,
}

impl WhisperTranscriber {
    /// Create a transcriber from caption configuration
    pub fn new(config: &CaptionConfig) -> Self {
        Self {
            model: config.model.clone(),
            language: config.language.clone(),
            timeout: Duration::from_secs(config.whisper_timeout_seconds),
            backend: OnceCell::new(),
        }
    }

    /// Pin a specific backend instead of detecting one
    pub fn with_backend(mut self, backend: WhisperBackend) -> Self {
        self.backend = OnceCell::new_with(Some(backend));
        self
    }

    /// The pinned backend, or the one detected on the first call
    pub async fn backend(&self) -> Result<&WhisperBackend> {
        self.backend
            .get_or_try_init(|| async {
                Self::detect_backend().await.ok_or_else(|| {
                    CaptionError::Whisper(
                        "No Whisper backend found (tried whisper, whisper-cli, whisper-cpp)".to_string(),
                    )
                })
            })
            .await
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// First available backend, in order of preference
    pub async fn detect_backend() -> Option<WhisperBackend> {
        let candidates = [
            WhisperBackend::Python,
            WhisperBackend::Cpp("whisper-cli".to_string()),
            WhisperBackend::Cpp("whisper-cpp".to_string()),
        ];

        for backend in candidates {
            if check_command_available(backend.name()).await {
                debug!("Found {} backend", backend.name());
                return Some(backend);
            }
        }
        None
    }

    /// Describe the available backend, or explain how to install one
    pub async fn check_availability() -> Result<String> {
        match Self::detect_backend().await {
            Some(WhisperBackend::Python) => Ok("OpenAI Whisper (Python implementation) available".to_string()),
            Some(WhisperBackend::Cpp(cmd)) => Ok(format!("whisper.cpp ({}) available", cmd)),
            None => Err(CaptionError::Whisper(
                "No Whisper backend found. Please install:\n\
                - OpenAI Whisper (recommended, word timestamps): pip install openai-whisper\n\
                - Or whisper.cpp: https://github.com/ggerganov/whisper.cpp"
                    .to_string(),
            )),
        }
    }

    fn build_command(&self, backend: &WhisperBackend, media_path: &Path, output_dir: &Path) -> Command {
        let mut cmd = Command::new(backend.name());

        match backend {
            WhisperBackend::Python => {
                cmd.arg(media_path)
                    .arg("--model")
                    .arg(&self.model)
                    .arg("--output_dir")
                    .arg(output_dir)
                    .arg("--output_format")
                    .arg("json")
                    .arg("--word_timestamps")
                    .arg("True")
                    .arg("--verbose")
                    .arg("False")
                    .arg("--fp16")
                    .arg("False");

                if let Some(language) = &self.language {
                    cmd.arg("--language").arg(language);
                }
            }
            WhisperBackend::Cpp(_) => {
                cmd.arg("-f")
                    .arg(media_path)
                    .arg("-oj")
                    .arg("-of")
                    .arg(output_dir.join(output_stem(media_path)));

                match self.find_ggml_model() {
                    Some(model_path) => {
                        cmd.arg("-m").arg(model_path);
                    }
                    None => warn!("⚠️  No ggml-{}.bin found, using the backend default model", self.model),
                }

                if let Some(language) = &self.language {
                    cmd.arg("-l").arg(language);
                }
            }
        }

        cmd
    }

    fn find_ggml_model(&self) -> Option<PathBuf> {
        let file_name = format!("ggml-{}.bin", self.model);
        [
            PathBuf::from("models"),
            PathBuf::from("/usr/local/share/whisper-cpp"),
            PathBuf::from("/opt/homebrew/share/whisper-cpp"),
        ]
        .into_iter()
        .map(|dir| dir.join(&file_name))
        .find(|path| path.exists())
    }

    /// Run the command with the configured timeout, killing it on expiry
    async fn run(&self, mut cmd: Command, backend: &WhisperBackend) -> Result<()> {
        let start_time = Instant::now();
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
        debug!("Executing command: {:?}", cmd);

        let child = cmd
            .spawn()
            .map_err(|e| CaptionError::Whisper(format!("Failed to spawn {}: {}", backend.name(), e)))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                error!(
                    "⏰ {} timed out after {:.1}s",
                    backend.name(),
                    start_time.elapsed().as_secs_f64()
                );
                return Err(CaptionError::Whisper(format!(
                    "{} timed out after {} seconds",
                    backend.name(),
                    self.timeout.as_secs()
                )));
            }
        };

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            if !line.trim().is_empty() {
                debug!("{} stderr: {}", backend.name(), line);
            }
        }

        if !output.status.success() {
            return Err(CaptionError::Whisper(format!(
                "{} failed with exit code: {}",
                backend.name(),
                output.status
            )));
        }

        info!(
            "✅ {} finished in {:.1}s",
            backend.name(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(())
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, media_path: &Path) -> Result<TranscriptionResult> {
        let backend = self.backend().await?;
        if !backend.accepts(media_path) {
            warn!(
                "⚠️  {} expects 16kHz WAV input, passing {} unconverted",
                backend.name(),
                media_path.display()
            );
        }

        info!(
            "🎙️ Transcribing {} with {} ({} model)",
            media_path.display(),
            backend.name(),
            self.model
        );

        let output_dir = tempfile::Builder::new().prefix("autocaptions_whisper_").tempdir()?;
        let cmd = self.build_command(backend, media_path, output_dir.path());
        self.run(cmd, backend).await?;

        let json_path = output_dir.path().join(format!("{}.json", output_stem(media_path)));
        let json_content = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            CaptionError::Whisper(format!(
                "No {} JSON output at {}: {}",
                backend.name(),
                json_path.display(),
                e
            ))
        })?;

        let result = parse_whisper_json(&json_content)?;
        debug!("Parsed {} segments from {}", result.len(), json_path.display());
        Ok(result)
    }
}

fn output_stem(media_path: &Path) -> String {
    media_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcript".to_string())
}

async fn check_command_available(cmd_name: &str) -> bool {
    Command::new(cmd_name)
        .arg("--help")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Whisper JSON output, either the OpenAI `segments` shape or the
/// whisper.cpp `transcription` shape
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<Segment>,
    #[serde(default)]
    transcription: Vec<CppSegment>,
}

#[derive(Debug, Deserialize)]
struct CppSegment {
    timestamps: CppTimestamps,
    #[serde(default)]
    offsets: Option<CppOffsets>,
    text: String,
}

#[derive(Debug, Deserialize)]
struct CppTimestamps {
    from: String,
    to: String,
}

/// Millisecond offsets
#[derive(Debug, Deserialize)]
struct CppOffsets {
    from: u64,
    to: u64,
}

impl CppSegment {
    fn into_segment(self) -> Segment {
        let (start, end) = match &self.offsets {
            Some(offsets) => (
                Some(offsets.from as f64 / 1000.0),
                Some(offsets.to as f64 / 1000.0),
            ),
            None => (
                parse_timestamp(&self.timestamps.from).ok(),
                parse_timestamp(&self.timestamps.to).ok(),
            ),
        };

        Segment {
            start,
            end,
            text: self.text.trim().to_string(),
            words: Vec::new(),
        }
    }
}

/// Parse Whisper JSON output into a transcription result
pub fn parse_whisper_json(json: &str) -> Result<TranscriptionResult> {
    let output: WhisperOutput = serde_json::from_str(json)?;

    if !output.transcription.is_empty() {
        debug!("Using whisper.cpp JSON format with {} segments", output.transcription.len());
        let segments = output
            .transcription
            .into_iter()
            .map(CppSegment::into_segment)
            .collect();
        return Ok(TranscriptionResult::new(segments));
    }

    Ok(TranscriptionResult::new(output.segments))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> CaptionConfig {
        CaptionConfig {
            model: "base".to_string(),
            language: Some("en".to_string()),
            whisper_timeout_seconds: 5,
            ..CaptionConfig::default()
        }
    }

    #[test]
    fn test_transcriber_creation() {
        let transcriber = WhisperTranscriber::new(&create_test_config());
        assert_eq!(transcriber.model(), "base");
        assert_eq!(transcriber.timeout, Duration::from_secs(5));
        assert!(!transcriber.backend.initialized());
    }

    #[test]
    fn test_python_command_requests_word_timestamps() {
        let transcriber = WhisperTranscriber::new(&create_test_config());
        let cmd = transcriber.build_command(&WhisperBackend::Python, Path::new("talk.mp4"), Path::new("/tmp/out"));

        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[0], "talk.mp4");
        assert!(args.windows(2).any(|w| w[0] == "--word_timestamps" && w[1] == "True"));
        assert!(args.windows(2).any(|w| w[0] == "--output_format" && w[1] == "json"));
        assert!(args.windows(2).any(|w| w[0] == "--language" && w[1] == "en"));
    }

    #[test]
    fn test_cpp_command_output_prefix() {
        let transcriber = WhisperTranscriber::new(&create_test_config());
        let backend = WhisperBackend::Cpp("whisper-cli".to_string());
        let cmd = transcriber.build_command(&backend, Path::new("/x/seg00001.wav"), Path::new("/tmp/out"));

        assert_eq!(cmd.as_std().get_program(), "whisper-cli");
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.windows(2).any(|w| w[0] == "-of" && w[1] == "/tmp/out/seg00001"));
    }

    #[test]
    fn test_parse_openai_json() {
        let json = r#"{
            "text": " Hello there friend",
            "language": "en",
            "segments": [
                {"id": 0, "seek": 0, "start": 0.0, "end": 3.0, "text": " Hello there friend",
                 "tokens": [1, 2, 3], "avg_logprob": -0.2,
                 "words": [
                    {"word": " Hello", "start": 0.0, "end": 1.0, "probability": 0.98},
                    {"word": " there", "start": 1.0, "end": 2.0, "probability": 0.95},
                    {"word": " friend", "start": 2.0, "end": 3.0, "probability": 0.91}
                 ]}
            ]
        }"#;

        let result = parse_whisper_json(json).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.segments[0].words.len(), 3);
        assert_eq!(result.segments[0].words[2].end, Some(3.0));
    }

    #[test]
    fn test_parse_whisper_cpp_json() {
        let json = r#"{
            "result": {"language": "en"},
            "transcription": [
                {"timestamps": {"from": "00:00:00,000", "to": "00:00:02,500"},
                 "offsets": {"from": 0, "to": 2500},
                 "text": " First line"},
                {"timestamps": {"from": "00:00:02,500", "to": "00:01:05,120"},
                 "text": " Second line"}
            ]
        }"#;

        let result = parse_whisper_json(json).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.segments[0].end, Some(2.5));
        assert_eq!(result.segments[0].text, "First line");
        assert_eq!(result.segments[1].end, Some(65.12));
        assert!(result.segments[1].words.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_whisper_json("not json").is_err());
    }

    #[tokio::test]
    async fn test_pinned_backend_skips_detection() {
        let pinned = WhisperBackend::Cpp("whisper-cli".to_string());
        let transcriber = WhisperTranscriber::new(&create_test_config()).with_backend(pinned.clone());

        assert_eq!(transcriber.backend().await.unwrap(), &pinned);
        assert_eq!(transcriber.backend().await.unwrap(), &pinned);
    }

    #[test]
    fn test_cpp_backend_accepts_only_wav() {
        let cpp = WhisperBackend::Cpp("whisper-cli".to_string());
        assert!(cpp.accepts(Path::new("/tmp/chunks/seg00000.wav")));
        assert!(cpp.accepts(Path::new("talk.WAV")));
        assert!(!cpp.accepts(Path::new("talk.mp4")));
        assert!(!cpp.accepts(Path::new("talk")));
        assert!(WhisperBackend::Python.accepts(Path::new("talk.mp4")));
    }

    #[tokio::test]
    async fn test_missing_backend_fails_cleanly() {
        let transcriber = WhisperTranscriber::new(&create_test_config())
            .with_backend(WhisperBackend::Cpp("/nonexistent/whisper-cli".to_string()));

        let err = transcriber.transcribe(Path::new("talk.wav")).await.unwrap_err();
        assert!(matches!(err, CaptionError::Whisper(_)));
    }

    #[test]
    fn test_whisper_availability() {
        // Result depends on what is installed
        let result = tokio_test::block_on(WhisperTranscriber::check_availability());
        if let Err(e) = result {
            assert!(e.to_string().contains("No Whisper backend found"));
        }
    }
}
