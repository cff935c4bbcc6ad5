use async_trait::async_trait;
use autocaptions::audio::{list_chunk_files, wav_duration};
use autocaptions::{
    AudioChunk, CaptionError, CaptionJob, CaptionMode, ChunkSplitter, ConfigBuilder, ProgressEvent, ProgressSink,
    Result, Segment, Transcriber, TranscriptionResult, Word,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::fs;

/// Serves canned transcriptions keyed by file name
struct ScriptedTranscriber {
    results: HashMap<String, TranscriptionResult>,
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, media_path: &Path) -> Result<TranscriptionResult> {
        let name = media_path.file_name().unwrap().to_string_lossy().into_owned();
        self.results
            .get(&name)
            .cloned()
            .ok_or_else(|| CaptionError::Transcription(format!("unexpected input {}", name)))
    }
}

struct UnavailableSplitter;

#[async_trait]
impl ChunkSplitter for UnavailableSplitter {
    async fn split(&self, _media_path: &Path, _chunk_seconds: u32, _work_dir: &Path) -> Result<Vec<AudioChunk>> {
        Err(CaptionError::Split("ffmpeg not installed".to_string()))
    }
}

/// Writes silent WAV chunks of the given lengths and measures them back
struct WavSplitter {
    seconds: Vec<f64>,
}

#[async_trait]
impl ChunkSplitter for WavSplitter {
    async fn split(&self, _media_path: &Path, _chunk_seconds: u32, work_dir: &Path) -> Result<Vec<AudioChunk>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        for (i, secs) in self.seconds.iter().enumerate() {
            let path = work_dir.join(format!("seg{:05}.wav", i));
            let mut writer = hound::WavWriter::create(&path, spec)?;
            for _ in 0..(secs * 16000.0) as u32 {
                writer.write_sample(0i16)?;
            }
            writer.finalize()?;
        }

        let mut chunks = Vec::new();
        for path in list_chunk_files(work_dir) {
            let duration = wav_duration(&path)?;
            chunks.push(AudioChunk::new(path, duration));
        }
        Ok(chunks)
    }
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressSink for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn hello_result() -> TranscriptionResult {
    TranscriptionResult::new(vec![Segment::new(0.0, 3.0, " hello there friend").with_words(vec![
        Word::new(" hello", 0.0, 1.0),
        Word::new(" there", 1.0, 2.0),
        Word::new(" friend", 2.0, 3.0),
    ])])
}

async fn media_file(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, b"mock video content").await.unwrap();
    path
}

#[tokio::test]
async fn test_line_mode_single_pass_writes_srt() {
    let temp_dir = TempDir::new().unwrap();
    let video = media_file(&temp_dir, "greeting.mp4").await;
    let out_dir = temp_dir.path().join("transcriptions");

    let config = ConfigBuilder::new()
        .with_mode(CaptionMode::Line)
        .with_max_chars(12)
        .with_padding(0.08)
        .with_output_dir(out_dir.clone())
        .build();
    let transcriber = ScriptedTranscriber {
        results: HashMap::from([("greeting.mp4".to_string(), hello_result())]),
    };
    let progress = Arc::new(RecordingProgress::default());
    let job = CaptionJob::with_collaborators(config, Arc::new(transcriber), Arc::new(UnavailableSplitter))
        .with_progress(progress.clone());

    let output = job.run(&video).await.unwrap();

    assert_eq!(output.srt_path, out_dir.join("greeting.srt"));
    let srt = fs::read_to_string(&output.srt_path).await.unwrap();
    assert_eq!(
        srt,
        "1\n00:00:00,000 --> 00:00:02,080\nhello there\n\n\
         2\n00:00:02,000 --> 00:00:03,080\nfriend\n"
    );
    assert_eq!(
        *progress.events.lock().unwrap(),
        vec![
            ProgressEvent::Cue { current: 1, total: 2 },
            ProgressEvent::Cue { current: 2, total: 2 },
        ]
    );
}

#[tokio::test]
async fn test_normal_mode_one_cue_per_segment() {
    let temp_dir = TempDir::new().unwrap();
    let video = media_file(&temp_dir, "lecture.mp4").await;

    let config = ConfigBuilder::new()
        .with_mode(CaptionMode::Normal)
        .with_output_dir(temp_dir.path().to_path_buf())
        .build();
    let transcriber = ScriptedTranscriber {
        results: HashMap::from([(
            "lecture.mp4".to_string(),
            TranscriptionResult::new(vec![
                Segment::new(0.0, 2.0, " Welcome everyone to today's lecture."),
                Segment::new(2.0, 5.0, " We start with chunking."),
            ]),
        )]),
    };
    let job = CaptionJob::with_collaborators(config, Arc::new(transcriber), Arc::new(UnavailableSplitter));

    let output = job.run(&video).await.unwrap();

    let srt = fs::read_to_string(&output.srt_path).await.unwrap();
    assert_eq!(
        srt,
        "1\n00:00:00,000 --> 00:00:02,000\nWelcome everyone to today's lecture.\n\n\
         2\n00:00:02,000 --> 00:00:05,000\nWe start with chunking.\n"
    );
}

#[tokio::test]
async fn test_multi_chunk_stitching_with_measured_wav_durations() {
    let temp_dir = TempDir::new().unwrap();
    let video = media_file(&temp_dir, "long.mp4").await;

    let chunk = |text: &str| {
        TranscriptionResult::new(vec![
            Segment::new(1.0, 2.0, text).with_words(vec![Word::new(text, 1.0, 2.0)])
        ])
    };
    let transcriber = ScriptedTranscriber {
        results: HashMap::from([
            ("seg00000.wav".to_string(), chunk("first")),
            ("seg00001.wav".to_string(), chunk("second")),
            ("seg00002.wav".to_string(), chunk("third")),
        ]),
    };
    let config = ConfigBuilder::new()
        .with_mode(CaptionMode::Line)
        .with_padding(0.0)
        .with_output_dir(temp_dir.path().join("out"))
        .build();
    let progress = Arc::new(RecordingProgress::default());
    let job = CaptionJob::with_collaborators(
        config,
        Arc::new(transcriber),
        Arc::new(WavSplitter {
            seconds: vec![10.0, 9.5, 12.0],
        }),
    )
    .with_progress(progress.clone());

    let output = job.run(&video).await.unwrap();

    let starts: Vec<f64> = output.cues.iter().map(|c| c.start).collect();
    let ends: Vec<f64> = output.cues.iter().map(|c| c.end).collect();
    assert_eq!(starts, vec![1.0, 11.0, 20.5]);
    assert_eq!(ends, vec![2.0, 12.0, 21.5]);

    let srt = fs::read_to_string(&output.srt_path).await.unwrap();
    assert!(srt.contains("3\n00:00:20,500 --> 00:00:21,500\nthird\n"));

    let events = progress.events.lock().unwrap().clone();
    let chunk_events: Vec<&ProgressEvent> = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::Chunk { .. }))
        .collect();
    assert_eq!(chunk_events.len(), 3);
    assert_eq!(*chunk_events[2], ProgressEvent::Chunk { current: 3, total: 3 });
    assert_eq!(events.last(), Some(&ProgressEvent::Cue { current: 3, total: 3 }));
}

#[tokio::test]
async fn test_fallback_line_timing_without_word_timestamps() {
    let temp_dir = TempDir::new().unwrap();
    let video = media_file(&temp_dir, "clip.mp4").await;

    let transcriber = ScriptedTranscriber {
        results: HashMap::from([(
            "clip.mp4".to_string(),
            TranscriptionResult::new(vec![Segment::new(0.0, 4.0, "alpha beta gamma delta")]),
        )]),
    };
    let config = ConfigBuilder::new()
        .with_mode(CaptionMode::Line)
        .with_max_chars(11)
        .with_output_dir(temp_dir.path().to_path_buf())
        .build();
    let job = CaptionJob::with_collaborators(config, Arc::new(transcriber), Arc::new(UnavailableSplitter));

    let output = job.run(&video).await.unwrap();

    let srt = fs::read_to_string(&output.srt_path).await.unwrap();
    assert_eq!(
        srt,
        "1\n00:00:00,000 --> 00:00:02,080\nalpha beta\n\n\
         2\n00:00:02,000 --> 00:00:04,080\ngamma delta\n"
    );
}

#[tokio::test]
async fn test_failed_chunk_writes_no_file() {
    let temp_dir = TempDir::new().unwrap();
    let video = media_file(&temp_dir, "broken.mp4").await;
    let out_dir = temp_dir.path().join("out");

    // Only the first chunk has a transcription; the second errors
    let transcriber = ScriptedTranscriber {
        results: HashMap::from([("seg00000.wav".to_string(), hello_result())]),
    };
    let config = ConfigBuilder::new().with_output_dir(out_dir.clone()).build();
    let job = CaptionJob::with_collaborators(
        config,
        Arc::new(transcriber),
        Arc::new(WavSplitter {
            seconds: vec![1.0, 1.0],
        }),
    );

    let err = job.run(&video).await.unwrap_err();

    assert!(err.to_string().contains("chunk 2/2"));
    assert!(!out_dir.join("broken.srt").exists());
}

#[tokio::test]
async fn test_chunk_durations_come_from_files() {
    let temp_dir = TempDir::new().unwrap();
    let splitter = WavSplitter {
        seconds: vec![30.0, 4.25],
    };

    let chunks = splitter
        .split(Path::new("ignored.mp4"), 30, temp_dir.path())
        .await
        .unwrap();

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].duration, Duration::from_secs(30));
    assert_eq!(chunks[1].duration, Duration::from_millis(4250));
}
