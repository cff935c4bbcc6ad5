use anyhow::Result;
use autocaptions::{CaptionConfig, FfmpegSplitter, WhisperTranscriber};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("autocaptions=info,check_backend=info")
        .init();

    info!("🔍 Checking transcription backend availability...");

    let splitter = FfmpegSplitter::new();
    if splitter.is_available().await {
        info!("✅ ffmpeg available, long media will be transcribed in chunks");
    } else {
        info!("⚠️  ffmpeg not found, media will be transcribed in a single pass");
    }

    match WhisperTranscriber::check_availability().await {
        Ok(backend_info) => {
            info!("✅ {}", backend_info);
        }
        Err(e) => {
            info!("❌ {}", e);
            return Ok(());
        }
    }

    let config = CaptionConfig::from_env();
    let transcriber = WhisperTranscriber::new(&config);
    info!("🎤 Transcriber configured with model: {}", transcriber.model());
    for line in config.summary().lines() {
        info!("   {}", line);
    }

    info!("🎉 All transcription components ready!");
    Ok(())
}
