//! Clip command implementation.

use crate::clip::{resolve_font, ClipSynthesizer, FfmpegEncoder};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::source::YtDlpDownloader;
use anyhow::Result;
use std::sync::Arc;

/// Run the clip command.
pub async fn run_clip(
    video_id: &str,
    start: f64,
    caption: &str,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Clip) {
        Output::error(&format!("{}", e));
        Output::info("Run 'klipp doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if start < 0.0 {
        Output::error("Start offset must not be negative.");
        return Err(anyhow::anyhow!("negative start offset"));
    }

    let font = resolve_font(settings.clip.font_path.as_deref());
    if font.is_none() {
        Output::warning("No usable font found; captions will use ffmpeg's default font.");
    }

    let synthesizer = ClipSynthesizer::new(
        Arc::new(YtDlpDownloader::new()),
        Arc::new(FfmpegEncoder::new()),
        settings.clips_dir(),
        font,
    );

    let cached = synthesizer.artifact_path(video_id, start, caption).exists();
    let spinner = if cached {
        Output::spinner("Checking clip cache...")
    } else {
        Output::spinner("Downloading and rendering clip...")
    };

    let result = synthesizer.synthesize(video_id, start, caption).await;
    spinner.finish_and_clear();

    match result {
        Ok(path) => {
            if cached {
                Output::success(&format!("Clip already cached: {}", path.display()));
            } else {
                Output::success(&format!("Clip rendered: {}", path.display()));
            }
        }
        Err(e) => {
            Output::error(&format!("Clip synthesis failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
