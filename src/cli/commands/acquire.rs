//! Acquire command implementation.

use crate::acquisition::{AcquisitionMethod, AcquisitionOutcome, AcquisitionPipeline};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::source::{MediaDownloader, YtDlpDownloader};
use crate::subtitle::TranscriptStore;
use crate::transcription::WhisperTranscriber;
use anyhow::Result;
use std::sync::Arc;

/// Run the acquire command.
pub async fn run_acquire(
    url: &str,
    lang: Option<String>,
    limit: Option<usize>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Acquire) {
        Output::error(&format!("{}", e));
        Output::info("Run 'klipp doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let language = lang.unwrap_or_else(|| settings.acquisition.language.clone());
    let limit = limit.or(settings.acquisition.playlist_limit);

    let downloader: Arc<dyn MediaDownloader> = Arc::new(YtDlpDownloader::new());

    let pipeline = AcquisitionPipeline::new(
        TranscriptStore::new(settings.subs_dir()),
        downloader.clone(),
        Arc::new(WhisperTranscriber::with_config(
            &settings.acquisition.whisper_model,
            settings.acquisition.chunk_duration_seconds,
        )),
        &language,
        settings.acquisition.initial_prompt.clone(),
        settings.temp_dir(),
    );

    let spinner = Output::spinner("Resolving URL...");
    let resolved = downloader.resolve(url).await;
    spinner.finish_and_clear();

    let mut entries = match resolved {
        Ok(r) => r.into_entries(),
        Err(e) => {
            Output::error(&format!("Could not resolve URL: {}", e));
            return Err(e.into());
        }
    };

    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    let total = entries.len();
    Output::info(&format!("Found {} video(s) to process", total));
    println!();

    let mut acquired = 0;
    let mut already_present = 0;
    let mut failed = 0;

    for (i, video) in entries.iter().enumerate() {
        let progress = format!("[{}/{}]", i + 1, total);
        Output::info(&format!("{} Processing: {}", progress, video.display_name()));

        match pipeline.acquire_video(video).await {
            AcquisitionOutcome::Done(AcquisitionMethod::AlreadyPresent) => {
                Output::warning("  Skipped (transcript already exists)");
                already_present += 1;
            }
            AcquisitionOutcome::Done(AcquisitionMethod::PlatformSubtitles) => {
                Output::success("  Downloaded platform subtitles");
                acquired += 1;
            }
            AcquisitionOutcome::Done(AcquisitionMethod::Transcribed) => {
                Output::success("  Generated transcript via transcription");
                acquired += 1;
            }
            AcquisitionOutcome::Failed(reason) => {
                Output::error(&format!("  Failed: {}", reason));
                failed += 1;
            }
        }
    }

    println!();
    Output::info(&format!(
        "Acquisition complete: {} acquired, {} already present, {} failed",
        acquired, already_present, failed
    ));

    if failed > 0 {
        Output::info("Re-run the same command to retry failed videos; completed ones are skipped.");
    }

    Ok(())
}
