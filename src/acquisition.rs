//! Transcript acquisition pipeline.
//!
//! Guarantees a transcript file exists in the store for every video it is
//! pointed at, trying in order: reuse an existing file, fetch the platform's
//! subtitles, fall back to audio transcription. Each video runs through an
//! explicit state machine; the batch driver contains per-video failures so
//! one bad entry never aborts a playlist.
//!
//! There is no retry layer. The existence check makes a re-run skip every
//! completed video and naturally retry only the failed ones.

use crate::error::{KlippError, Result};
use crate::source::{MediaDownloader, VideoEntry};
use crate::subtitle::{Cue, TranscriptStore};
use crate::transcription::Transcriber;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// States of the per-video acquisition machine.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionState {
    /// Look for any transcript file already in the store.
    CheckExisting,
    /// Request the platform's native or auto-generated subtitles.
    FetchPlatformSubs,
    /// Download audio and transcribe it.
    GenerateViaTranscription,
    /// Terminal: a transcript file exists.
    Done(AcquisitionMethod),
    /// Terminal: no transcript could be produced.
    Failed(String),
}

/// How a transcript ended up in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMethod {
    /// Found on disk; nothing was done.
    AlreadyPresent,
    /// The platform provided subtitles.
    PlatformSubtitles,
    /// Generated by the transcription fallback.
    Transcribed,
}

/// Terminal outcome for one video.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionOutcome {
    Done(AcquisitionMethod),
    Failed(String),
}

/// Summary of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub total: usize,
    pub acquired: usize,
    pub already_present: usize,
    pub failed: usize,
}

/// The acquisition pipeline with its capabilities.
pub struct AcquisitionPipeline {
    store: TranscriptStore,
    downloader: Arc<dyn MediaDownloader>,
    transcriber: Arc<dyn Transcriber>,
    language: String,
    initial_prompt: Option<String>,
    temp_dir: PathBuf,
}

impl AcquisitionPipeline {
    pub fn new(
        store: TranscriptStore,
        downloader: Arc<dyn MediaDownloader>,
        transcriber: Arc<dyn Transcriber>,
        language: &str,
        initial_prompt: Option<String>,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            downloader,
            transcriber,
            language: language.to_string(),
            initial_prompt,
            temp_dir,
        }
    }

    /// The transcript store this pipeline writes into.
    pub fn store(&self) -> &TranscriptStore {
        &self.store
    }

    /// Run the state machine for one video to a terminal state.
    ///
    /// Never returns an error: every failure mode collapses into
    /// `AcquisitionOutcome::Failed` so the caller's batch loop stays simple.
    #[instrument(skip(self), fields(video_id = %video.id))]
    pub async fn acquire_video(&self, video: &VideoEntry) -> AcquisitionOutcome {
        let mut state = AcquisitionState::CheckExisting;

        loop {
            state = match state {
                AcquisitionState::CheckExisting => match self.store.find_for_video(&video.id) {
                    Ok(Some(path)) => {
                        info!("Transcript already present: {}", path.display());
                        AcquisitionState::Done(AcquisitionMethod::AlreadyPresent)
                    }
                    Ok(None) => AcquisitionState::FetchPlatformSubs,
                    Err(e) => AcquisitionState::Failed(format!("store check failed: {}", e)),
                },

                AcquisitionState::FetchPlatformSubs => {
                    if let Err(e) = self
                        .downloader
                        .fetch_subtitles(video, &self.language, self.store.root())
                        .await
                    {
                        warn!("Subtitle fetch failed: {}", e);
                    }

                    // File materialization is the only success signal.
                    match self.store.find_for_video(&video.id) {
                        Ok(Some(_)) => {
                            info!("Platform subtitles found");
                            AcquisitionState::Done(AcquisitionMethod::PlatformSubtitles)
                        }
                        Ok(None) => {
                            info!("No platform subtitles, falling back to transcription");
                            AcquisitionState::GenerateViaTranscription
                        }
                        Err(e) => AcquisitionState::Failed(format!("store check failed: {}", e)),
                    }
                }

                AcquisitionState::GenerateViaTranscription => {
                    match self.transcribe_fallback(video).await {
                        Ok(()) => AcquisitionState::Done(AcquisitionMethod::Transcribed),
                        Err(e) => AcquisitionState::Failed(e.to_string()),
                    }
                }

                AcquisitionState::Done(method) => return AcquisitionOutcome::Done(method),
                AcquisitionState::Failed(reason) => return AcquisitionOutcome::Failed(reason),
            };
        }
    }

    /// Download audio, transcribe it, and persist the result as a transcript.
    async fn transcribe_fallback(&self, video: &VideoEntry) -> Result<()> {
        let audio_path = self
            .downloader
            .download_audio(video, &self.temp_dir)
            .await?;

        if !audio_path.exists() {
            return Err(KlippError::AudioDownload(
                "audio file missing after download".to_string(),
            ));
        }

        let prompt = self.initial_prompt.as_deref().or_else(|| {
            crate::transcription::priming_phrase(&self.language)
        });

        let result = self
            .transcriber
            .transcribe(&audio_path, &self.language, prompt)
            .await;

        // The temp audio goes away whether or not transcription succeeded.
        if let Err(e) = std::fs::remove_file(&audio_path) {
            warn!("Failed to clean up audio file: {}", e);
        }

        let segments = result?;

        let cues: Vec<Cue> = segments
            .iter()
            .map(|s| Cue::new(s.start_seconds, s.end_seconds, &s.text))
            .collect();

        self.store.write(&video.id, &self.language, &cues)?;
        info!("Generated transcript with {} cues", cues.len());

        Ok(())
    }

    /// Resolve a URL and acquire every video in it, strictly sequentially.
    #[instrument(skip(self))]
    pub async fn run(&self, url: &str) -> Result<BatchReport> {
        let entries = self.downloader.resolve(url).await?.into_entries();

        let mut report = BatchReport {
            total: entries.len(),
            ..Default::default()
        };

        for (i, video) in entries.iter().enumerate() {
            info!(
                "[{}/{}] Processing {}",
                i + 1,
                report.total,
                video.display_name()
            );

            match self.acquire_video(video).await {
                AcquisitionOutcome::Done(AcquisitionMethod::AlreadyPresent) => {
                    report.already_present += 1;
                }
                AcquisitionOutcome::Done(_) => {
                    report.acquired += 1;
                }
                AcquisitionOutcome::Failed(reason) => {
                    warn!("Skipping {}: {}", video.id, reason);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
