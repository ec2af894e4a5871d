//! Klipp - Video Moment Search and Clips
//!
//! A CLI tool for finding spoken moments in video transcripts and turning
//! them into shareable captioned GIF clips.
//!
//! The name "Klipp" comes from the Norwegian/Scandinavian word for "cut" or
//! "clip."
//!
//! # Overview
//!
//! Klipp allows you to:
//! - Acquire transcripts for videos and playlists, falling back to AI
//!   transcription when the platform has no subtitles
//! - Search all acquired transcripts semantically for a spoken moment
//! - Render a captioned GIF clip of any matched moment, cached on disk
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `subtitle` - Cue model, WebVTT parsing, and the transcript store
//! - `source` - Video platform access (URL resolution, downloads)
//! - `transcription` - Speech-to-text fallback
//! - `audio` - Audio probing and splitting for transcription
//! - `embedding` - Embedding generation
//! - `index` - In-memory corpus index and semantic search
//! - `acquisition` - Transcript acquisition state machine
//! - `clip` - Captioned clip synthesis and caching
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use klipp::acquisition::AcquisitionPipeline;
//! use klipp::config::Settings;
//! use klipp::source::YtDlpDownloader;
//! use klipp::subtitle::TranscriptStore;
//! use klipp::transcription::WhisperTranscriber;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = AcquisitionPipeline::new(
//!         TranscriptStore::new(settings.subs_dir()),
//!         Arc::new(YtDlpDownloader::new()),
//!         Arc::new(WhisperTranscriber::new()),
//!         &settings.acquisition.language,
//!         None,
//!         settings.temp_dir(),
//!     );
//!
//!     let report = pipeline.run("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await?;
//!     println!("Acquired {} transcript(s)", report.acquired);
//!
//!     Ok(())
//! }
//! ```

pub mod acquisition;
pub mod audio;
pub mod cli;
pub mod clip;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod openai;
pub mod source;
pub mod subtitle;
pub mod transcription;

pub use error::{KlippError, Result};
