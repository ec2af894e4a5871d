//! Error types for Klipp.

use thiserror::Error;

/// Library-level error type for Klipp operations.
#[derive(Error, Debug)]
pub enum KlippError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not resolve URL: {0}")]
    UrlResolve(String),

    #[error("Subtitle fetch failed: {0}")]
    SubtitleFetch(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Malformed subtitle file: {0}")]
    SubtitleParse(String),

    #[error("No usable cues in the transcript store")]
    EmptyCorpus,

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Clip download failed: {0}")]
    ClipDownload(String),

    #[error("Clip encoding failed: {0}")]
    ClipEncode(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Klipp operations.
pub type Result<T> = std::result::Result<T, KlippError>;
