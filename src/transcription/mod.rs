//! Audio transcription capability.
//!
//! Used as the fallback when the platform has no subtitles for a video. The
//! capability maps an audio file to an ordered, finite sequence of
//! timestamped segments; the acquisition pipeline consumes it in a single
//! pass and serializes the result into the transcript store.

mod whisper;

pub use whisper::{is_api_key_configured, WhisperTranscriber};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// A single transcribed segment with timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Transcribed text.
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text,
        }
    }
}

/// Trait for the audio-to-text transcription capability.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file into ordered segments.
    ///
    /// `language` is an ISO 639-1 hint; `initial_prompt` biases the model
    /// toward the expected grammar and script.
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: &str,
        initial_prompt: Option<&str>,
    ) -> Result<Vec<TranscriptSegment>>;
}

/// Built-in priming phrase for a language, used when the configuration does
/// not override it. A short sentence in the target language steers the model
/// toward that language's grammar and script.
pub fn priming_phrase(language: &str) -> Option<&'static str> {
    match language {
        "el" => Some("Αυτό είναι ένα βίντεο στα Ελληνικά."),
        "en" => Some("This is a video in English."),
        "de" => Some("Dies ist ein Video auf Deutsch."),
        "fr" => Some("Ceci est une vidéo en français."),
        "es" => Some("Este es un video en español."),
        "no" => Some("Dette er en video på norsk."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priming_phrase_known_languages() {
        assert!(priming_phrase("el").unwrap().contains("Ελληνικά"));
        assert!(priming_phrase("en").unwrap().contains("English"));
        assert!(priming_phrase("xx").is_none());
    }
}
