//! Subtitle cue model and WebVTT handling.
//!
//! A transcript is stored as one WebVTT file per video in the transcript
//! store (`subs/` by default). Each cue pairs a start/end timestamp with a
//! single line of caption text.

mod store;
mod vtt;

pub use store::TranscriptStore;
pub use vtt::{parse_vtt, write_vtt};

use serde::{Deserialize, Serialize};

/// One timestamped caption unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Caption text. Trimmed and newline-free.
    pub text: String,
}

impl Cue {
    /// Create a cue, normalizing the text to a single line.
    ///
    /// Internal newlines and runs of whitespace collapse to single spaces.
    pub fn new(start_seconds: f64, end_seconds: f64, text: &str) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: collapse_whitespace(text),
        }
    }

    /// Duration of this cue in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Collapse all whitespace runs (including newlines) to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a `HH:MM:SS.mmm` (or `MM:SS.mmm`) timestamp into seconds.
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let parts: Vec<&str> = value.trim().split(':').collect();

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        [m, s] => (0.0, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        _ => return None,
    };

    if hours < 0.0 || minutes < 0.0 || seconds < 0.0 {
        return None;
    }

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Format seconds as a WebVTT timestamp (`HH:MM:SS.mmm`).
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_collapses_whitespace() {
        let cue = Cue::new(0.0, 2.0, "  hello\nworld  \t again ");
        assert_eq!(cue.text, "hello world again");
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:00:10.000"), Some(10.0));
        assert_eq!(parse_timestamp("00:01:05.000"), Some(65.0));
        assert_eq!(parse_timestamp("01:01:01.500"), Some(3661.5));
        assert_eq!(parse_timestamp("01:05.000"), Some(65.0));
        assert_eq!(parse_timestamp("garbage"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_timestamp(65.0), "00:01:05.000");
        assert_eq!(format_timestamp(3661.123), "01:01:01.123");
    }

    #[test]
    fn test_timestamp_round_trip() {
        for value in [0.0, 1.5, 63.0, 3599.999, 7200.25] {
            let formatted = format_timestamp(value);
            let parsed = parse_timestamp(&formatted).unwrap();
            assert!((parsed - value).abs() < 0.001, "{} -> {}", value, parsed);
        }
    }
}
