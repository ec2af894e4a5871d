//! WebVTT parsing and serialization.
//!
//! The parser is deliberately tolerant: it accepts files with or without cue
//! identifiers, ignores `NOTE` and `STYLE` blocks, and joins multi-line cue
//! payloads into a single line. YouTube's auto-generated VTT files carry cue
//! settings after the end timestamp; those are ignored.

use super::{format_timestamp, parse_timestamp, Cue};
use crate::error::{KlippError, Result};

/// Parse a WebVTT document into cues.
///
/// Returns `SubtitleParse` if the document contains no parseable cue at all;
/// individual malformed blocks within an otherwise valid file are skipped.
pub fn parse_vtt(content: &str) -> Result<Vec<Cue>> {
    let mut cues = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        let line = line.trim_start_matches('\u{feff}').trim();

        if line.is_empty() || line.starts_with("WEBVTT") {
            continue;
        }

        // Skip NOTE/STYLE/REGION blocks up to the next blank line.
        if line.starts_with("NOTE") || line.starts_with("STYLE") || line.starts_with("REGION") {
            for skipped in lines.by_ref() {
                if skipped.trim().is_empty() {
                    break;
                }
            }
            continue;
        }

        // A cue identifier line precedes the timing line; look ahead for "-->".
        let next_is_timing = lines.peek().is_some_and(|next| next.contains("-->"));
        let timing_line = if line.contains("-->") {
            line.to_string()
        } else if next_is_timing {
            lines.next().unwrap_or_default().to_string()
        } else {
            continue;
        };

        let Some((start, end)) = parse_timing(&timing_line) else {
            continue;
        };

        let mut text_lines = Vec::new();
        for text_line in lines.by_ref() {
            let text_line = text_line.trim();
            if text_line.is_empty() {
                break;
            }
            text_lines.push(text_line);
        }

        let text = text_lines.join(" ");
        if !text.is_empty() {
            cues.push(Cue::new(start, end, &text));
        }
    }

    if cues.is_empty() {
        return Err(KlippError::SubtitleParse(
            "no cues found in document".to_string(),
        ));
    }

    Ok(cues)
}

/// Parse a `start --> end [settings]` timing line.
fn parse_timing(line: &str) -> Option<(f64, f64)> {
    let (start_raw, rest) = line.split_once("-->")?;
    // Cue settings (align, position, ...) follow the end timestamp.
    let end_raw = rest.trim().split_whitespace().next()?;

    let start = parse_timestamp(start_raw)?;
    let end = parse_timestamp(end_raw)?;
    Some((start, end))
}

/// Serialize cues as a WebVTT document.
pub fn write_vtt(cues: &[Cue]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for cue in cues {
        output.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_timestamp(cue.start_seconds),
            format_timestamp(cue.end_seconds),
            cue.text
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "WEBVTT\n\n00:00:10.000 --> 00:00:12.500\nhello world\n\n00:00:12.500 --> 00:00:15.000\nsecond cue\n";

    #[test]
    fn test_parse_basic() {
        let cues = parse_vtt(SAMPLE).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_seconds, 10.0);
        assert_eq!(cues[0].end_seconds, 12.5);
        assert_eq!(cues[0].text, "hello world");
        assert_eq!(cues[1].text, "second cue");
    }

    #[test]
    fn test_parse_with_identifiers_and_settings() {
        let content = "WEBVTT\n\n1\n00:00:01.000 --> 00:00:02.000 align:start position:0%\nfirst\nline two\n\nNOTE\nsome comment\n\n2\n00:00:02.000 --> 00:00:03.000\nsecond\n";
        let cues = parse_vtt(content).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "first line two");
        assert_eq!(cues[1].text, "second");
    }

    #[test]
    fn test_parse_rejects_cueless_document() {
        assert!(parse_vtt("WEBVTT\n\n").is_err());
        assert!(parse_vtt("not a subtitle file at all").is_err());
    }

    #[test]
    fn test_write_and_reparse() {
        let cues = vec![
            Cue::new(10.0, 12.5, "hello world"),
            Cue::new(12.5, 15.0, "second cue"),
        ];
        let document = write_vtt(&cues);
        assert!(document.starts_with("WEBVTT\n\n"));
        assert!(document.contains("00:00:10.000 --> 00:00:12.500"));

        let parsed = parse_vtt(&document).unwrap();
        assert_eq!(parsed, cues);
    }

    #[test]
    fn test_parse_multiline_cue_collapses_to_one_line() {
        let content = "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nline one\nline two\n";
        let cues = parse_vtt(content).unwrap();
        assert_eq!(cues[0].text, "line one line two");
        assert!(!cues[0].text.contains('\n'));
    }
}
