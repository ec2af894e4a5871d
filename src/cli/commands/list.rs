//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::subtitle::{parse_vtt, TranscriptStore};
use anyhow::Result;

/// Run the list command.
pub fn run_list(settings: Settings) -> Result<()> {
    let store = TranscriptStore::new(settings.subs_dir());
    let files = store.list()?;

    if files.is_empty() {
        Output::info("No transcripts acquired yet. Use 'klipp acquire <url>' to add content.");
        return Ok(());
    }

    Output::header(&format!("Acquired Transcripts ({})", files.len()));
    println!();

    let mut total_cues = 0usize;

    for path in &files {
        let Some(video_id) = TranscriptStore::video_id_of(path) else {
            continue;
        };

        let content = std::fs::read_to_string(path)?;
        match parse_vtt(&content) {
            Ok(cues) => {
                let duration = cues.last().map(|c| c.end_seconds).unwrap_or(0.0);
                total_cues += cues.len();
                Output::transcript_info(&video_id, cues.len(), duration);
            }
            Err(_) => {
                Output::transcript_info(&video_id, 0, 0.0);
            }
        }
    }

    println!();
    Output::kv("Total videos", &files.len().to_string());
    Output::kv("Total cues", &total_cues.to_string());

    Ok(())
}
