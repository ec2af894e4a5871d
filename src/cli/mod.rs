//! CLI module for Klipp.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Klipp - Video Moment Search and Clips
///
/// Acquire video transcripts, search them semantically, and render captioned
/// GIF clips for matched moments. The name "Klipp" comes from the
/// Norwegian/Scandinavian word for "cut" or "clip."
#[derive(Parser, Debug)]
#[command(name = "klipp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Klipp and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Acquire transcripts for a video or playlist URL
    Acquire {
        /// Video or playlist URL (or bare video ID)
        url: String,

        /// Subtitle/transcription language (overrides config)
        #[arg(short, long)]
        lang: Option<String>,

        /// Maximum number of playlist entries to process
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search acquired transcripts for a spoken moment
    Search {
        /// Free-text query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Render a captioned GIF clip for a moment
    Clip {
        /// Video ID
        video_id: String,

        /// Start offset in seconds
        start: f64,

        /// Caption text to overlay
        caption: String,
    },

    /// List acquired transcripts
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
