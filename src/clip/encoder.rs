//! Clip rendering via ffmpeg.

use crate::error::{KlippError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Trait for the media-encoding capability: raw media + filter graph in,
/// rendered artifact out.
#[async_trait]
pub trait ClipEncoder: Send + Sync {
    /// Render `input` through `filter` into `output`.
    ///
    /// On failure no artifact may remain at `output`.
    async fn render(&self, input: &Path, filter: &str, output: &Path) -> Result<()>;
}

/// ffmpeg-backed encoder.
pub struct FfmpegEncoder;

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClipEncoder for FfmpegEncoder {
    #[instrument(skip(self, filter), fields(input = %input.display()))]
    async fn render(&self, input: &Path, filter: &str, output: &Path) -> Result<()> {
        debug!("Rendering clip");

        let result = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i").arg(input)
            .arg("-vf").arg(filter)
            .arg("-loglevel").arg("error")
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let outcome = match result {
            Ok(out) if out.status.success() && output.exists() => Ok(()),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                Err(KlippError::ClipEncode(format!("ffmpeg failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(KlippError::ToolNotFound("ffmpeg".into()))
            }
            Err(e) => Err(KlippError::ClipEncode(format!("ffmpeg error: {e}"))),
        };

        if outcome.is_err() {
            // ffmpeg can leave a truncated file behind on failure.
            let _ = std::fs::remove_file(output);
        }

        outcome
    }
}
