//! yt-dlp implementation of the download capability.

use super::{watch_url, MediaDownloader, ResolvedUrl, VideoEntry};
use crate::error::{KlippError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// yt-dlp-backed downloader.
pub struct YtDlpDownloader {
    video_id_regex: Regex,
}

impl YtDlpDownloader {
    pub fn new() -> Self {
        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        Self { video_id_regex }
    }

    /// Extract a video id from a URL or bare id.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Flat-scan a playlist or channel URL into video entries.
    async fn list_playlist(&self, url: &str) -> Result<Vec<VideoEntry>> {
        let output = Command::new("yt-dlp")
            .args([
                "--dump-json",
                "--no-download",
                "--no-warnings",
                "--flat-playlist",
                "--ignore-errors",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    KlippError::ToolNotFound("yt-dlp".to_string())
                } else {
                    KlippError::UrlResolve(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KlippError::UrlResolve(format!(
                "yt-dlp could not scan URL: {}",
                stderr
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut entries = Vec::new();

        for line in stdout.lines() {
            if line.trim().is_empty() {
                continue;
            }

            let Ok(json) = serde_json::from_str::<serde_json::Value>(line) else {
                continue;
            };

            let id = json["id"]
                .as_str()
                .or_else(|| json["url"].as_str())
                .map(|s| self.extract_video_id(s).unwrap_or_else(|| s.to_string()));

            if let Some(video_id) = id {
                entries.push(VideoEntry {
                    url: watch_url(&video_id),
                    title: json["title"].as_str().map(|s| s.to_string()),
                    id: video_id,
                });
            }
        }

        Ok(entries)
    }
}

impl Default for YtDlpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDownloader for YtDlpDownloader {
    #[instrument(skip(self))]
    async fn resolve(&self, url: &str) -> Result<ResolvedUrl> {
        // Single-video URLs resolve offline; only listings shell out.
        if let Some(video_id) = self.extract_video_id(url) {
            return Ok(ResolvedUrl::Video(VideoEntry::from_id(&video_id)));
        }

        info!("Scanning URL for playlist entries");
        let entries = self.list_playlist(url).await?;

        if entries.is_empty() {
            return Err(KlippError::UrlResolve(format!(
                "no videos found at {}",
                url
            )));
        }

        Ok(ResolvedUrl::Playlist(entries))
    }

    #[instrument(skip(self, dest_dir), fields(video_id = %video.id))]
    async fn fetch_subtitles(
        &self,
        video: &VideoEntry,
        language: &str,
        dest_dir: &Path,
    ) -> Result<()> {
        std::fs::create_dir_all(dest_dir)?;

        let template = dest_dir.join(&video.id);

        let result = Command::new("yt-dlp")
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs").arg(language)
            .arg("--sub-format").arg("vtt")
            .arg("--output").arg(template.to_str().unwrap_or_default())
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(&video.url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KlippError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(KlippError::SubtitleFetch(format!(
                    "yt-dlp execution failed: {e}"
                )));
            }
        };

        // A non-zero exit here is not decisive: the caller re-checks the
        // store, and absence of a file is the real "no subtitles" signal.
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp subtitle fetch exited non-zero: {}", stderr.trim());
        }

        Ok(())
    }

    #[instrument(skip(self, dest_dir), fields(video_id = %video.id))]
    async fn download_audio(&self, video: &VideoEntry, dest_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dest_dir)?;

        let target_path = dest_dir.join(format!("temp_{}.mp3", video.id));
        let template = dest_dir.join(format!("temp_{}.%(ext)s", video.id));

        info!("Downloading audio");

        let result = Command::new("yt-dlp")
            .arg("--extract-audio")
            .arg("--audio-format").arg("mp3")
            .arg("--audio-quality").arg("0")
            .arg("--output").arg(template.to_str().unwrap_or_default())
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(&video.url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KlippError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(KlippError::AudioDownload(format!(
                    "yt-dlp execution failed: {e}"
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KlippError::AudioDownload(format!("yt-dlp failed: {stderr}")));
        }

        // yt-dlp may leave a different container despite --audio-format.
        find_downloaded_audio(dest_dir, &video.id, &target_path)
    }

    #[instrument(skip(self, dest_dir))]
    async fn download_clip_window(
        &self,
        video_id: &str,
        start_seconds: f64,
        duration_seconds: f64,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(dest_dir)?;

        let target_path = dest_dir.join(format!("temp_{}.mp4", video_id));
        let template = dest_dir.join(format!("temp_{}.%(ext)s", video_id));
        let section = format!("*{:.1}-{:.1}", start_seconds, start_seconds + duration_seconds);

        debug!("Downloading clip window {}", section);

        let result = Command::new("yt-dlp")
            .arg("--format").arg("bestvideo[height<=480]+bestaudio/best[height<=480]")
            .arg("--download-sections").arg(&section)
            .arg("--force-keyframes-at-cuts")
            .arg("--merge-output-format").arg("mp4")
            .arg("--output").arg(template.to_str().unwrap_or_default())
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(watch_url(video_id))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KlippError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(KlippError::ClipDownload(format!(
                    "yt-dlp execution failed: {e}"
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KlippError::ClipDownload(format!("yt-dlp failed: {stderr}")));
        }

        if !target_path.exists() {
            return Err(KlippError::ClipDownload(
                "no media file produced for clip window".to_string(),
            ));
        }

        Ok(target_path)
    }
}

/// Locate the audio file yt-dlp actually produced for a video id.
fn find_downloaded_audio(dir: &Path, video_id: &str, preferred: &Path) -> Result<PathBuf> {
    if preferred.exists() {
        return Ok(preferred.to_path_buf());
    }

    for ext in &["opus", "m4a", "webm", "ogg"] {
        let candidate = dir.join(format!("temp_{}.{}", video_id, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(KlippError::AudioDownload(
        "audio file not found after download".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        let source = YtDlpDownloader::new();

        assert_eq!(
            source.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );

        assert_eq!(source.extract_video_id("not-a-video-id"), None);
        assert_eq!(
            source.extract_video_id("https://youtube.com/playlist?list=PLtest"),
            None
        );
        assert_eq!(source.extract_video_id(""), None);
    }
}
