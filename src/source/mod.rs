//! Remote video platform access.
//!
//! The download capability is modeled as a trait so the acquisition and clip
//! pipelines can run against a mock in tests. The production implementation
//! shells out to yt-dlp.

mod ytdlp;

pub use ytdlp::YtDlpDownloader;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// One video entry resolved from a URL.
#[derive(Debug, Clone)]
pub struct VideoEntry {
    /// Platform video id.
    pub id: String,
    /// Title, when the platform listing provides one.
    pub title: Option<String>,
    /// Canonical watch URL.
    pub url: String,
}

impl VideoEntry {
    /// Build an entry from a bare video id.
    pub fn from_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: None,
            url: watch_url(id),
        }
    }

    /// Display name for progress output.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Result of resolving a user-supplied URL.
#[derive(Debug, Clone)]
pub enum ResolvedUrl {
    /// A single video.
    Video(VideoEntry),
    /// A playlist or channel, flat-scanned in listing order.
    Playlist(Vec<VideoEntry>),
}

impl ResolvedUrl {
    /// Flatten into the ordered list of videos to process.
    pub fn into_entries(self) -> Vec<VideoEntry> {
        match self {
            ResolvedUrl::Video(entry) => vec![entry],
            ResolvedUrl::Playlist(entries) => entries,
        }
    }
}

/// Download capability of the video platform.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Resolve a URL to a single video or a flat playlist listing.
    async fn resolve(&self, url: &str) -> Result<ResolvedUrl>;

    /// Request the platform's native or auto-generated subtitles.
    ///
    /// Best-effort: a clean return does not guarantee a file materialized.
    /// Callers must check the transcript store afterwards; file existence is
    /// the only success signal.
    async fn fetch_subtitles(&self, video: &VideoEntry, language: &str, dest_dir: &Path)
        -> Result<()>;

    /// Download best-available audio for a video as MP3.
    async fn download_audio(&self, video: &VideoEntry, dest_dir: &Path) -> Result<PathBuf>;

    /// Download a short media window starting at `start_seconds`, bounded to
    /// a modest resolution, merged to MP4. Fails with `ClipDownload` when no
    /// media file results.
    async fn download_clip_window(
        &self,
        video_id: &str,
        start_seconds: f64,
        duration_seconds: f64,
        dest_dir: &Path,
    ) -> Result<PathBuf>;
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Watch URL seeking to an offset. Convenience link, not authoritative.
pub fn watch_url_at(video_id: &str, seconds: u64) -> String {
    format!("https://www.youtube.com/watch?v={}&t={}s", video_id, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_urls() {
        assert_eq!(
            watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
        assert_eq!(
            watch_url_at("dQw4w9WgXcQ", 63),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=63s"
        );
    }

    #[test]
    fn test_resolved_url_flatten() {
        let single = ResolvedUrl::Video(VideoEntry::from_id("abc123def45"));
        assert_eq!(single.into_entries().len(), 1);

        let playlist = ResolvedUrl::Playlist(vec![
            VideoEntry::from_id("abc123def45"),
            VideoEntry::from_id("xyz987uvw65"),
        ]);
        assert_eq!(playlist.into_entries().len(), 2);
    }
}
