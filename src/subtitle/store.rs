//! Filesystem-backed transcript store.
//!
//! One WebVTT file per video, named `<videoId>.<lang>.vtt`. The existence of
//! any file whose name starts with the video id is the cache signal: a video
//! with a matching file has already been acquired and is never re-fetched.

use super::{write_vtt, Cue};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory of per-video transcript files.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    root: PathBuf,
}

impl TranscriptStore {
    /// Create a store rooted at the given directory. The directory is not
    /// created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a transcript in the store's naming scheme.
    pub fn path_for(&self, video_id: &str, language: &str) -> PathBuf {
        self.root.join(format!("{}.{}.vtt", video_id, language))
    }

    /// Find any existing transcript file for a video.
    ///
    /// Matches on the filename prefix so both `<id>.<lang>.vtt` and files
    /// written by external tools with extra suffixes are recognized.
    pub fn find_for_video(&self, video_id: &str) -> Result<Option<PathBuf>> {
        if !self.root.exists() {
            return Ok(None);
        }

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(video_id) && name.ends_with(".vtt") {
                return Ok(Some(entry.path()));
            }
        }

        Ok(None)
    }

    /// Write a transcript, creating the store directory if needed.
    ///
    /// Transcripts are immutable once written; callers are expected to check
    /// `find_for_video` first.
    pub fn write(&self, video_id: &str, language: &str, cues: &[Cue]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root)?;

        let path = self.path_for(video_id, language);
        std::fs::write(&path, write_vtt(cues))?;
        debug!("Wrote {} cues to {}", cues.len(), path.display());

        Ok(path)
    }

    /// Enumerate every transcript file in the store.
    ///
    /// Returns an empty list when the store directory does not exist yet.
    /// Enumeration order follows the filesystem and is only stable within
    /// one call.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "vtt") {
                files.push(path);
            }
        }

        Ok(files)
    }

    /// Extract the owning video id from a transcript file path.
    ///
    /// The id is the filename up to the first `.` (e.g. `abc123.el.vtt`).
    pub fn video_id_of(path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        let id = name.split('.').next()?;
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cues() -> Vec<Cue> {
        vec![
            Cue::new(10.0, 12.5, "hello world"),
            Cue::new(12.5, 15.0, "second cue"),
        ]
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path().join("does-not-exist"));

        assert!(store.list().unwrap().is_empty());
        assert!(store.find_for_video("abc123").unwrap().is_none());
    }

    #[test]
    fn test_write_then_find() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path());

        let path = store.write("abc123", "en", &sample_cues()).unwrap();
        assert_eq!(path, store.path_for("abc123", "en"));
        assert!(path.exists());

        let found = store.find_for_video("abc123").unwrap();
        assert_eq!(found, Some(path));
        assert!(store.find_for_video("other").unwrap().is_none());
    }

    #[test]
    fn test_list_only_vtt() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path());

        store.write("abc123", "en", &sample_cues()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = store.list().unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_video_id_of() {
        assert_eq!(
            TranscriptStore::video_id_of(Path::new("subs/abc123.el.vtt")),
            Some("abc123".to_string())
        );
        assert_eq!(
            TranscriptStore::video_id_of(Path::new("subs/abc123.vtt")),
            Some("abc123".to_string())
        );
        assert_eq!(TranscriptStore::video_id_of(Path::new("subs/.vtt")), None);
    }
}
