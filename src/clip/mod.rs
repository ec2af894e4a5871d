//! Captioned clip synthesis.
//!
//! Turns a (video id, start offset, caption) triple into a cached GIF. The
//! cache key is the output filename itself: identical requests return the
//! existing artifact without touching the network or the encoder.

mod encoder;

pub use encoder::{ClipEncoder, FfmpegEncoder};

use crate::error::Result;
use crate::source::MediaDownloader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Length of the downloaded media window.
pub const CLIP_WINDOW_SECONDS: f64 = 4.0;

/// Output frame rate. Low enough to keep GIFs small, high enough to read as
/// motion.
const OUTPUT_FPS: u32 = 12;

/// Output width; height follows the source aspect ratio.
const OUTPUT_WIDTH: u32 = 480;

/// Caption budget in the filename. Longer captions still render in full;
/// only the cache key is truncated.
const CAPTION_FILENAME_CHARS: usize = 20;

/// Candidate font files, probed in order when no font is configured.
const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:/Windows/Fonts/arial.ttf",
];

/// Reduce a caption to its filename-safe form: alphanumerics and spaces
/// only, trimmed, truncated, spaces underscored. This string is part of the
/// cache key.
pub fn sanitize_caption(caption: &str) -> String {
    let kept: String = caption
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect();

    kept.trim()
        .chars()
        .take(CAPTION_FILENAME_CHARS)
        .collect::<String>()
        .trim_end()
        .replace(' ', "_")
}

/// Strip characters that carry meaning inside an ffmpeg filtergraph.
///
/// Caption text is untrusted and is interpolated into the drawtext filter;
/// quotes, colons, backslashes and percent signs must never reach it raw.
pub fn escape_drawtext(caption: &str) -> String {
    caption
        .chars()
        .filter(|c| !matches!(c, '\'' | '"' | ':' | '\\' | '%'))
        .collect()
}

/// Build the full render filter chain for a caption.
///
/// Resamples to a fixed rate and width, draws the caption in a
/// semi-transparent box near the bottom, then quantizes through a generated
/// palette to keep GIF size and banding under control.
fn build_filter(caption: &str, font_file: Option<&str>) -> String {
    let text = escape_drawtext(caption);

    let font_clause = font_file
        .map(|path| format!("fontfile='{}':", path.replace('\\', "/").replace(':', "\\:")))
        .unwrap_or_default();

    format!(
        "fps={fps},scale={width}:-1,\
         drawtext={font}text='{text}':\
         fontcolor=white:fontsize=24:\
         box=1:boxcolor=black@0.5:boxborderw=5:\
         x=(w-text_w)/2:y=h-text_h-10,\
         split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse",
        fps = OUTPUT_FPS,
        width = OUTPUT_WIDTH,
        font = font_clause,
        text = text,
    )
}

/// Pick the font file to render with: the configured path when it exists,
/// otherwise the first hit in the fallback search list, otherwise none
/// (ffmpeg falls back to its default font).
pub fn resolve_font(configured: Option<&str>) -> Option<String> {
    if let Some(path) = configured {
        if Path::new(path).exists() {
            return Some(path.to_string());
        }
        warn!("Configured font not found: {}", path);
    }

    FONT_SEARCH_PATHS
        .iter()
        .find(|p| Path::new(p).exists())
        .map(|p| p.to_string())
}

/// Clip synthesis pipeline with its capabilities.
pub struct ClipSynthesizer {
    downloader: Arc<dyn MediaDownloader>,
    encoder: Arc<dyn ClipEncoder>,
    clips_dir: PathBuf,
    font_file: Option<String>,
}

impl ClipSynthesizer {
    pub fn new(
        downloader: Arc<dyn MediaDownloader>,
        encoder: Arc<dyn ClipEncoder>,
        clips_dir: PathBuf,
        font_file: Option<String>,
    ) -> Self {
        Self {
            downloader,
            encoder,
            clips_dir,
            font_file,
        }
    }

    /// Deterministic artifact path for a request. The tuple
    /// (video id, whole start second, sanitized caption) is the cache key.
    pub fn artifact_path(&self, video_id: &str, start_seconds: f64, caption: &str) -> PathBuf {
        self.clips_dir.join(format!(
            "{}_{}_{}.gif",
            video_id,
            start_seconds.max(0.0) as u64,
            sanitize_caption(caption)
        ))
    }

    /// Ensure a captioned clip exists and return its path.
    ///
    /// A cache hit performs no network or encoding work. Concurrent calls
    /// for the same key are not coordinated (last writer wins on the temp
    /// file, first finisher wins the cache slot); hosts with concurrent
    /// callers should serialize per key.
    #[instrument(skip(self, caption))]
    pub async fn synthesize(
        &self,
        video_id: &str,
        start_seconds: f64,
        caption: &str,
    ) -> Result<PathBuf> {
        let output_path = self.artifact_path(video_id, start_seconds, caption);

        if output_path.exists() {
            info!("Clip already cached: {}", output_path.display());
            return Ok(output_path);
        }

        std::fs::create_dir_all(&self.clips_dir)?;

        // A crashed or interrupted earlier attempt may have left partial
        // media behind; it must not block this one.
        self.purge_stale_temp(video_id);

        let media_path = self
            .downloader
            .download_clip_window(video_id, start_seconds, CLIP_WINDOW_SECONDS, &self.clips_dir)
            .await?;

        let filter = build_filter(caption, self.font_file.as_deref());
        debug!("Rendering with filter: {}", filter);

        let render_result = self.encoder.render(&media_path, &filter, &output_path).await;

        if let Err(e) = render_result {
            // A broken artifact must never become a cache hit.
            let _ = std::fs::remove_file(&output_path);
            let _ = std::fs::remove_file(&media_path);
            return Err(e);
        }

        if let Err(e) = std::fs::remove_file(&media_path) {
            warn!("Failed to remove intermediate media: {}", e);
        }

        info!("Rendered clip: {}", output_path.display());
        Ok(output_path)
    }

    /// Remove leftover `temp_<videoId>*` files from failed attempts.
    fn purge_stale_temp(&self, video_id: &str) {
        let prefix = format!("temp_{}", video_id);
        let Ok(entries) = std::fs::read_dir(&self.clips_dir) else {
            return;
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(&prefix) {
                debug!("Purging stale temp file: {:?}", name);
                let _ = std::fs::remove_file(entry.path());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KlippError;
    use crate::source::{ResolvedUrl, VideoEntry};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockClipDownloader {
        calls: AtomicUsize,
        succeed: bool,
    }

    impl MockClipDownloader {
        fn new(succeed: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                succeed,
            }
        }
    }

    #[async_trait]
    impl MediaDownloader for MockClipDownloader {
        async fn resolve(&self, _url: &str) -> Result<ResolvedUrl> {
            unreachable!("clip synthesis never resolves URLs")
        }

        async fn fetch_subtitles(
            &self,
            _video: &VideoEntry,
            _language: &str,
            _dest_dir: &Path,
        ) -> Result<()> {
            unreachable!("clip synthesis never fetches subtitles")
        }

        async fn download_audio(&self, _video: &VideoEntry, _dest_dir: &Path) -> Result<PathBuf> {
            unreachable!("clip synthesis never downloads audio")
        }

        async fn download_clip_window(
            &self,
            video_id: &str,
            _start_seconds: f64,
            _duration_seconds: f64,
            dest_dir: &Path,
        ) -> Result<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.succeed {
                return Err(KlippError::ClipDownload("unavailable".to_string()));
            }
            std::fs::create_dir_all(dest_dir)?;
            let path = dest_dir.join(format!("temp_{}.mp4", video_id));
            std::fs::write(&path, b"fake media")?;
            Ok(path)
        }
    }

    struct MockEncoder {
        calls: AtomicUsize,
        succeed: bool,
    }

    impl MockEncoder {
        fn new(succeed: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                succeed,
            }
        }
    }

    #[async_trait]
    impl ClipEncoder for MockEncoder {
        async fn render(&self, _input: &Path, filter: &str, output: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.succeed {
                return Err(KlippError::ClipEncode("boom".to_string()));
            }
            assert!(filter.contains("palettegen"));
            std::fs::write(output, b"fake gif")?;
            Ok(())
        }
    }

    fn synthesizer(
        dir: &Path,
        downloader: Arc<MockClipDownloader>,
        encoder: Arc<MockEncoder>,
    ) -> ClipSynthesizer {
        ClipSynthesizer::new(downloader, encoder, dir.join("gifs"), None)
    }

    #[test]
    fn test_sanitize_caption() {
        assert_eq!(sanitize_caption("hello world"), "hello_world");
        assert_eq!(sanitize_caption("  hello, world!  "), "hello_world");
        assert_eq!(sanitize_caption("don't: panic"), "dont_panic");
        // Unicode letters survive; the budget counts characters.
        assert_eq!(sanitize_caption("γεια σου κόσμε"), "γεια_σου_κόσμε");
        assert_eq!(
            sanitize_caption("a very long caption that keeps going"),
            "a_very_long_caption"
        );
    }

    #[test]
    fn test_escape_drawtext_strips_metacharacters() {
        let escaped = escape_drawtext(r#"it's "fine": 100% \done"#);
        assert!(!escaped.contains('\''));
        assert!(!escaped.contains('"'));
        assert!(!escaped.contains(':'));
        assert!(!escaped.contains('\\'));
        assert!(!escaped.contains('%'));
        assert!(escaped.contains("fine"));
        assert!(escaped.contains("100"));
    }

    #[test]
    fn test_filter_never_contains_raw_caption_metacharacters() {
        let filter = build_filter("don't: break this", None);
        // The only colons left separate drawtext parameters, never caption
        // text; the caption's own quotes and colons are gone.
        assert!(filter.contains("text='dont break this'"));
        assert!(filter.contains("fps=12"));
        assert!(filter.contains("scale=480:-1"));
        assert!(filter.contains("boxcolor=black@0.5"));
    }

    #[test]
    fn test_filter_escapes_font_path_colons() {
        let filter = build_filter("hi there", Some("C:/Windows/Fonts/arial.ttf"));
        assert!(filter.contains("fontfile='C\\:/Windows/Fonts/arial.ttf'"));
    }

    #[test]
    fn test_artifact_path_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(
            dir.path(),
            Arc::new(MockClipDownloader::new(true)),
            Arc::new(MockEncoder::new(true)),
        );

        let a = synth.artifact_path("abc123", 8.7, "hello world");
        let b = synth.artifact_path("abc123", 8.2, "hello world");
        assert_eq!(a, b);
        assert!(a.to_string_lossy().ends_with("abc123_8_hello_world.gif"));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_download_and_encode() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(MockClipDownloader::new(true));
        let encoder = Arc::new(MockEncoder::new(true));
        let synth = synthesizer(dir.path(), downloader.clone(), encoder.clone());

        let first = synth.synthesize("abc123", 8.0, "hello world").await.unwrap();
        assert!(first.exists());
        assert_eq!(downloader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 1);

        let second = synth.synthesize("abc123", 8.0, "hello world").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(downloader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_download_failure_surfaces_and_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(
            dir.path(),
            Arc::new(MockClipDownloader::new(false)),
            Arc::new(MockEncoder::new(true)),
        );

        let err = synth.synthesize("abc123", 8.0, "hello").await.unwrap_err();
        assert!(matches!(err, KlippError::ClipDownload(_)));
        assert!(!synth.artifact_path("abc123", 8.0, "hello").exists());
    }

    #[tokio::test]
    async fn test_encode_failure_leaves_no_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(MockClipDownloader::new(true));
        let encoder = Arc::new(MockEncoder::new(false));
        let synth = synthesizer(dir.path(), downloader.clone(), encoder);

        let err = synth.synthesize("abc123", 8.0, "hello").await.unwrap_err();
        assert!(matches!(err, KlippError::ClipEncode(_)));
        assert!(!synth.artifact_path("abc123", 8.0, "hello").exists());

        // A retry goes back through the full pipeline.
        let retry_encoder = Arc::new(MockEncoder::new(true));
        let synth = synthesizer(dir.path(), downloader.clone(), retry_encoder);
        let path = synth.synthesize("abc123", 8.0, "hello").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_search_hit_drives_clip_synthesis() {
        use crate::embedding::Embedder;
        use crate::index::CorpusIndex;
        use crate::subtitle::{Cue, TranscriptStore};

        // Embedder that maps the cue and a related query onto the same axis.
        struct MiniEmbedder;

        #[async_trait]
        impl Embedder for MiniEmbedder {
            async fn embed(&self, text: &str) -> Result<Vec<f32>> {
                Ok(match text {
                    "hello world" => vec![1.0, 0.0],
                    "greeting" => vec![0.9, 0.1],
                    _ => vec![0.0, 1.0],
                })
            }

            async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
                let mut out = Vec::new();
                for text in texts {
                    out.push(self.embed(text).await?);
                }
                Ok(out)
            }

            fn dimensions(&self) -> usize {
                2
            }

            fn model_id(&self) -> &str {
                "mini"
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path().join("subs"));
        store
            .write("abc123", "en", &[Cue::new(10.0, 12.0, "hello world")])
            .unwrap();

        let embedder = MiniEmbedder;
        let index = CorpusIndex::build(&store, &embedder).await.unwrap();
        let hits = index.search(&embedder, "greeting", 10).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].video_id, "abc123");
        assert_eq!(hits[0].seek_offset_seconds, 8);

        let synth = synthesizer(
            dir.path(),
            Arc::new(MockClipDownloader::new(true)),
            Arc::new(MockEncoder::new(true)),
        );
        let path = synth
            .synthesize(
                &hits[0].video_id,
                hits[0].seek_offset_seconds as f64,
                &hits[0].text,
            )
            .await
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, "abc123_8_hello_world.gif");
    }

    #[tokio::test]
    async fn test_stale_temp_files_are_purged() {
        let dir = tempfile::tempdir().unwrap();
        let gifs = dir.path().join("gifs");
        std::fs::create_dir_all(&gifs).unwrap();
        std::fs::write(gifs.join("temp_abc123.mp4"), b"stale").unwrap();
        std::fs::write(gifs.join("temp_abc123.part"), b"stale").unwrap();

        let synth = synthesizer(
            dir.path(),
            Arc::new(MockClipDownloader::new(true)),
            Arc::new(MockEncoder::new(true)),
        );
        synth.synthesize("abc123", 3.0, "fresh clip").await.unwrap();

        assert!(!gifs.join("temp_abc123.mp4").exists());
        assert!(!gifs.join("temp_abc123.part").exists());
    }
}
