//! In-memory corpus index and semantic search.
//!
//! The index flattens every transcript in the store into one list of cues
//! with a parallel list of embedding vectors. It is rebuilt wholesale (at
//! startup or on explicit reload) and never patched in place, so
//! `embeddings[i]` always describes `cues[i]`.

use crate::embedding::Embedder;
use crate::error::{KlippError, Result};
use crate::source::watch_url_at;
use crate::subtitle::{parse_vtt, TranscriptStore};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Cues shorter than this after cleanup are noise and are not indexed.
pub const MIN_CUE_CHARS: usize = 3;

/// Hits scoring below this are never surfaced: unrelated cues still get
/// nonzero cosine similarity.
pub const RELEVANCE_FLOOR: f32 = 0.25;

/// Playback rewind applied to every hit so the clip starts just before the
/// spoken moment.
pub const SEEK_REWIND_SECONDS: u64 = 2;

/// One indexed caption cue with its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedCue {
    /// Owning video id.
    pub video_id: String,
    /// Cue start, seconds since video start.
    pub start_seconds: f64,
    /// Cleaned caption text.
    pub text: String,
}

/// A ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// Owning video id.
    pub video_id: String,
    /// Matched cue text.
    pub text: String,
    /// Cue start, seconds since video start.
    pub start_seconds: f64,
    /// Cosine similarity clamped to [0, 1].
    pub score: f32,
    /// Rewound, clamped playback offset in whole seconds.
    pub seek_offset_seconds: u64,
}

impl SearchHit {
    /// Watch URL seeking to this hit's offset.
    pub fn watch_url(&self) -> String {
        watch_url_at(&self.video_id, self.seek_offset_seconds)
    }
}

/// The searchable corpus: all cues across all transcripts plus one embedding
/// per cue.
pub struct CorpusIndex {
    cues: Vec<IndexedCue>,
    embeddings: Vec<Vec<f32>>,
    model: String,
}

impl CorpusIndex {
    /// Build the index from every transcript in the store.
    ///
    /// Files that fail to parse are skipped with a warning; an absent or
    /// empty store yields an empty index, not an error. Embeddings for all
    /// surviving cues are generated in a single batched call.
    #[instrument(skip_all)]
    pub async fn build(store: &TranscriptStore, embedder: &dyn Embedder) -> Result<Self> {
        let files = store.list()?;
        info!("Indexing {} transcript files", files.len());

        let mut cues = Vec::new();

        for path in &files {
            let Some(video_id) = TranscriptStore::video_id_of(path) else {
                warn!("Skipping transcript with unusable name: {}", path.display());
                continue;
            };

            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Skipping unreadable transcript {}: {}", path.display(), e);
                    continue;
                }
            };

            let parsed = match parse_vtt(&content) {
                Ok(p) => p,
                Err(e) => {
                    warn!("Skipping malformed transcript {}: {}", path.display(), e);
                    continue;
                }
            };

            for cue in parsed {
                if cue.text.chars().count() < MIN_CUE_CHARS {
                    continue;
                }
                cues.push(IndexedCue {
                    video_id: video_id.clone(),
                    start_seconds: cue.start_seconds,
                    text: cue.text,
                });
            }
        }

        if cues.is_empty() {
            debug!("No usable cues found; index is empty");
            return Ok(Self {
                cues,
                embeddings: Vec::new(),
                model: embedder.model_id().to_string(),
            });
        }

        let texts: Vec<String> = cues.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        info!("Indexed {} cues", cues.len());

        Ok(Self {
            cues,
            embeddings,
            model: embedder.model_id().to_string(),
        })
    }

    /// Number of indexed cues.
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the index holds no cues.
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Identity of the model the corpus was embedded with.
    pub fn model_id(&self) -> &str {
        &self.model
    }

    /// Rank corpus cues against a free-text query.
    ///
    /// Returns at most `top_k` hits in descending score order, with hits
    /// below the relevance floor discarded. A query over an empty index is
    /// `EmptyCorpus`; a query with no hit above the floor is an empty list.
    #[instrument(skip(self, embedder))]
    pub async fn search(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        if self.is_empty() {
            return Err(KlippError::EmptyCorpus);
        }

        if embedder.model_id() != self.model {
            return Err(KlippError::Config(format!(
                "query embedder '{}' does not match corpus model '{}'",
                embedder.model_id(),
                self.model
            )));
        }

        let query_embedding = embedder.embed(query).await?;

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, embedding)| (i, cosine_similarity(&query_embedding, embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        let hits = scored
            .into_iter()
            .filter(|(_, score)| *score >= RELEVANCE_FLOOR)
            .map(|(i, score)| {
                let cue = &self.cues[i];
                SearchHit {
                    video_id: cue.video_id.clone(),
                    text: cue.text.clone(),
                    start_seconds: cue.start_seconds,
                    score: score.clamp(0.0, 1.0),
                    seek_offset_seconds: seek_offset(cue.start_seconds),
                }
            })
            .collect();

        Ok(hits)
    }
}

/// Derive the playback offset for a cue start: rewind a little, never
/// negative.
pub fn seek_offset(start_seconds: f64) -> u64 {
    (start_seconds.max(0.0) as u64).saturating_sub(SEEK_REWIND_SECONDS)
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::Cue;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Deterministic embedder keyed on exact text.
    struct MockEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        model: String,
    }

    impl MockEmbedder {
        fn new(pairs: &[(&str, Vec<f32>)]) -> Self {
            Self {
                vectors: pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                model: "mock-embed".to_string(),
            }
        }
    }

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self
                .vectors
                .get(text)
                .cloned()
                .unwrap_or_else(|| vec![0.0, 0.0, 1.0]))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_id(&self) -> &str {
            &self.model
        }
    }

    fn store_with(videos: &[(&str, Vec<Cue>)]) -> (tempfile::TempDir, TranscriptStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path());
        for (video_id, cues) in videos {
            store.write(video_id, "en", cues).unwrap();
        }
        (dir, store)
    }

    #[tokio::test]
    async fn test_build_filters_short_cues() {
        let (_dir, store) = store_with(&[(
            "abc123",
            vec![
                Cue::new(0.0, 1.0, "ok"),
                Cue::new(1.0, 2.0, "a longer cue"),
                Cue::new(2.0, 3.0, "  \n "),
            ],
        )]);

        let embedder = MockEmbedder::new(&[("a longer cue", vec![1.0, 0.0, 0.0])]);
        let index = CorpusIndex::build(&store, &embedder).await.unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.cues[0].text, "a longer cue");
        assert_eq!(index.cues[0].video_id, "abc123");
    }

    #[tokio::test]
    async fn test_build_skips_malformed_files() {
        let (dir, store) = store_with(&[(
            "good1234567",
            vec![Cue::new(0.0, 1.0, "usable cue text")],
        )]);
        std::fs::write(dir.path().join("bad1234.en.vtt"), "not a vtt file").unwrap();

        let embedder = MockEmbedder::new(&[("usable cue text", vec![1.0, 0.0, 0.0])]);
        let index = CorpusIndex::build(&store, &embedder).await.unwrap();

        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_store_builds_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path().join("missing"));
        let embedder = MockEmbedder::new(&[]);

        let index = CorpusIndex::build(&store, &embedder).await.unwrap();
        assert!(index.is_empty());

        let err = index.search(&embedder, "anything", 5).await.unwrap_err();
        assert!(matches!(err, KlippError::EmptyCorpus));
    }

    #[tokio::test]
    async fn test_search_ranking_floor_and_top_k() {
        let (_dir, store) = store_with(&[(
            "abc123",
            vec![
                Cue::new(10.0, 12.0, "strong match"),
                Cue::new(20.0, 22.0, "medium match"),
                Cue::new(30.0, 32.0, "weak match"),
            ],
        )]);

        let embedder = MockEmbedder::new(&[
            ("strong match", vec![1.0, 0.0, 0.0]),
            ("medium match", vec![0.6, 0.8, 0.0]),
            ("weak match", vec![0.1, 0.995, 0.0]),
            ("query", vec![1.0, 0.0, 0.0]),
        ]);

        let index = CorpusIndex::build(&store, &embedder).await.unwrap();
        let hits = index.search(&embedder, "query", 10).await.unwrap();

        // weak match scores ~0.1, below the floor
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "strong match");
        assert_eq!(hits[1].text, "medium match");
        assert!(hits[0].score >= hits[1].score);
        assert!(hits.iter().all(|h| h.score >= RELEVANCE_FLOOR));
        assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.score)));

        let capped = index.search(&embedder, "query", 1).await.unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn test_search_rejects_model_mismatch() {
        let (_dir, store) = store_with(&[("abc123", vec![Cue::new(0.0, 1.0, "some cue")])]);
        let build_embedder = MockEmbedder::new(&[("some cue", vec![1.0, 0.0, 0.0])]);
        let index = CorpusIndex::build(&store, &build_embedder).await.unwrap();

        let mut other = MockEmbedder::new(&[]);
        other.model = "other-model".to_string();

        let err = index.search(&other, "query", 5).await.unwrap_err();
        assert!(matches!(err, KlippError::Config(_)));
    }

    #[test]
    fn test_seek_offset() {
        assert_eq!(seek_offset(65.0), 63);
        assert_eq!(seek_offset(1.0), 0);
        assert_eq!(seek_offset(0.0), 0);
        assert_eq!(seek_offset(2.0), 0);
        assert_eq!(seek_offset(2.9), 0);
        assert_eq!(seek_offset(3.0), 1);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }
}
