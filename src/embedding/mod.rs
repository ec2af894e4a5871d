//! Embedding generation for semantic search.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for the text-to-vector embedding capability.
///
/// The corpus index and the search engine must use the same model: vectors
/// from different models share no geometry, and mixing them degrades ranking
/// without any visible error. `model_id` exists so the index can enforce
/// this at query time.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts in one batched call.
    ///
    /// The result is index-aligned with the input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Identity of the underlying model.
    fn model_id(&self) -> &str;
}
