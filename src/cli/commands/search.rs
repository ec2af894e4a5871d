//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::error::KlippError;
use crate::index::CorpusIndex;
use crate::subtitle::{format_timestamp, TranscriptStore};
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: Option<usize>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&format!("{}", e));
        Output::info("Run 'klipp doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let limit = limit.unwrap_or(settings.search.default_limit);

    let store = TranscriptStore::new(settings.subs_dir());
    let embedder = OpenAIEmbedder::with_config(
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    );

    // The corpus is rebuilt per invocation; a long-lived host would build
    // once and reuse the index across queries.
    let spinner = Output::spinner("Indexing transcripts...");
    let index = CorpusIndex::build(&store, &embedder).await;
    spinner.finish_and_clear();

    let index = match index {
        Ok(index) => index,
        Err(e) => {
            Output::error(&format!("Index build failed: {}", e));
            return Err(e.into());
        }
    };

    let spinner = Output::spinner("Searching...");
    let results = index.search(&embedder, query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) if hits.is_empty() => {
            Output::warning("No results above the relevance threshold.");
        }
        Ok(hits) => {
            Output::success(&format!("Found {} result(s)", hits.len()));

            for (i, hit) in hits.iter().enumerate() {
                Output::search_hit(
                    i + 1,
                    &hit.video_id,
                    &format_timestamp(hit.start_seconds),
                    hit.score,
                    &hit.text,
                    &hit.watch_url(),
                );
            }

            println!();
            Output::info("Render a clip with: klipp clip <video_id> <start_seconds> \"<caption>\"");
        }
        Err(KlippError::EmptyCorpus) => {
            Output::warning("The transcript store is empty.");
            Output::info("Acquire transcripts first: klipp acquire <url>");
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
