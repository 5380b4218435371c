//! Context retrieval with a whole-corpus fallback for small collections

use crate::error::Result;
use crate::storage::{Collection, CollectionStore};
use crate::types::RetrievalResult;

/// Separator between retrieved texts
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Builds prompt context from a client's collections
pub struct RetrievalEngine {
    store: CollectionStore,
}

impl RetrievalEngine {
    pub fn new(store: CollectionStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    /// Retrieve context for `query` from a client's collection
    pub async fn get_context(
        &self,
        client_id: &str,
        collection: &str,
        query: &str,
        num_retrieve: usize,
        score_threshold: f32,
    ) -> Result<RetrievalResult> {
        let collection = self.store.open(client_id, collection)?;
        context_for(&collection, query, num_retrieve, score_threshold).await
    }
}

/// Retrieve context from an open collection.
///
/// A collection holding at most `num_retrieve` chunks is returned whole.
/// Larger ones are searched, keeping up to `num_retrieve` matches scoring
/// at least `score_threshold`, in ranking order.
pub async fn context_for(
    collection: &Collection,
    query: &str,
    num_retrieve: usize,
    score_threshold: f32,
) -> Result<RetrievalResult> {
    let count = collection.count().await?;

    if count <= num_retrieve {
        let texts = collection.all_texts().await?;
        tracing::debug!(
            "'{}': {} chunk(s) stored, {} requested, returning everything",
            collection.name(),
            count,
            num_retrieve
        );
        return Ok(RetrievalResult {
            context: texts.join(CONTEXT_SEPARATOR),
            diagnostic: format!("Too many requested. {} returned.", texts.len()),
        });
    }

    let matches = collection
        .similarity_search(query, num_retrieve, score_threshold)
        .await?;
    tracing::debug!(
        "'{}': {} of {} requested chunk(s) scored at least {}",
        collection.name(),
        matches.len(),
        num_retrieve,
        score_threshold
    );

    let texts: Vec<&str> = matches.iter().map(|m| m.text.as_str()).collect();
    Ok(RetrievalResult {
        context: texts.join(CONTEXT_SEPARATOR),
        diagnostic: format!("{} requested, {} retrieved.", num_retrieve, matches.len()),
    })
}
