//! Vector index trait for storing texts and searching them by similarity

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::error::Result;
use crate::types::ScalarMetadata;

/// A stored text matched by a similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredText {
    /// Entry id assigned by `add_texts`
    pub id: String,
    pub text: String,
    pub metadata: ScalarMetadata,
    /// Relevance score (cosine similarity, higher is more similar)
    pub score: f32,
}

/// Trait for a persisted collection of embedded texts
///
/// Implementations:
/// - `LocalVectorIndex`: JSON file per collection with brute-force cosine search
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embed and store texts, returning one entry id per text
    async fn add_texts(&self, texts: &[String], metadatas: &[ScalarMetadata]) -> Result<Vec<String>>;

    /// Up to `k` entries whose relevance to `query` is at least
    /// `score_threshold`, most relevant first
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        score_threshold: f32,
    ) -> Result<Vec<ScoredText>>;

    /// Every stored text in insertion order
    async fn get_all(&self) -> Result<Vec<String>>;

    /// Number of stored entries
    async fn count(&self) -> Result<usize>;

    /// Remove entries by id, returning how many were removed
    async fn delete(&self, ids: &[String]) -> Result<usize>;

    /// Remove every entry whose `url` metadata equals `url`
    async fn delete_by_url(&self, url: &str) -> Result<usize>;

    /// Distinct `url` metadata values across all entries
    async fn urls(&self) -> Result<BTreeSet<String>>;

    /// Delete all persisted data for this index
    async fn destroy(&self) -> Result<()>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.count().await? == 0)
    }

    /// Get index name for logging
    fn name(&self) -> &str;
}
