//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;
use crate::error::Result;

/// Trait for generating text embeddings
///
/// Constructed by the caller and injected into [`CollectionStore`], which
/// hands it to every vector index it opens.
///
/// [`CollectionStore`]: crate::storage::CollectionStore
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch)
    ///
    /// Default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Get embedding dimensions (768 for nomic-embed-text)
    fn dimensions(&self) -> usize;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingEmbedder, HashEmbedder};

    #[test]
    fn test_default_batch_matches_single() {
        let embedder = HashEmbedder::new(64);
        let texts = vec!["pump seal".to_string(), "budget".to_string()];

        let batch = tokio_test::block_on(embedder.embed_batch(&texts)).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], tokio_test::block_on(embedder.embed("pump seal")).unwrap());
        assert!(batch.iter().all(|v| v.len() == embedder.dimensions()));
    }

    #[test]
    fn test_batch_propagates_failure() {
        let texts = vec!["anything".to_string()];
        assert!(tokio_test::block_on(FailingEmbedder.embed_batch(&texts)).is_err());
    }
}
