//! Entry points used by the chat front end

use std::path::Path;
use std::sync::Arc;

use crate::config::HubConfig;
use crate::error::Result;
use crate::ingestion::{DocumentLoader, IngestionPipeline};
use crate::providers::{EmbeddingProvider, OllamaEmbedder};
use crate::retrieval::RetrievalEngine;
use crate::storage::{CollectionStore, ReconcileReport};
use crate::types::{PathReport, RetrievalResult};

/// Shared ingestion and retrieval state
#[derive(Clone)]
pub struct KnowledgeHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    pipeline: IngestionPipeline,
    retrieval: RetrievalEngine,
}

impl KnowledgeHub {
    /// Build a hub around an explicitly constructed embedding provider
    pub fn new(config: HubConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        Self::with_loader(config, embedder, DocumentLoader::new())
    }

    /// Build a hub with a custom set of loaders
    pub fn with_loader(
        config: HubConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        loader: DocumentLoader,
    ) -> Result<Self> {
        config.validate()?;
        let store = CollectionStore::new(config.storage.clone(), embedder);
        let pipeline = IngestionPipeline::new(store.clone(), loader, &config.chunking)?;
        let retrieval = RetrievalEngine::new(store);

        Ok(Self {
            inner: Arc::new(HubInner {
                config,
                pipeline,
                retrieval,
            }),
        })
    }

    /// Build a hub embedding through the configured Ollama server
    pub fn with_ollama(config: HubConfig) -> Result<Self> {
        let embedder = Arc::new(OllamaEmbedder::new(&config.ollama)?);
        tracing::info!(
            "Using Ollama at {} ({})",
            config.ollama.base_url,
            config.ollama.embed_model
        );
        Self::new(config, embedder)
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &CollectionStore {
        self.inner.pipeline.store()
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        self.store().embedder()
    }

    /// Ingest a file or a directory tree for a client
    pub async fn add_folder_or_file(&self, client_id: &str, path: &Path) -> Result<PathReport> {
        self.inner.pipeline.ingest_path(client_id, path).await
    }

    /// Retrieve context with explicit policy parameters
    pub async fn get_context(
        &self,
        client_id: &str,
        collection: &str,
        query: &str,
        num_retrieve: usize,
        score_threshold: f32,
    ) -> Result<RetrievalResult> {
        self.inner
            .retrieval
            .get_context(client_id, collection, query, num_retrieve, score_threshold)
            .await
    }

    /// Retrieve context with the configured defaults
    pub async fn context(&self, client_id: &str, collection: &str, query: &str) -> Result<RetrievalResult> {
        let policy = self.inner.config.retrieval;
        self.get_context(
            client_id,
            collection,
            query,
            policy.num_retrieve,
            policy.score_threshold,
        )
        .await
    }

    /// Names of the client's collections
    pub fn list_collections(&self, client_id: &str) -> Result<Vec<String>> {
        self.store().list(client_id)
    }

    /// Delete a collection's records and index
    pub async fn clear_collection(&self, client_id: &str, collection: &str) -> Result<()> {
        self.store().open(client_id, collection)?.clear().await
    }

    /// Remove indexed content that has no ingestion record
    pub async fn reconcile(&self, client_id: &str, collection: &str) -> Result<ReconcileReport> {
        self.store().open(client_id, collection)?.reconcile().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{load_text, HashEmbedder};
    use std::fs;

    fn hub(base: &Path) -> KnowledgeHub {
        let mut config = HubConfig::default();
        config.storage.base_directory = base.to_path_buf();
        config.retrieval.num_retrieve = 1;

        let mut loader = DocumentLoader::new();
        loader.register("txt", load_text);
        KnowledgeHub::with_loader(config, Arc::new(HashEmbedder::default()), loader).unwrap()
    }

    #[tokio::test]
    async fn test_ingest_list_query_clear() {
        let store_dir = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let root = docs.path().join("plant");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("pumps.txt"), "pump maintenance schedule").unwrap();
        fs::write(root.join("budget.txt"), "annual budget numbers").unwrap();

        let hub = hub(store_dir.path());
        let report = hub.add_folder_or_file("bob@box", &root).await.unwrap();
        assert_eq!(report.collection(), "plant");
        assert_eq!(hub.list_collections("bob@box").unwrap(), vec!["plant"]);

        let result = hub.context("bob@box", "plant", "pump").await.unwrap();
        assert_eq!(result.diagnostic, "1 requested, 1 retrieved.");
        assert_eq!(result.context, "pump maintenance schedule");

        assert!(hub.reconcile("bob@box", "plant").await.unwrap().orphan_urls.is_empty());

        hub.clear_collection("bob@box", "plant").await.unwrap();
        assert!(hub.list_collections("bob@box").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = HubConfig::default();
        config.retrieval.num_retrieve = 0;
        assert!(KnowledgeHub::new(config, Arc::new(HashEmbedder::default())).is_err());
    }
}
