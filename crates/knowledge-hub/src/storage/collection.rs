//! Collections: a vector index paired with its ingestion records

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, LocalVectorIndex, ScoredText, VectorIndex};
use crate::types::{IngestionRecord, RecordMatch, ScalarMetadata};

use super::records::RecordLog;

/// Index entries removed by [`Collection::reconcile`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Source paths that had indexed content but no record
    pub orphan_urls: Vec<String>,
    pub removed_entries: usize,
}

/// A named vector index and record table owned by one client
pub struct Collection {
    name: String,
    index: Arc<dyn VectorIndex>,
    records: RecordLog,
}

impl Collection {
    pub fn new(name: impl Into<String>, index: Arc<dyn VectorIndex>, records: RecordLog) -> Self {
        Self {
            name: name.into(),
            index,
            records,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if any record matches any field of `query`
    pub fn contains(&self, query: &RecordMatch) -> Result<bool> {
        self.records.contains(&self.name, query)
    }

    /// Ingestion records in insertion order
    pub fn records(&self) -> Result<Vec<IngestionRecord>> {
        self.records.records(&self.name)
    }

    /// Store chunk texts and the record for their source file.
    ///
    /// The index is written first. If the record cannot be written the
    /// entries just added are deleted again before the error is returned.
    pub async fn append(
        &self,
        texts: &[String],
        metadatas: &[ScalarMetadata],
        record: IngestionRecord,
    ) -> Result<usize> {
        let ids = self.index.add_texts(texts, metadatas).await?;

        if let Err(e) = self.records.insert(&self.name, record) {
            tracing::warn!(
                "Record write failed for collection '{}', removing {} indexed chunk(s): {}",
                self.name,
                ids.len(),
                e
            );
            if let Err(rollback) = self.index.delete(&ids).await {
                tracing::error!(
                    "Rollback failed for collection '{}': {}. Run reconcile to remove orphans",
                    self.name,
                    rollback
                );
            }
            return Err(e);
        }

        Ok(ids.len())
    }

    /// Number of stored chunks
    pub async fn count(&self) -> Result<usize> {
        self.index.count().await
    }

    /// Every stored chunk text in insertion order
    pub async fn all_texts(&self) -> Result<Vec<String>> {
        self.index.get_all().await
    }

    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        score_threshold: f32,
    ) -> Result<Vec<ScoredText>> {
        self.index.similarity_search(query, k, score_threshold).await
    }

    /// Drop the record table and delete the index data. Irreversible.
    ///
    /// Records go first: if the index cannot be removed afterwards, what is
    /// left are unrecorded entries that [`Collection::reconcile`] deletes.
    pub async fn clear(&self) -> Result<()> {
        self.records.drop_table(&self.name)?;
        if let Err(e) = self.index.destroy().await {
            tracing::error!(
                "Records of '{}' dropped but its index remains: {}. Run reconcile to remove it",
                self.name,
                e
            );
            return Err(Error::vector_index(format!(
                "Failed to clear '{}' ({}); run reconcile to remove the remaining entries",
                self.name, e
            )));
        }
        tracing::info!("Cleared collection '{}'", self.name);
        Ok(())
    }

    /// Remove indexed content whose source path has no record
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let recorded: Vec<String> = self.records()?.into_iter().map(|r| r.url).collect();
        let mut report = ReconcileReport::default();

        for url in self.index.urls().await? {
            if recorded.contains(&url) {
                continue;
            }
            report.removed_entries += self.index.delete_by_url(&url).await?;
            report.orphan_urls.push(url);
        }

        if !report.orphan_urls.is_empty() {
            tracing::warn!(
                "Collection '{}': removed {} orphaned chunk(s) from {} source(s)",
                self.name,
                report.removed_entries,
                report.orphan_urls.len()
            );
        }
        Ok(report)
    }
}

/// Opens collections under `<base>/<client_id>/`
#[derive(Clone)]
pub struct CollectionStore {
    config: StorageConfig,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl CollectionStore {
    pub fn new(config: StorageConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { config, embedder }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Root directory of a client namespace
    pub fn client_root(&self, client_id: &str) -> Result<PathBuf> {
        check_segment("client id", client_id)?;
        Ok(self.config.base_directory.join(client_id))
    }

    /// `<client root>/<prefix><name>`
    pub fn index_dir(&self, client_id: &str, name: &str) -> Result<PathBuf> {
        check_segment("collection name", name)?;
        Ok(self
            .client_root(client_id)?
            .join(format!("{}{}", self.config.content_prefix, name)))
    }

    /// Open (or lazily create) a collection
    pub fn open(&self, client_id: &str, name: &str) -> Result<Collection> {
        let index = LocalVectorIndex::open(self.index_dir(client_id, name)?, self.embedder.clone())?;
        let records = RecordLog::new(self.client_root(client_id)?.join(&self.config.record_file));
        Ok(Collection::new(name, Arc::new(index), records))
    }

    /// Collections persisted for a client, sorted by name
    pub fn list(&self, client_id: &str) -> Result<Vec<String>> {
        let root = self.client_root(client_id)?;
        let entries = match std::fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(name) = file_name
                .to_str()
                .and_then(|n| n.strip_prefix(&self.config.content_prefix))
            {
                if !name.is_empty() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Reject names that would escape their parent directory
fn check_segment(what: &str, value: &str) -> Result<()> {
    if value.is_empty()
        || value == "."
        || value.contains("..")
        || value.contains(['/', '\\'])
    {
        return Err(Error::config(format!("Invalid {}: '{}'", what, value)));
    }
    Ok(())
}
