//! File and directory ingestion into collections

use std::path::Path;
use std::sync::Arc;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::storage::{Collection, CollectionStore};
use crate::types::{
    DirectoryReport, FileFailure, IngestOutcome, IngestionRecord, MetadataValue, PathReport,
    RecordMatch, ScalarMetadata,
};

use super::chunker::{filter_complex_metadata, TextChunker};
use super::loader::DocumentLoader;
use super::path::{classify, collection_name_for, extension_of, scan_directory, title_of, PathKind};

/// Loads, chunks and stores files, skipping sources already recorded
pub struct IngestionPipeline {
    store: CollectionStore,
    loader: Arc<DocumentLoader>,
    chunker: TextChunker,
}

impl IngestionPipeline {
    pub fn new(store: CollectionStore, loader: DocumentLoader, chunking: &ChunkingConfig) -> Result<Self> {
        Ok(Self {
            store,
            loader: Arc::new(loader),
            chunker: TextChunker::from_config(chunking)?,
        })
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn loader(&self) -> &DocumentLoader {
        &self.loader
    }

    /// Open the collection named after `path`
    fn open_for(&self, client_id: &str, path: &Path) -> Result<(String, Collection)> {
        let name = collection_name_for(path);
        if name.is_empty() {
            return Err(Error::NoCollectionName(path.to_path_buf()));
        }
        let collection = self.store.open(client_id, &name)?;
        Ok((name, collection))
    }

    /// Ingest one file into `collection`
    pub async fn ingest_file(&self, path: &Path, collection: &Collection) -> Result<IngestOutcome> {
        let url = path.to_string_lossy().into_owned();

        if collection.contains(&RecordMatch::url(&url))? {
            tracing::info!("Skipping {}: already ingested into '{}'", url, collection.name());
            return Ok(IngestOutcome::AlreadyIngested);
        }

        let loader = Arc::clone(&self.loader);
        let owned = path.to_path_buf();
        let documents = tokio::task::spawn_blocking(move || loader.load(&owned))
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))??;

        if documents.is_empty() {
            tracing::info!("Skipping {}: no documents", url);
            return Ok(IngestOutcome::EmptyDocument);
        }

        let chunks = self.chunker.split_documents(&documents);
        let title = title_of(path);

        let (texts, metadatas): (Vec<String>, Vec<ScalarMetadata>) = chunks
            .into_iter()
            .filter(|chunk| !chunk.text.trim().is_empty())
            .map(|chunk| {
                let mut metadata = filter_complex_metadata(&chunk.metadata);
                metadata.insert("title".to_string(), MetadataValue::from(title.as_str()));
                metadata.insert("url".to_string(), MetadataValue::from(url.as_str()));
                (chunk.text, metadata)
            })
            .unzip();

        if texts.is_empty() {
            tracing::info!("Skipping {}: no content after chunking", url);
            return Ok(IngestOutcome::NoContent);
        }

        tracing::debug!(
            "{}: {} document(s) split into {} chunk(s)",
            url,
            documents.len(),
            texts.len()
        );

        let chunks = collection
            .append(&texts, &metadatas, IngestionRecord::new(&url, &title))
            .await?;

        tracing::info!("Ingested {} ({} chunks) into '{}'", url, chunks, collection.name());
        Ok(IngestOutcome::Ingested { chunks })
    }

    /// Ingest every file below `directory` into the collection named after it.
    ///
    /// Unsupported and unreadable files are reported and skipped; storage
    /// and embedding failures abort the run.
    pub async fn ingest_directory(&self, client_id: &str, directory: &Path) -> Result<DirectoryReport> {
        let (name, collection) = self.open_for(client_id, directory)?;
        let mut report = DirectoryReport::new(&name);

        let scan = scan_directory(directory, |ext| self.loader.supports(ext));
        tracing::info!(
            "Ingesting {} into '{}': {} supported file(s), {} skipped",
            directory.display(),
            name,
            scan.supported.len(),
            scan.unsupported.len()
        );

        for path in scan.unsupported {
            let reason = Error::unsupported(extension_of(&path)).to_string();
            tracing::warn!("Skipping {}: {}", path.display(), reason);
            report.failures.push(FileFailure { path, reason });
        }

        for path in scan.supported {
            match self.ingest_file(&path, &collection).await {
                Ok(outcome) => report.outcomes.push((path, outcome)),
                Err(e) if !e.is_fatal_for_directory() => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    report.failures.push(FileFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::error!("Aborting ingestion of {}: {}", directory.display(), e);
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Finished '{}': {} file(s) ingested, {} chunk(s), {} failure(s)",
            name,
            report.ingested_files(),
            report.total_chunks(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Ingest a file into the collection named after it, or a directory
    /// into the collection named after the directory
    pub async fn ingest_path(&self, client_id: &str, path: &Path) -> Result<PathReport> {
        match classify(path) {
            PathKind::Directory => Ok(PathReport::Directory(
                self.ingest_directory(client_id, path).await?,
            )),
            PathKind::File => {
                let (collection_name, collection) = self.open_for(client_id, path)?;
                let outcome = self.ingest_file(path, &collection).await?;
                Ok(PathReport::File {
                    collection: collection_name,
                    path: path.to_path_buf(),
                    outcome,
                })
            }
            PathKind::Invalid => Err(Error::PathNotFound(path.to_path_buf())),
        }
    }
}
