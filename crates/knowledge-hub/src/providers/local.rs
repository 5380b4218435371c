//! Local vector index persisted as JSON in the collection directory

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{MetadataValue, ScalarMetadata};

use super::embedding::EmbeddingProvider;
use super::vector_index::{ScoredText, VectorIndex};

/// File holding the entries inside the index directory
pub const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    id: String,
    text: String,
    #[serde(default)]
    metadata: ScalarMetadata,
    embedding: Vec<f32>,
}

impl IndexEntry {
    fn url(&self) -> Option<&str> {
        self.metadata.get("url").and_then(MetadataValue::as_str)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexState {
    /// Fixed by the first stored embedding
    dimensions: Option<usize>,
    entries: Vec<IndexEntry>,
}

/// Brute-force cosine index over one collection directory.
///
/// Every operation rereads `index.json`, so handles opened on the same
/// directory see each other's writes.
pub struct LocalVectorIndex {
    dir: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    state: RwLock<IndexState>,
}

impl LocalVectorIndex {
    /// Open the index stored in `dir`.
    ///
    /// The directory is created on the first write, so opening a
    /// collection that was never written leaves no trace on disk.
    pub fn open(dir: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let dir = dir.into();
        let state = load_state(&dir)?;

        tracing::debug!(
            "Opened vector index {} ({} entries)",
            dir.display(),
            state.entries.len()
        );

        Ok(Self {
            dir,
            embedder,
            state: RwLock::new(state),
        })
    }

    /// Directory holding this index
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the state atomically: temp file in the same directory, then rename
    fn persist(&self, state: &IndexState) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, state)?;
            writer.flush()?;
        }
        tmp.persist(self.dir.join(INDEX_FILE))
            .map_err(|e| Error::vector_index(format!("Failed to persist index: {}", e)))?;
        Ok(())
    }

    /// Reload the entries from disk. Other handles on the same directory
    /// may have written since this one last looked.
    fn refresh(&self) -> Result<()> {
        let fresh = load_state(&self.dir)?;
        *self.state.write() = fresh;
        Ok(())
    }

    /// Reload, apply `mutate` and persist, restoring the previous entries
    /// if the write fails
    fn write_with<F>(&self, mutate: F) -> Result<usize>
    where
        F: FnOnce(&mut IndexState) -> Result<usize>,
    {
        let mut state = self.state.write();
        *state = load_state(&self.dir)?;
        let snapshot = state.entries.clone();
        let dimensions = state.dimensions;

        let changed = mutate(&mut state)?;
        if changed == 0 {
            return Ok(0);
        }
        if let Err(e) = self.persist(&state) {
            state.entries = snapshot;
            state.dimensions = dimensions;
            return Err(e);
        }
        Ok(changed)
    }
}

fn load_state(dir: &Path) -> Result<IndexState> {
    let file = dir.join(INDEX_FILE);
    if !file.is_file() {
        return Ok(IndexState::default());
    }
    let reader = BufReader::new(std::fs::File::open(&file)?);
    serde_json::from_reader(reader)
        .map_err(|e| Error::vector_index(format!("Corrupt index {}: {}", file.display(), e)))
}

#[async_trait]
impl VectorIndex for LocalVectorIndex {
    async fn add_texts(&self, texts: &[String], metadatas: &[ScalarMetadata]) -> Result<Vec<String>> {
        if texts.len() != metadatas.len() {
            return Err(Error::vector_index(format!(
                "{} texts but {} metadata entries",
                texts.len(),
                metadatas.len()
            )));
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed_batch(texts).await?;
        if embeddings.len() != texts.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} texts",
                self.embedder.name(),
                embeddings.len(),
                texts.len()
            )));
        }

        let dims = embeddings[0].len();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dims) {
            return Err(Error::vector_index(format!(
                "Inconsistent embedding dimensions in batch: {} and {}",
                dims,
                bad.len()
            )));
        }

        let entries: Vec<IndexEntry> = texts
            .iter()
            .zip(metadatas)
            .zip(embeddings)
            .map(|((text, metadata), embedding)| IndexEntry {
                id: Uuid::new_v4().to_string(),
                text: text.clone(),
                metadata: metadata.clone(),
                embedding,
            })
            .collect();
        let ids: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();

        self.write_with(move |state| {
            if let Some(expected) = state.dimensions {
                if expected != dims {
                    return Err(Error::vector_index(format!(
                        "Embedding dimension mismatch: index holds {}, provider returned {}",
                        expected, dims
                    )));
                }
            }
            state.dimensions.get_or_insert(dims);
            let added = entries.len();
            state.entries.extend(entries);
            Ok(added)
        })?;

        Ok(ids)
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        score_threshold: f32,
    ) -> Result<Vec<ScoredText>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.refresh()?;
        if self.state.read().entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let state = self.state.read();
        let mut scored: Vec<ScoredText> = state
            .entries
            .iter()
            .map(|entry| (entry, cosine_similarity(&query_embedding, &entry.embedding)))
            .filter(|(_, score)| *score >= score_threshold)
            .map(|(entry, score)| ScoredText {
                id: entry.id.clone(),
                text: entry.text.clone(),
                metadata: entry.metadata.clone(),
                score,
            })
            .collect();

        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn get_all(&self) -> Result<Vec<String>> {
        self.refresh()?;
        Ok(self.state.read().entries.iter().map(|e| e.text.clone()).collect())
    }

    async fn count(&self) -> Result<usize> {
        self.refresh()?;
        Ok(self.state.read().entries.len())
    }

    async fn delete(&self, ids: &[String]) -> Result<usize> {
        let ids: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
        self.write_with(|state| {
            let before = state.entries.len();
            state.entries.retain(|e| !ids.contains(e.id.as_str()));
            Ok(before - state.entries.len())
        })
    }

    async fn delete_by_url(&self, url: &str) -> Result<usize> {
        self.write_with(|state| {
            let before = state.entries.len();
            state.entries.retain(|e| e.url() != Some(url));
            Ok(before - state.entries.len())
        })
    }

    async fn urls(&self) -> Result<BTreeSet<String>> {
        self.refresh()?;
        Ok(self
            .state
            .read()
            .entries
            .iter()
            .filter_map(|e| e.url().map(str::to_string))
            .collect())
    }

    async fn destroy(&self) -> Result<()> {
        let mut state = self.state.write();
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir).map_err(|e| {
                Error::vector_index(format!("Failed to remove {}: {}", self.dir.display(), e))
            })?;
        }
        *state = IndexState::default();
        Ok(())
    }

    fn name(&self) -> &str {
        "local-json"
    }
}

/// Cosine similarity, 0.0 for mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::HashEmbedder;

    fn meta(url: &str) -> ScalarMetadata {
        let mut m = ScalarMetadata::new();
        m.insert("url".into(), url.into());
        m
    }

    fn open(dir: &Path) -> LocalVectorIndex {
        LocalVectorIndex::open(dir.join("chroma_db_test"), Arc::new(HashEmbedder::default())).unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_add_and_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let index = open(tmp.path());
        assert!(!index.dir().exists());

        let texts = vec!["pump maintenance".to_string(), "valve inspection".to_string()];
        let ids = index
            .add_texts(&texts, &[meta("/a.pdf"), meta("/a.pdf")])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert!(index.dir().join(INDEX_FILE).is_file());

        let reopened = open(tmp.path());
        assert_eq!(reopened.count().await.unwrap(), 2);
        assert_eq!(reopened.get_all().await.unwrap(), texts);
    }

    #[tokio::test]
    async fn test_search_ranks_and_thresholds() {
        let tmp = tempfile::tempdir().unwrap();
        let index = open(tmp.path());
        let texts = vec![
            "pump pump maintenance".to_string(),
            "quarterly budget review".to_string(),
            "pump seal".to_string(),
        ];
        let metas = vec![meta("/a"), meta("/b"), meta("/c")];
        index.add_texts(&texts, &metas).await.unwrap();

        let hits = index.similarity_search("pump", 10, 0.3).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
        assert!(hits.iter().all(|h| h.text.contains("pump")));

        let top = index.similarity_search("pump", 1, 0.0).await.unwrap();
        assert_eq!(top.len(), 1);
        assert!(index.similarity_search("pump", 0, 0.0).await.unwrap().is_empty());
        assert!(index.similarity_search("pump", 10, 1.01).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_urls() {
        let tmp = tempfile::tempdir().unwrap();
        let index = open(tmp.path());
        let ids = index
            .add_texts(
                &["one".to_string(), "two".to_string(), "three".to_string()],
                &[meta("/a"), meta("/a"), meta("/b")],
            )
            .await
            .unwrap();

        let urls: Vec<String> = index.urls().await.unwrap().into_iter().collect();
        assert_eq!(urls, vec!["/a", "/b"]);

        assert_eq!(index.delete(&ids[2..]).await.unwrap(), 1);
        assert_eq!(index.delete_by_url("/a").await.unwrap(), 2);
        assert!(index.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("chroma_db_dims");
        let index = LocalVectorIndex::open(&dir, Arc::new(HashEmbedder::new(8))).unwrap();
        index.add_texts(&["a".to_string()], &[meta("/a")]).await.unwrap();
        drop(index);

        let wider = LocalVectorIndex::open(&dir, Arc::new(HashEmbedder::new(16))).unwrap();
        let err = wider.add_texts(&["b".to_string()], &[meta("/b")]).await.unwrap_err();
        assert!(matches!(err, Error::VectorIndex(_)));
        assert_eq!(wider.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_handles_on_one_directory_share_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let first = open(tmp.path());
        let second = open(tmp.path());

        second.add_texts(&["from second".to_string()], &[meta("/b")]).await.unwrap();
        first.add_texts(&["from first".to_string()], &[meta("/a")]).await.unwrap();
        assert_eq!(first.count().await.unwrap(), 2);

        let fresh = open(tmp.path());
        assert_eq!(fresh.get_all().await.unwrap(), vec!["from second", "from first"]);

        fresh.delete_by_url("/b").await.unwrap();
        assert_eq!(second.get_all().await.unwrap(), vec!["from first"]);
    }

    #[tokio::test]
    async fn test_destroy_removes_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let index = open(tmp.path());
        index.add_texts(&["x".to_string()], &[meta("/x")]).await.unwrap();

        index.destroy().await.unwrap();
        assert!(!index.dir().exists());
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
