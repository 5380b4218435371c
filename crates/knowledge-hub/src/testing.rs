//! Test doubles and fixtures shared by unit tests

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, LocalVectorIndex, ScoredText, VectorIndex};
use crate::storage::CollectionStore;
use crate::types::{Document, ScalarMetadata};

/// Deterministic bag-of-words embedder: each lowercased token adds 1.0 to
/// the bucket picked by its FNV-1a hash
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(1024)
    }
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Embedder whose service is always down
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::embedding("connection refused"))
    }

    fn dimensions(&self) -> usize {
        8
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Local index whose directory cannot be removed
pub struct UndeletableIndex {
    inner: LocalVectorIndex,
}

impl UndeletableIndex {
    pub fn open(dir: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            inner: LocalVectorIndex::open(dir, embedder).unwrap(),
        }
    }
}

#[async_trait]
impl VectorIndex for UndeletableIndex {
    async fn add_texts(&self, texts: &[String], metadatas: &[ScalarMetadata]) -> Result<Vec<String>> {
        self.inner.add_texts(texts, metadatas).await
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        score_threshold: f32,
    ) -> Result<Vec<ScoredText>> {
        self.inner.similarity_search(query, k, score_threshold).await
    }

    async fn get_all(&self) -> Result<Vec<String>> {
        self.inner.get_all().await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }

    async fn delete(&self, ids: &[String]) -> Result<usize> {
        self.inner.delete(ids).await
    }

    async fn delete_by_url(&self, url: &str) -> Result<usize> {
        self.inner.delete_by_url(url).await
    }

    async fn urls(&self) -> Result<BTreeSet<String>> {
        self.inner.urls().await
    }

    async fn destroy(&self) -> Result<()> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "directory is busy",
        )))
    }

    fn name(&self) -> &str {
        "undeletable"
    }
}

/// Collection store rooted at `base` using [`HashEmbedder`]
pub fn test_store(base: &Path) -> CollectionStore {
    CollectionStore::new(
        StorageConfig {
            base_directory: base.to_path_buf(),
            ..StorageConfig::default()
        },
        Arc::new(HashEmbedder::default()),
    )
}

/// Plain-text loader for registering `txt` in tests
pub fn load_text(path: &Path) -> Result<Vec<Document>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::file_parse(path.to_string_lossy(), e.to_string()))?;
    Ok(vec![Document::new(text)])
}

/// Write a PDF with one text line per page
#[cfg(feature = "pdf")]
pub fn write_pdf(path: &Path, pages: &[&str]) {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
