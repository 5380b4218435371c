//! Outcomes reported by the ingestion pipeline and the retrieval engine

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of ingesting a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum IngestOutcome {
    /// Chunks were embedded and a record written
    Ingested { chunks: usize },
    /// A record for this path already exists
    AlreadyIngested,
    /// The loader produced no documents
    EmptyDocument,
    /// Chunking and filtering left no text
    NoContent,
}

impl IngestOutcome {
    pub fn is_ingested(&self) -> bool {
        matches!(self, IngestOutcome::Ingested { .. })
    }

    /// Chunks written by this ingestion
    pub fn chunks(&self) -> usize {
        match self {
            IngestOutcome::Ingested { chunks } => *chunks,
            _ => 0,
        }
    }
}

/// A file that was skipped during directory ingestion because of a
/// non-fatal error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Per-file results of a directory ingestion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryReport {
    /// Collection the directory was ingested into
    pub collection: String,
    /// Files handed to the pipeline, in processing order
    pub outcomes: Vec<(PathBuf, IngestOutcome)>,
    /// Files that were reported and skipped
    pub failures: Vec<FileFailure>,
}

impl DirectoryReport {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    /// Number of files that produced a new record
    pub fn ingested_files(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_ingested())
            .count()
    }

    /// Total chunks written across the directory
    pub fn total_chunks(&self) -> usize {
        self.outcomes.iter().map(|(_, outcome)| outcome.chunks()).sum()
    }
}

/// Result of `add_folder_or_file`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PathReport {
    File {
        collection: String,
        path: PathBuf,
        outcome: IngestOutcome,
    },
    Directory(DirectoryReport),
}

impl PathReport {
    pub fn collection(&self) -> &str {
        match self {
            PathReport::File { collection, .. } => collection,
            PathReport::Directory(report) => &report.collection,
        }
    }
}

/// Context handed to the chat layer along with a human-readable summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Retrieved texts joined by a blank line
    pub context: String,
    /// e.g. `"30 requested, 12 retrieved."`
    pub diagnostic: String,
}

impl RetrievalResult {
    /// Wrap a user question with the retrieved context
    pub fn augment_prompt(&self, question: &str) -> String {
        format!(
            "Here is the related context\n\n {}.\n\nAnswer the following question: {}",
            self.context, question
        )
    }
}
