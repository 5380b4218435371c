//! knowledge-hub: per-client document collections for retrieval-augmented chat
//!
//! Files and directory trees (PDF, XLSX) are loaded into logical documents,
//! split into overlapping chunks, embedded and stored in named collections
//! together with a record log that prevents re-ingesting the same source.
//! Retrieval returns either a thresholded similarity search or, for small
//! collections, the whole corpus.

pub mod config;
pub mod error;
pub mod hub;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::HubConfig;
pub use error::{Error, Result};
pub use hub::KnowledgeHub;
pub use ingestion::{DocumentLoader, IngestionPipeline};
pub use retrieval::RetrievalEngine;
pub use storage::{Collection, CollectionStore};
pub use types::{
    document::{Chunk, Document},
    outcome::{DirectoryReport, IngestOutcome, PathReport, RetrievalResult},
    record::IngestionRecord,
};
