//! Core types for the knowledge hub

pub mod document;
pub mod outcome;
pub mod record;

pub use document::{Chunk, Document, Metadata, MetadataValue, ScalarMetadata};
pub use outcome::{DirectoryReport, FileFailure, IngestOutcome, PathReport, RetrievalResult};
pub use record::{IngestionRecord, RecordMatch};
