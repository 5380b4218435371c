//! Document ingestion: path resolution, loading, chunking and storage

pub mod chunker;
pub mod loader;
pub mod path;
mod pipeline;

pub use chunker::{filter_complex_metadata, split, TextChunker};
pub use loader::{DocumentLoader, LoadFn};
pub use path::{classify, collection_name_for, enumerate_files, sanitize, PathKind};
pub use pipeline::IngestionPipeline;
