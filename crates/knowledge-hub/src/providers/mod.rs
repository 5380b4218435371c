//! Provider abstractions for embeddings and vector storage
//!
//! The embedding service and the vector index sit behind traits so the
//! pipeline can run against Ollama in production and fakes in tests.

pub mod embedding;
pub mod local;
pub mod ollama;
pub mod vector_index;

pub use embedding::EmbeddingProvider;
pub use local::LocalVectorIndex;
pub use ollama::OllamaEmbedder;
pub use vector_index::{ScoredText, VectorIndex};
