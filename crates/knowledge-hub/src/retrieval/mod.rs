//! Retrieval of prompt context from collections

mod context;

pub use context::{context_for, RetrievalEngine, CONTEXT_SEPARATOR};
