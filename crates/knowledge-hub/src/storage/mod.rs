//! Persistent collections: vector index plus record log per client

pub mod collection;
pub mod records;

pub use collection::{Collection, CollectionStore, ReconcileReport};
pub use records::RecordLog;
