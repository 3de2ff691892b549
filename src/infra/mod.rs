//! Backend abstractions and their in-memory implementations.

pub mod error;
pub mod objects;
pub mod store;
pub mod telemetry;

pub use error::BackendError;
pub use objects::{MemoryObjectStore, ObjectStore};
pub use store::{
    Document, EntityStore, IndexSpec, ItemKey, MemoryStore, ScanCondition, ScanPage, TableSpec,
    TableStatus, from_document, to_document,
};
