//! Entity backend contract.
//!
//! The backend is a key-value/document store: point lookups by primary key,
//! limited secondary-index queries, and filtered scans with continuation
//! tokens. Items travel as flat JSON documents.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use super::error::BackendError;

/// A stored item: always a JSON object.
pub type Document = serde_json::Value;

/// Serialize a record into a backend document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, BackendError> {
    Ok(serde_json::to_value(value)?)
}

/// Deserialize a backend document into a record.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, BackendError> {
    Ok(serde_json::from_value(doc)?)
}

/// Primary key of an item; composite for edge and index tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKey {
    Hash(String),
    Composite { hash: String, range: String },
}

impl ItemKey {
    pub fn hash(value: impl Into<String>) -> Self {
        Self::Hash(value.into())
    }

    pub fn composite(hash: impl Into<String>, range: impl Into<String>) -> Self {
        Self::Composite {
            hash: hash.into(),
            range: range.into(),
        }
    }
}

/// Declaration of a table and its secondary indexes.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: String,
    pub hash_key: &'static str,
    pub range_key: Option<&'static str>,
    pub indexes: Vec<IndexSpec>,
}

/// A secondary index over one string attribute, optionally sorted.
#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub name: &'static str,
    pub hash_key: &'static str,
    /// Attribute the index orders by; required for newest-first queries.
    pub sort_key: Option<&'static str>,
}

/// Lifecycle state reported by `describe_table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Active,
}

/// One equality condition applied during a filtered scan.
#[derive(Debug, Clone)]
pub struct ScanCondition {
    pub attr: &'static str,
    pub value: Document,
}

impl ScanCondition {
    pub fn eq(attr: &'static str, value: impl Into<Document>) -> Self {
        Self {
            attr,
            value: value.into(),
        }
    }
}

/// One page of a scan plus the token to resume from, if any.
#[derive(Debug, Clone)]
pub struct ScanPage {
    pub items: Vec<Document>,
    pub next: Option<String>,
}

/// Operations the data-access service requires from the entity backend.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create_table(&self, spec: TableSpec) -> Result<(), BackendError>;

    async fn describe_table(&self, table: &str) -> Result<TableStatus, BackendError>;

    async fn get_item(&self, table: &str, key: &ItemKey) -> Result<Option<Document>, BackendError>;

    async fn put_item(&self, table: &str, item: Document) -> Result<(), BackendError>;

    async fn delete_item(&self, table: &str, key: &ItemKey) -> Result<(), BackendError>;

    /// All items of a composite-key table sharing the given hash key.
    async fn query(&self, table: &str, hash: &str) -> Result<Vec<Document>, BackendError>;

    /// Items matching a secondary-index key, newest first when requested and
    /// the index declares a sort attribute.
    async fn query_index(
        &self,
        table: &str,
        index: &str,
        value: &str,
        newest_first: bool,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, BackendError>;

    /// Filtered scan; enumeration resumes from the continuation token of the
    /// previous page. Result order is unspecified.
    async fn scan(
        &self,
        table: &str,
        filter: &[ScanCondition],
        start: Option<String>,
        limit: Option<usize>,
    ) -> Result<ScanPage, BackendError>;
}
