//! The record-store contract consumed by the query engine.

use thiserror::Error;
use xylem_core::{EntityName, Record};

/// Errors surfaced by a record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which records a scan should deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindFilter {
    /// Fact records only.
    Facts,
    /// Fact and edge records alike.
    Any,
    /// Edge records of exactly this kind.
    Exact(String),
}

/// A streaming scan: records are produced incrementally, in key order,
/// and the underlying read handle is released when the scan is dropped.
pub type RecordScan = Box<dyn Iterator<Item = Result<Record, StoreError>> + Send>;

/// A key-ordered store of fact and edge records.
///
/// Writers are expected to uphold the mirrored-edge invariant: every
/// forward edge `(S, K, T)` is stored alongside its mirror
/// `(T, mirror(K), S)`, so reverse traversal is a scan of the target's
/// own records. The query engine only ever calls [`RecordStore::scan`].
pub trait RecordStore: Send + Sync {
    /// Returns every record whose source equals `source` and whose shape
    /// passes `kinds`, in key order.
    fn scan(&self, source: &EntityName, kinds: KindFilter) -> Result<RecordScan, StoreError>;

    /// Inserts one record. Writing the same record twice is idempotent.
    fn write(&self, record: &Record) -> Result<(), StoreError>;

    /// Flushes buffered writes to durable storage.
    fn flush(&self) -> Result<(), StoreError>;

    /// Number of records in the store.
    fn len(&self) -> usize;

    /// Returns true if the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
