//! Persistent record store backed by sled.

use crate::key;
use crate::store::{KindFilter, RecordScan, RecordStore, StoreError};
use std::path::Path;
use tracing::debug;
use xylem_core::{EntityName, Record};

/// A key-ordered record store on disk.
///
/// Records live under the byte keys of [`crate::key`], so a source scan
/// is a single `scan_prefix` that streams from disk in key order. The
/// kind filter narrows the prefix instead of post-filtering: fact scans
/// and single-kind edge scans never touch unrelated records.
pub struct SledRecordStore {
    db: sled::Db,
}

impl SledRecordStore {
    /// Opens or creates a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        debug!(records = db.len(), "opened record store");
        Ok(Self { db })
    }
}

impl RecordStore for SledRecordStore {
    fn scan(&self, source: &EntityName, kinds: KindFilter) -> Result<RecordScan, StoreError> {
        let prefix = match kinds {
            KindFilter::Facts => key::fact_prefix(source),
            KindFilter::Any => key::source_prefix(source),
            KindFilter::Exact(kind) => key::edge_kind_prefix(source, &kind),
        };
        let iter = self.db.scan_prefix(prefix).map(|item| {
            let (_key, value) = item?;
            bincode::deserialize(&value).map_err(StoreError::from)
        });
        Ok(Box::new(iter))
    }

    fn write(&self, record: &Record) -> Result<(), StoreError> {
        let key = key::record_key(record);
        let value = bincode::serialize(record)?;
        self.db.insert(key, value)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.db.len()
    }
}
