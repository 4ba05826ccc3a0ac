//! In-memory record store for tests and in-process tooling.

use crate::key;
use crate::store::{KindFilter, RecordScan, RecordStore, StoreError};
use std::collections::BTreeMap;
use std::sync::RwLock;
use xylem_core::{EntityName, Record};

/// A `BTreeMap` over the store's key encoding.
///
/// Shares the key codec (and therefore the scan semantics) with
/// [`crate::SledRecordStore`]. Scans materialize the matching range up
/// front; with test-sized data that is fine, and it keeps the lock out
/// of the returned iterator.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<Vec<u8>, Record>>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a batch of records.
    pub fn from_records<I: IntoIterator<Item = Record>>(records: I) -> Result<Self, StoreError> {
        let store = Self::new();
        for record in records {
            store.write(&record)?;
        }
        Ok(store)
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<Vec<u8>, Record>> {
        match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<Vec<u8>, Record>> {
        match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl RecordStore for MemoryRecordStore {
    fn scan(&self, source: &EntityName, kinds: KindFilter) -> Result<RecordScan, StoreError> {
        let prefix = match kinds {
            KindFilter::Facts => key::fact_prefix(source),
            KindFilter::Any => key::source_prefix(source),
            KindFilter::Exact(kind) => key::edge_kind_prefix(source, &kind),
        };
        let matching: Vec<Record> = self
            .lock_read()
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(_, record)| record.clone())
            .collect();
        Ok(Box::new(matching.into_iter().map(Ok)))
    }

    fn write(&self, record: &Record) -> Result<(), StoreError> {
        self.lock_write()
            .insert(key::record_key(record), record.clone());
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn len(&self) -> usize {
        self.lock_read().len()
    }
}
