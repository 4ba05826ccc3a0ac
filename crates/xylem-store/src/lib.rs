//! Xylem Store - the ordered fact/edge record store.
//!
//! This crate provides the storage side of Xylem: a key-ordered store of
//! [`Record`](xylem_core::Record)s queried by source entity plus an
//! optional edge-kind filter. The query engine consumes it through the
//! [`RecordStore`] trait and never sees the representation.
//!
//! Two implementations are provided:
//! - [`SledRecordStore`]: persistent, backed by sled, scans stream from
//!   disk in key order.
//! - [`MemoryRecordStore`]: a `BTreeMap` over the same key encoding, for
//!   tests and in-process tooling.
//!
//! The [`key`] module defines the total order records sort into. The same
//! order is the contract of the `stream --sort` tool, so sorted streams
//! can be bulk-loaded without re-sorting.
//!
//! The [`wire`] module frames record streams between processes:
//! length-delimited binary and line-delimited JSON.

mod memory;
mod sled_store;
mod store;

pub mod key;
pub mod wire;

pub use memory::MemoryRecordStore;
pub use sled_store::SledRecordStore;
pub use store::{KindFilter, RecordScan, RecordStore, StoreError};
