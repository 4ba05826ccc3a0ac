//! The store's key codec and record total order.
//!
//! Every record maps to a unique byte key ordered as
//! `(source, edge_kind, fact_name, target)`. Field bytes are escaped so
//! the `0x00` separator never appears inside a field, which makes the
//! five-field source region self-delimiting: a prefix scan over
//! [`source_prefix`] returns exactly one entity's records, and narrower
//! prefixes select fact-only or single-kind slices of them.
//!
//! Sorting records by these keys is the store order; the stream tool
//! sorts into the same order (see `xylem stream --sort`).

use std::cmp::Ordering;
use xylem_core::{EntityName, Record};

const SEP: u8 = 0x00;
const ESC: u8 = 0x01;

/// Returns the full key of a record.
pub fn record_key(record: &Record) -> Vec<u8> {
    let mut key = source_prefix(&record.source);
    match &record.edge {
        Some(edge) => {
            push_escaped(&mut key, edge.kind.as_bytes());
            key.push(SEP);
            push_escaped(&mut key, record.fact_name.as_bytes());
            key.push(SEP);
            push_name(&mut key, &edge.target);
        }
        None => {
            key.push(SEP);
            push_escaped(&mut key, record.fact_name.as_bytes());
            key.push(SEP);
        }
    }
    key
}

/// Returns the key prefix shared by every record of `source`.
pub fn source_prefix(source: &EntityName) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    push_name(&mut key, source);
    key
}

/// Returns the key prefix of `source`'s fact records.
pub fn fact_prefix(source: &EntityName) -> Vec<u8> {
    let mut key = source_prefix(source);
    key.push(SEP);
    key
}

/// Returns the key prefix of `source`'s edges of one kind.
pub fn edge_kind_prefix(source: &EntityName, kind: &str) -> Vec<u8> {
    let mut key = source_prefix(source);
    push_escaped(&mut key, kind.as_bytes());
    key.push(SEP);
    key
}

/// Compares two records in store order.
pub fn compare(a: &Record, b: &Record) -> Ordering {
    record_key(a).cmp(&record_key(b))
}

fn push_name(key: &mut Vec<u8>, name: &EntityName) {
    for field in [
        &name.signature,
        &name.corpus,
        &name.root,
        &name.path,
        &name.language,
    ] {
        push_escaped(key, field.as_bytes());
        key.push(SEP);
    }
}

/// Appends `bytes` with `0x00`/`0x01` escaped so the output never
/// contains a separator byte.
fn push_escaped(key: &mut Vec<u8>, bytes: &[u8]) {
    for &b in bytes {
        match b {
            SEP => key.extend_from_slice(&[ESC, 0x01]),
            ESC => key.extend_from_slice(&[ESC, 0x02]),
            _ => key.push(b),
        }
    }
}
