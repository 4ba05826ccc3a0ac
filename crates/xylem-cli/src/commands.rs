//! CLI command implementations.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};
use std::io::{self, BufWriter, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use xylem_core::{EdgeTarget, EntityName, Record};
use xylem_indexer::{index_directory, IndexError, IndexerConfig};
use xylem_serving::{
    DecorationsRequest, EdgesRequest, Location, NodesRequest, XrefEngine, XrefService,
};
use xylem_server::{ServerConfig, XylemServer};
use xylem_store::{key, wire, RecordStore, SledRecordStore, StoreError};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Crawl a directory into graph records, into a store or onto stdout.
pub fn index(
    path: &Path,
    corpus: String,
    root: String,
    excludes: Vec<String>,
    store: Option<&Path>,
) -> Result<()> {
    let config = IndexerConfig {
        corpus,
        root,
        excludes,
        include_ignored: false,
    };
    let started = Instant::now();

    let summary = match store {
        Some(store_path) => {
            println!("{}", "Indexing codebase...".cyan());
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
            spinner.enable_steady_tick(Duration::from_millis(80));

            let store = SledRecordStore::open(store_path)?;
            let summary = index_directory(path, &config, |record| {
                spinner.set_message(record.source.path.clone());
                store.write(&record).map_err(IndexError::sink)
            })?;
            store.flush()?;
            spinner.finish_and_clear();

            println!(
                "{} Indexed {} files ({} records) in {}ms",
                "✓".green(),
                summary.files_indexed.to_string().cyan(),
                summary.records_emitted.to_string().cyan(),
                started.elapsed().as_millis()
            );
            summary
        }
        None => {
            // Records go to stdout; keep chatter on stderr.
            let stdout = io::stdout();
            let mut writer = wire::RecordWriter::new(BufWriter::new(stdout.lock()));
            let summary = index_directory(path, &config, |record| {
                writer.write(&record).map_err(IndexError::sink)
            })?;
            writer.flush()?;
            eprintln!(
                "{} Emitted {} records from {} files",
                "✓".green(),
                summary.records_emitted.to_string().cyan(),
                summary.files_indexed.to_string().cyan()
            );
            summary
        }
    };

    if summary.skipped > 0 {
        eprintln!("{} {} files skipped", "⚠".yellow(), summary.skipped);
    }
    Ok(())
}

/// A record with its store key, ordered for the sort heap.
struct Keyed {
    key: Vec<u8>,
    record: Record,
}

impl PartialEq for Keyed {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Keyed {}

impl PartialOrd for Keyed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Keyed {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Consecutive records of one (source, edge) merged into a fact map.
#[derive(Serialize)]
struct RecordSet {
    source: EntityName,
    #[serde(skip_serializing_if = "Option::is_none")]
    edge: Option<EdgeTarget>,
    properties: BTreeMap<String, String>,
}

/// Reshape a record stream between stdin and stdout.
pub fn stream(
    read_json: bool,
    write_json: bool,
    sort: bool,
    entry_sets: bool,
    count: bool,
) -> Result<()> {
    let stdin = io::stdin();
    let mut records: Box<dyn Iterator<Item = std::result::Result<Record, StoreError>>> =
        if read_json {
            Box::new(wire::JsonRecordReader::new(stdin.lock()))
        } else {
            Box::new(wire::RecordReader::new(stdin.lock()))
        };

    if sort || entry_sets {
        // Heap-sort into store order - the same total order the store
        // keys by.
        let mut heap = BinaryHeap::new();
        for record in records {
            let record = record?;
            heap.push(Reverse(Keyed {
                key: key::record_key(&record),
                record,
            }));
        }
        debug!(records = heap.len(), "sorted stream");
        let mut sorted = Vec::with_capacity(heap.len());
        while let Some(Reverse(keyed)) = heap.pop() {
            sorted.push(Ok(keyed.record));
        }
        records = Box::new(sorted.into_iter());
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if count {
        let mut total = 0usize;
        for record in records {
            record?;
            total += 1;
        }
        writeln!(out, "{total}")?;
    } else if entry_sets {
        let mut current: Option<RecordSet> = None;
        for record in records {
            let record = record?;
            let same = current
                .as_ref()
                .map(|set| set.source == record.source && set.edge == record.edge)
                .unwrap_or(false);
            if !same {
                if let Some(set) = current.take() {
                    serde_json::to_writer(&mut out, &set)?;
                    writeln!(out)?;
                }
                current = Some(RecordSet {
                    source: record.source,
                    edge: record.edge,
                    properties: BTreeMap::new(),
                });
            }
            if !record.fact_name.is_empty() {
                if let Some(set) = current.as_mut() {
                    set.properties.insert(
                        record.fact_name,
                        String::from_utf8_lossy(&record.fact_value).into_owned(),
                    );
                }
            }
        }
        if let Some(set) = current {
            serde_json::to_writer(&mut out, &set)?;
            writeln!(out)?;
        }
    } else if write_json {
        let mut writer = wire::JsonRecordWriter::new(out);
        for record in records {
            writer.write(&record?)?;
        }
        writer.flush()?;
        return Ok(());
    } else {
        let mut writer = wire::RecordWriter::new(out);
        for record in records {
            writer.write(&record?)?;
        }
        writer.flush()?;
        return Ok(());
    }

    out.flush()?;
    Ok(())
}

/// Serve cross-reference queries from a store over WebSocket.
pub async fn serve(port: u16, store_path: &Path) -> Result<()> {
    let store = SledRecordStore::open(store_path)?;
    println!(
        "{} Serving {} records on port {}",
        "✓".green(),
        store.len().to_string().cyan(),
        port.to_string().cyan()
    );

    let service: Arc<dyn XrefService> = Arc::new(XrefEngine::new(Arc::new(store)));
    let config = ServerConfig {
        addr: SocketAddr::from(([127, 0, 0, 1], port)),
    };
    XylemServer::new(service, config).run().await?;
    Ok(())
}

/// Query the facts of entities and print the reply.
pub async fn nodes(tickets: Vec<String>, filters: Vec<String>, store_path: &Path) -> Result<()> {
    let engine = open_engine(store_path)?;
    let reply = engine.nodes(NodesRequest { tickets, filters }).await?;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

/// Query the outbound edges of entities and print the reply.
pub async fn edges(
    tickets: Vec<String>,
    kinds: Vec<String>,
    filters: Vec<String>,
    store_path: &Path,
) -> Result<()> {
    let engine = open_engine(store_path)?;
    let reply = engine
        .edges(EdgesRequest {
            tickets,
            kinds,
            filters,
            page_token: String::new(),
        })
        .await?;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

/// Query a file's decorations and print the reply.
pub async fn decorations(ticket: String, text: bool, refs: bool, store_path: &Path) -> Result<()> {
    let engine = open_engine(store_path)?;
    let reply = engine
        .decorations(DecorationsRequest {
            location: Location { ticket, span: None },
            dirty_buffer: Vec::new(),
            source_text: text,
            references: refs,
        })
        .await?;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

fn open_engine(store_path: &Path) -> Result<XrefEngine<SledRecordStore>> {
    let store = SledRecordStore::open(store_path)?;
    debug!(records = store.len(), "opened store for query");
    Ok(XrefEngine::new(Arc::new(store)))
}
