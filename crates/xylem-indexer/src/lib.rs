//! Xylem Indexer - turns a directory tree into graph records.
//!
//! The crawler walks a tree (honoring ignore files), reads each file, and
//! emits two fact records per file: the node kind (`file`) and the file
//! text. The entity name carries the configured corpus and root, the
//! root-relative path, the source language inferred from the extension,
//! and a SHA-256 content digest as the signature.
//!
//! # Example
//!
//! ```no_run
//! use xylem_indexer::{index_directory, IndexerConfig};
//!
//! let config = IndexerConfig {
//!     corpus: "acme".into(),
//!     ..Default::default()
//! };
//! let mut records = Vec::new();
//! let summary = index_directory("src".as_ref(), &config, |record| {
//!     records.push(record);
//!     Ok(())
//! })?;
//! println!("indexed {} files", summary.files_indexed);
//! # Ok::<(), xylem_indexer::IndexError>(())
//! ```

use ignore::WalkBuilder;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use xylem_core::{schema, EntityName, Record};

/// Errors raised while crawling.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("walk error: {0}")]
    Walk(#[from] ignore::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to emit record: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IndexError {
    /// Wraps a sink failure (store write, stream write) for propagation.
    pub fn sink(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Sink(err.into())
    }
}

/// Crawler configuration.
#[derive(Debug, Clone, Default)]
pub struct IndexerConfig {
    /// Corpus tag applied to every emitted entity.
    pub corpus: String,
    /// Root tag applied to every emitted entity.
    pub root: String,
    /// Regex patterns; paths matching any of them are skipped.
    pub excludes: Vec<String>,
    /// Also index files that ignore files (e.g. .gitignore) would hide.
    pub include_ignored: bool,
}

/// What a crawl did.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexSummary {
    /// Files read and emitted.
    pub files_indexed: usize,
    /// Records handed to the sink.
    pub records_emitted: usize,
    /// Files skipped: excluded by pattern or unreadable.
    pub skipped: usize,
}

/// Walks `dir` and emits the records of every file through `emit`.
///
/// Emission order is stable for a given tree: kind fact then text fact
/// per file, files in walk order. The stream is unsorted; pipe it through
/// `xylem stream --sort` (or write into a store, which orders by key) for
/// store order.
pub fn index_directory<F>(
    dir: &Path,
    config: &IndexerConfig,
    mut emit: F,
) -> Result<IndexSummary, IndexError>
where
    F: FnMut(Record) -> Result<(), IndexError>,
{
    let mut excludes = Vec::with_capacity(config.excludes.len());
    for pattern in &config.excludes {
        excludes.push(Regex::new(pattern)?);
    }

    let mut summary = IndexSummary::default();
    let walk = WalkBuilder::new(dir)
        .standard_filters(!config.include_ignored)
        .build();
    for entry in walk {
        let entry = entry?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        let relative = relative.to_string_lossy().replace('\\', "/");
        if excludes.iter().any(|re| re.is_match(&relative)) {
            debug!(path = %relative, "excluded");
            summary.skipped += 1;
            continue;
        }

        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(err) => {
                // A file vanishing mid-crawl is not worth failing the run.
                warn!(path = %relative, %err, "skipping unreadable file");
                summary.skipped += 1;
                continue;
            }
        };

        let name = EntityName {
            signature: hex_digest(&contents),
            corpus: config.corpus.clone(),
            root: config.root.clone(),
            path: relative,
            language: source_language(path).unwrap_or_default().to_string(),
        };

        emit(Record::fact(
            name.clone(),
            schema::NODE_KIND_FACT,
            schema::FILE_KIND.as_bytes().to_vec(),
        ))?;
        emit(Record::fact(name, schema::FILE_TEXT_FACT, contents))?;
        summary.files_indexed += 1;
        summary.records_emitted += 2;
    }
    debug!(
        files = summary.files_indexed,
        skipped = summary.skipped,
        "crawl finished"
    );
    Ok(summary)
}

/// Lowercase hex SHA-256 of the contents.
fn hex_digest(contents: &[u8]) -> String {
    Sha256::digest(contents)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Maps a file extension to its source language, when known.
fn source_language(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "rs" => Some("rust"),
        "go" => Some("go"),
        "py" => Some("python"),
        "java" => Some("java"),
        "js" | "jsx" => Some("javascript"),
        "ts" | "tsx" => Some("typescript"),
        "c" | "h" => Some("c"),
        "cc" | "cpp" | "cxx" | "hpp" => Some("c++"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn crawl(dir: &Path, config: &IndexerConfig) -> (IndexSummary, Vec<Record>) {
        let mut records = Vec::new();
        let summary = index_directory(dir, config, |record| {
            records.push(record);
            Ok(())
        })
        .unwrap();
        (summary, records)
    }

    #[test]
    fn test_emits_kind_and_text_per_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();

        let config = IndexerConfig {
            corpus: "acme".into(),
            ..Default::default()
        };
        let (summary, records) = crawl(dir.path(), &config);

        assert_eq!(summary.files_indexed, 1);
        assert_eq!(records.len(), 2);

        let by_name: BTreeMap<_, _> = records
            .iter()
            .map(|r| (r.fact_name.clone(), r.clone()))
            .collect();
        let kind = &by_name[schema::NODE_KIND_FACT];
        assert_eq!(kind.fact_value, b"file");
        assert_eq!(kind.source.corpus, "acme");
        assert_eq!(kind.source.path, "main.rs");
        assert_eq!(kind.source.language, "rust");
        assert_eq!(kind.source.signature.len(), 64);

        let text = &by_name[schema::FILE_TEXT_FACT];
        assert_eq!(text.fact_value, b"fn main() {}");
        assert_eq!(text.source, kind.source);
    }

    #[test]
    fn test_signature_tracks_contents() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "package a").unwrap();
        fs::write(dir.path().join("b.go"), "package b").unwrap();
        fs::write(dir.path().join("c.go"), "package a").unwrap();

        let (_, records) = crawl(dir.path(), &IndexerConfig::default());
        let signature = |path: &str| {
            records
                .iter()
                .find(|r| r.source.path == path)
                .unwrap()
                .source
                .signature
                .clone()
        };
        assert_eq!(signature("a.go"), signature("c.go"));
        assert_ne!(signature("a.go"), signature("b.go"));
    }

    #[test]
    fn test_exclude_patterns_skip_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/out.rs"), "x").unwrap();
        fs::write(dir.path().join("lib.rs"), "y").unwrap();

        let config = IndexerConfig {
            excludes: vec!["^target/".into()],
            ..Default::default()
        };
        let (summary, records) = crawl(dir.path(), &config);
        assert_eq!(summary.files_indexed, 1);
        assert_eq!(summary.skipped, 1);
        assert!(records.iter().all(|r| r.source.path == "lib.rs"));
    }

    #[test]
    fn test_unknown_extension_has_empty_language() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("NOTES"), "n").unwrap();
        let (_, records) = crawl(dir.path(), &IndexerConfig::default());
        assert_eq!(records[0].source.language, "");
    }
}
