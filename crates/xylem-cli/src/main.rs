//! Xylem CLI - Command-line interface for Xylem
//!
//! This is the main entry point for users interacting with Xylem.
//! It provides commands for crawling a tree into records, reshaping
//! record streams, serving queries, and querying from the shell.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "xylem")]
#[command(author = "Xylem Contributors")]
#[command(version)]
#[command(about = "Cross-references over your code graph", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a directory tree into graph records
    Index {
        /// Directory to crawl (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Corpus tag for emitted entities
        #[arg(long, default_value = "")]
        corpus: String,

        /// Root tag for emitted entities
        #[arg(long, default_value = "")]
        root: String,

        /// Regex pattern of paths to skip (repeatable)
        #[arg(long = "exclude")]
        excludes: Vec<String>,

        /// Write records into this store instead of stdout
        #[arg(short, long)]
        store: Option<PathBuf>,
    },

    /// Reshape a record stream from stdin to stdout
    Stream {
        /// Read JSON records instead of length-delimited binary
        #[arg(long)]
        read_json: bool,

        /// Write JSON records instead of length-delimited binary
        #[arg(long)]
        write_json: bool,

        /// Sort the stream into store order
        #[arg(long)]
        sort: bool,

        /// Print merged record sets as JSON (implies --sort)
        #[arg(long)]
        entry_sets: bool,

        /// Only print the number of records in the stream
        #[arg(long)]
        count: bool,
    },

    /// Serve cross-reference queries over WebSocket
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "7460")]
        port: u16,

        /// Record store to serve from
        #[arg(short, long, default_value = ".xylem/store")]
        store: PathBuf,
    },

    /// Look up the facts of entities
    Nodes {
        /// Entity tickets
        #[arg(required = true)]
        tickets: Vec<String>,

        /// Fact-name filter glob (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// Record store to query
        #[arg(short, long, default_value = ".xylem/store")]
        store: PathBuf,
    },

    /// List the outbound edges of entities
    Edges {
        /// Source entity tickets
        #[arg(required = true)]
        tickets: Vec<String>,

        /// Allowed edge kind (repeatable; default all)
        #[arg(short, long = "kind")]
        kinds: Vec<String>,

        /// Fact-name filter glob (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// Record store to query
        #[arg(short, long, default_value = ".xylem/store")]
        store: PathBuf,
    },

    /// Show a file's anchors and their reference targets
    Decorations {
        /// File ticket
        ticket: String,

        /// Include the file's text in the reply
        #[arg(long)]
        text: bool,

        /// Include the file's references in the reply
        #[arg(long)]
        refs: bool,

        /// Record store to query
        #[arg(short, long, default_value = ".xylem/store")]
        store: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Index {
            path,
            corpus,
            root,
            excludes,
            store,
        } => commands::index(&path, corpus, root, excludes, store.as_deref()),

        Commands::Stream {
            read_json,
            write_json,
            sort,
            entry_sets,
            count,
        } => commands::stream(read_json, write_json, sort, entry_sets, count),

        Commands::Serve { port, store } => commands::serve(port, &store).await,

        Commands::Nodes {
            tickets,
            filters,
            store,
        } => commands::nodes(tickets, filters, &store).await,

        Commands::Edges {
            tickets,
            kinds,
            filters,
            store,
        } => commands::edges(tickets, kinds, filters, &store).await,

        Commands::Decorations {
            ticket,
            text,
            refs,
            store,
        } => commands::decorations(ticket, text, refs, &store).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red(), e);
        std::process::exit(1);
    }
}
