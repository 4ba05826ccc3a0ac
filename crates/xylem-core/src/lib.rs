//! Xylem Core - Identity, schema, and record model
//!
//! This crate holds the vocabulary every other Xylem crate speaks:
//! entity names and their canonical string form (tickets), the edge-kind
//! schema with its reverse-edge convention, the fact-name filter language,
//! and the record type read from the graph store.
//!
//! # Example
//!
//! ```
//! use xylem_core::EntityName;
//!
//! let name = EntityName {
//!     corpus: "acme".into(),
//!     path: "src/main.rs".into(),
//!     language: "rust".into(),
//!     ..Default::default()
//! };
//!
//! let ticket = name.ticket();
//! assert_eq!(EntityName::parse_ticket(&ticket).unwrap(), name);
//! ```

mod filter;
mod name;
mod record;
mod ticket;

pub mod schema;

pub use filter::{FactFilter, FilterError};
pub use name::EntityName;
pub use record::{base64_bytes, EdgeTarget, Record};
pub use ticket::TicketError;
