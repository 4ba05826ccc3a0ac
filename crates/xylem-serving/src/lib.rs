//! Xylem Serving - the cross-reference query engine.
//!
//! This crate answers graph queries over opaque entity tickets by scanning
//! the ordered record store and assembling replies:
//!
//! - **Nodes**: the facts attached to each requested entity, optionally
//!   restricted by fact-name filter globs.
//! - **Edges**: the outbound edges of each requested entity, grouped by
//!   kind, with referenced target nodes resolved in one batched follow-up.
//! - **Decorations**: a file's anchors and what each anchor refers to,
//!   derived from the store's mirrored childof edges.
//!
//! Each requested entity is aggregated on its own task; the engine joins
//! the whole batch before replying, and the first error anywhere aborts
//! the call.

mod engine;
mod error;
mod reply;
mod service;

pub use engine::XrefEngine;
pub use error::ServingError;
pub use reply::{
    DecorationsReply, DecorationsRequest, EdgeGroup, EdgeSet, EdgesReply, EdgesRequest, Fact,
    Location, NodeInfo, NodesReply, NodesRequest, Reference, Span,
};
pub use service::XrefService;
