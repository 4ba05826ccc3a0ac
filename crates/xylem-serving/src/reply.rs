//! Request and reply shapes of the three query operations.
//!
//! All reply structures are request-scoped: built fresh per call, never
//! cached or mutated after return.

use serde::{Deserialize, Serialize};
use xylem_core::base64_bytes;

/// Request for [`crate::XrefService::nodes`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodesRequest {
    /// Tickets of the entities to look up.
    pub tickets: Vec<String>,
    /// Fact-name filter globs; empty means "all facts".
    #[serde(default)]
    pub filters: Vec<String>,
}

/// One named attribute of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

/// A node's surviving facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub ticket: String,
    /// Facts surviving the request's filter, in scan order. May be empty.
    #[serde(default)]
    pub facts: Vec<Fact>,
}

/// Reply for [`crate::XrefService::nodes`]: one entry per requested
/// ticket, in request order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodesReply {
    pub nodes: Vec<NodeInfo>,
}

/// Request for [`crate::XrefService::edges`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgesRequest {
    /// Tickets of the source entities.
    pub tickets: Vec<String>,
    /// Edge-kind allow-list; empty allows every kind.
    #[serde(default)]
    pub kinds: Vec<String>,
    /// Fact-name filter globs for the nodes attached to the reply.
    #[serde(default)]
    pub filters: Vec<String>,
    /// Pagination token. Pagination is unimplemented; any non-empty
    /// token fails the call.
    #[serde(default)]
    pub page_token: String,
}

/// The targets of one edge kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeGroup {
    pub kind: String,
    /// Unique target tickets; callers must treat the order as arbitrary.
    pub targets: Vec<String>,
}

/// All surviving outbound edges of one source entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSet {
    pub source_ticket: String,
    pub groups: Vec<EdgeGroup>,
}

/// Reply for [`crate::XrefService::edges`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgesReply {
    /// One entry per requested ticket with at least one surviving edge.
    pub edge_sets: Vec<EdgeSet>,
    /// Facts for sources (when filters matched) and for every referenced
    /// target.
    pub nodes: Vec<NodeInfo>,
}

/// A place in the graph: a file, or a span inside one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Ticket of the file entity.
    pub ticket: String,
    /// Sub-file window. Span locations are unimplemented; only
    /// whole-file locations (`span: None`) are served.
    #[serde(default)]
    pub span: Option<Span>,
}

/// A byte range within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

/// Request for [`crate::XrefService::decorations`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationsRequest {
    pub location: Location,
    /// Unsaved file contents to patch decorations against. Patching is
    /// unimplemented; any non-empty buffer fails the call.
    #[serde(default, with = "base64_bytes")]
    pub dirty_buffer: Vec<u8>,
    /// Attach the file's text and encoding to the reply.
    #[serde(default)]
    pub source_text: bool,
    /// Attach the file's anchors and their reference targets.
    #[serde(default)]
    pub references: bool,
}

/// One resolved reference: an anchor span referring to a target entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub anchor_ticket: String,
    pub kind: String,
    pub target_ticket: String,
}

/// Reply for [`crate::XrefService::decorations`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationsReply {
    pub location: Location,
    /// File contents, when requested.
    #[serde(default, with = "base64_bytes")]
    pub source_text: Vec<u8>,
    /// Text encoding label, when known.
    #[serde(default)]
    pub encoding: String,
    /// Facts for every anchor and target node touched, unique by ticket.
    #[serde(default)]
    pub nodes: Vec<NodeInfo>,
    /// `(anchor, kind, target)` triples; order is arbitrary.
    #[serde(default)]
    pub references: Vec<Reference>,
}
