//! Error taxonomy of the query engine.

use thiserror::Error;
use xylem_core::{FilterError, TicketError};
use xylem_store::StoreError;

/// Why a query failed.
///
/// The first error encountered anywhere in a call aborts the whole call;
/// partial results are never returned.
#[derive(Error, Debug)]
pub enum ServingError {
    /// A request ticket did not decode to an entity name. Caller error,
    /// not retryable.
    #[error("invalid ticket {ticket:?}: {reason}")]
    InvalidTicket {
        ticket: String,
        #[source]
        reason: TicketError,
    },

    /// An edge kind in a request carried the reverse marker more than
    /// once. Caller error, not retryable.
    #[error("invalid edge kind {0:?}")]
    InvalidEdgeKind(String),

    /// A fact-name filter glob did not compile.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// The requested feature is intentionally unsupported.
    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),

    /// Source text was requested for a file with no text fact.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// The record store failed; propagated verbatim. Callers may retry
    /// per their own policy, this engine never does.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An internal invariant was violated (for example, one ticket
    /// resolving to zero or several nodes). Data-integrity fault.
    #[error("inconsistent graph: {0}")]
    Inconsistent(String),

    /// An accumulator task failed to join.
    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ServingError {
    pub(crate) fn invalid_ticket(ticket: &str, reason: TicketError) -> Self {
        Self::InvalidTicket {
            ticket: ticket.to_string(),
            reason,
        }
    }
}
