//! Request handlers for protocol methods.
//!
//! Each handler implements one method of the cross-reference protocol by
//! delegating to the shared engine and mapping the outcome onto a
//! response.

use crate::protocol::Response;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use xylem_serving::{DecorationsRequest, EdgesRequest, NodesRequest, XrefService};

/// The engine shared between connections.
pub type SharedService = Arc<dyn XrefService>;

/// Handles the xrefs.nodes method.
pub async fn handle_nodes(service: SharedService, id: Option<Value>, params: NodesRequest) -> Response {
    debug!(tickets = params.tickets.len(), "nodes request");
    match service.nodes(params).await {
        Ok(reply) => Response::success(id, reply),
        Err(err) => Response::engine_error(id, &err),
    }
}

/// Handles the xrefs.edges method.
pub async fn handle_edges(service: SharedService, id: Option<Value>, params: EdgesRequest) -> Response {
    debug!(tickets = params.tickets.len(), "edges request");
    match service.edges(params).await {
        Ok(reply) => Response::success(id, reply),
        Err(err) => Response::engine_error(id, &err),
    }
}

/// Handles the xrefs.decorations method.
pub async fn handle_decorations(
    service: SharedService,
    id: Option<Value>,
    params: DecorationsRequest,
) -> Response {
    debug!(file = %params.location.ticket, "decorations request");
    match service.decorations(params).await {
        Ok(reply) => Response::success(id, reply),
        Err(err) => Response::engine_error(id, &err),
    }
}
