//! The cross-reference service interface.

use crate::error::ServingError;
use crate::reply::{
    DecorationsReply, DecorationsRequest, EdgesReply, EdgesRequest, NodesReply, NodesRequest,
};
use async_trait::async_trait;

/// Read access to a code graph for cross-reference consumers.
///
/// Implementations are read-only over their backing graph; replies are
/// request-scoped values.
#[async_trait]
pub trait XrefService: Send + Sync {
    /// Returns a subset of the facts for each requested node.
    async fn nodes(&self, req: NodesRequest) -> Result<NodesReply, ServingError>;

    /// Returns a subset of the outbound edges for each requested node.
    async fn edges(&self, req: EdgesRequest) -> Result<EdgesReply, ServingError>;

    /// Returns the nodes and references decorating one file.
    async fn decorations(
        &self,
        req: DecorationsRequest,
    ) -> Result<DecorationsReply, ServingError>;
}
