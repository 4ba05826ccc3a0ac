//! Xylem Server - the cross-reference protocol endpoint.
//!
//! A WebSocket server speaking JSON-RPC 2.0, routing the three protocol
//! methods (`xrefs.nodes`, `xrefs.edges`, `xrefs.decorations`) to an
//! [`XrefService`](xylem_serving::XrefService). IDE plugins and code
//! browsers hold one connection and issue queries as they render.

mod handlers;
mod protocol;
mod server;

pub use handlers::SharedService;
pub use protocol::{Request, Response, RpcError};
pub use server::{ServerConfig, XylemServer};
