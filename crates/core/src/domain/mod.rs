// Domain Layer - JSON-RPC message types

pub mod request;
pub mod response;

// Re-exports
pub use request::{Call, Id, Request, JSONRPC_VERSION};
pub use response::{PendingResponse, Reply, Response, ResponseOutcome};
