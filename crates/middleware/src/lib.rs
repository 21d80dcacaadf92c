//! StackRPC Middleware
//!
//! Reusable middleware for the StackRPC engine.
//!
//! - [`Scaffold`]: answer methods from a fixed table
//! - [`IdRemap`]: swap request ids for process-unique ones while the pipeline runs
//! - [`merge`]: bundle several middleware into one
//! - [`unique_id`]: process-wide id source used by [`IdRemap`]
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use stackrpc_core::Engine;
//! use stackrpc_middleware::{IdRemap, Scaffold};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = Engine::new();
//!     engine.push(IdRemap);
//!     engine.push(Scaffold::new().result("net_version", json!("1")));
//!
//!     let response = engine
//!         .handle_request(json!({"jsonrpc": "2.0", "id": "a", "method": "net_version"}))
//!         .await;
//!     assert_eq!(response.result(), Some(&json!("1")));
//! }
//! ```

mod id_remap;
mod merge;
mod scaffold;
mod unique_id;

pub use id_remap::IdRemap;
pub use merge::merge;
pub use scaffold::{Scaffold, ScaffoldEntry};
pub use unique_id::unique_id;
