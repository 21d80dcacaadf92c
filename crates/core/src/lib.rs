//! StackRPC Core
//!
//! A JSON-RPC 2.0 request engine built around a serial middleware pipeline.
//! Callers hand the engine one request (or a batch) and always get back one
//! well-formed response (or a positionally aligned batch of responses),
//! no matter how many middleware participated or which of them failed.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use stackrpc_core::{from_fn, Engine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = Engine::new();
//!     engine.push(from_fn(|req, res, end| {
//!         if req.method == "ping" {
//!             res.result = Some(json!("pong"));
//!             end.end();
//!         }
//!         Ok(None)
//!     }));
//!
//!     let response = engine
//!         .handle_request(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
//!         .await;
//!     assert_eq!(response.result(), Some(&json!("pong")));
//! }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{
    from_fn, Deferred, End, Engine, EngineMiddleware, FnMiddleware, Middleware, ReturnHandler,
    SharedMiddleware, Unwind,
};
pub use config::EngineConfig;
pub use domain::{Call, Id, PendingResponse, Reply, Request, Response, ResponseOutcome};
pub use error::{standardize, MiddlewareError, RpcError};
pub use port::{code, CodeTable, Events, StandardCodes};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
