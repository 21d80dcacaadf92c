// Application Layer - Pipeline execution and the public engine

pub mod deferred;
pub mod engine;
pub mod middleware;
mod panic_guard;
mod pipeline;
mod runner;

// Re-exports
pub use deferred::Deferred;
pub use engine::{Engine, EngineMiddleware};
pub use middleware::{from_fn, End, FnMiddleware, Middleware, ReturnHandler, SharedMiddleware, Unwind};
pub use panic_guard::{execute_guarded, PanicGuardResult};
