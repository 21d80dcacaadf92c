// Merge
use stackrpc_core::{Engine, EngineMiddleware, SharedMiddleware};

/// Combine `middleware` into a single middleware backed by its own engine.
///
/// The merged stack behaves like an inline sub-stack: it can end the request,
/// fail it, or pass on with its cleanup handlers unwinding as a group.
pub fn merge<I>(middleware: I) -> EngineMiddleware
where
    I: IntoIterator<Item = SharedMiddleware>,
{
    let engine = Engine::new();
    for m in middleware {
        engine.push_shared(m);
    }
    engine.as_middleware()
}
