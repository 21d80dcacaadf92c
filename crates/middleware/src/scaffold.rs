// Scaffold Middleware
// Method-name table of fixed results and nested middleware.

use async_trait::async_trait;
use serde_json::Value;
use stackrpc_core::{
    End, Middleware, MiddlewareError, PendingResponse, Request, ReturnHandler, SharedMiddleware,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// What a scaffolded method resolves to
#[derive(Clone)]
pub enum ScaffoldEntry {
    /// Answer with this result and end the request
    Result(Value),
    /// Delegate to this middleware
    Middleware(SharedMiddleware),
}

impl std::fmt::Debug for ScaffoldEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaffoldEntry::Result(v) => f.debug_tuple("Result").field(v).finish(),
            ScaffoldEntry::Middleware(_) => f.write_str("Middleware(..)"),
        }
    }
}

/// Routes requests by method name; unknown methods pass to the next middleware
#[derive(Debug, Clone, Default)]
pub struct Scaffold {
    entries: HashMap<String, ScaffoldEntry>,
}

impl Scaffold {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` with a fixed result
    pub fn result(mut self, method: impl Into<String>, result: Value) -> Self {
        self.entries
            .insert(method.into(), ScaffoldEntry::Result(result));
        self
    }

    /// Hand `method` to `middleware`
    pub fn middleware<M>(mut self, method: impl Into<String>, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.entries
            .insert(method.into(), ScaffoldEntry::Middleware(Arc::new(middleware)));
        self
    }

    pub fn handles(&self, method: &str) -> bool {
        self.entries.contains_key(method)
    }
}

#[async_trait]
impl Middleware for Scaffold {
    async fn handle(
        &self,
        req: &mut Request,
        res: &mut PendingResponse,
        end: End,
    ) -> Result<Option<ReturnHandler>, MiddlewareError> {
        match self.entries.get(&req.method) {
            None => Ok(None),
            Some(ScaffoldEntry::Result(result)) => {
                debug!(method = %req.method, "Scaffold answered");
                res.result = Some(result.clone());
                end.end();
                Ok(None)
            }
            Some(ScaffoldEntry::Middleware(middleware)) => middleware.handle(req, res, end).await,
        }
    }
}
