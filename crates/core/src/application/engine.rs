//! Engine - public surface of the pipeline.
//!
//! Holds the middleware stack, validates incoming requests, dispatches the
//! single / batch / callback call shapes onto one processing routine, and can
//! expose itself as a middleware of a parent engine.

use super::middleware::{End, Middleware, ReturnHandler, SharedMiddleware, Unwind};
use super::panic_guard::{execute_guarded, PanicGuardResult};
use super::pipeline;
use crate::config::EngineConfig;
use crate::domain::{Call, Id, PendingResponse, Reply, Request, Response};
use crate::error::{standardize, MiddlewareError, RpcError};
use crate::port::{CodeTable, Events, StandardCodes};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info_span, Instrument};

/// JSON-RPC engine.
///
/// Cloning is cheap and every clone shares the same stack.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

struct Inner {
    config: EngineConfig,
    codes: Arc<dyn CodeTable>,
    stack: RwLock<Vec<SharedMiddleware>>,
    events: Events,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_code_table(config, Arc::new(StandardCodes))
    }

    /// Create an engine that validates error codes against `codes`
    pub fn with_code_table(config: EngineConfig, codes: Arc<dyn CodeTable>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                codes,
                stack: RwLock::new(Vec::new()),
                events: Events::new(),
            }),
        }
    }

    /// Append a middleware. Requests already in flight keep the stack they started with.
    pub fn push<M>(&self, middleware: M)
    where
        M: Middleware + 'static,
    {
        self.push_shared(Arc::new(middleware));
    }

    pub fn push_shared(&self, middleware: SharedMiddleware) {
        let mut stack = self.inner.stack.write().unwrap_or_else(PoisonError::into_inner);
        stack.push(middleware);
        debug!(engine = %self.inner.config.name, depth = stack.len(), "Middleware added");
    }

    pub fn len(&self) -> usize {
        self.inner.stack.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn code_table(&self) -> &dyn CodeTable {
        self.inner.codes.as_ref()
    }

    /// Named event channels for observability hooks
    pub fn events(&self) -> &Events {
        &self.inner.events
    }

    /// Dispatch by shape: a single request yields a single response, a batch
    /// yields positionally aligned responses.
    pub async fn handle(&self, call: impl Into<Call>) -> Reply {
        match call.into() {
            Call::Single(raw) => Reply::Single(self.handle_request(raw).await),
            Call::Batch(raws) => Reply::Batch(self.handle_batch(raws).await),
        }
    }

    /// Process one request. Never fails: every failure is carried in the response.
    pub async fn handle_request(&self, request: impl Into<Value>) -> Response {
        let (_, response) = self.process(request.into()).await;
        response
    }

    /// Process a batch. All items start at once; output order is input order.
    /// A failing or panicking item only affects its own response.
    pub async fn handle_batch<I>(&self, requests: I) -> Vec<Response>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let pending = requests.into_iter().map(|raw| self.process(raw.into()));

        join_all(pending)
            .await
            .into_iter()
            .map(|(_, response)| response)
            .collect()
    }

    /// Callback form of [`Engine::handle_request`].
    ///
    /// `callback` runs exactly once with `(error, response)`; `error` mirrors
    /// the response's error. Must be called within a Tokio runtime.
    pub fn handle_request_with<F>(&self, request: impl Into<Value>, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Option<RpcError>, Response) + Send + 'static,
    {
        let engine = self.clone();
        let raw = request.into();
        tokio::spawn(async move {
            let (error, response) = engine.process(raw).await;
            callback(error, response);
        })
    }

    /// Callback form of [`Engine::handle_batch`]. Must be called within a Tokio runtime.
    pub fn handle_batch_with<F>(&self, requests: Vec<Value>, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Vec<Response>) + Send + 'static,
    {
        let engine = self.clone();
        tokio::spawn(async move {
            let responses = engine.handle_batch(requests).await;
            callback(responses);
        })
    }

    /// Expose this engine's stack as a middleware of another engine
    pub fn as_middleware(&self) -> EngineMiddleware {
        EngineMiddleware {
            engine: self.clone(),
        }
    }

    fn snapshot(&self) -> Vec<SharedMiddleware> {
        self.inner.stack.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn process(&self, raw: Value) -> (Option<RpcError>, Response) {
        let req = match self.validate(raw) {
            Ok(req) => req,
            Err(response) => return (response.error().cloned(), response),
        };

        let span = info_span!(
            "rpc_request",
            engine = %self.inner.config.name,
            method = %req.method
        );
        let request = req.to_value();
        let id = req.id.clone();

        let response = match execute_guarded(self.run(req).instrument(span)).await {
            PanicGuardResult::Success(response) => response,
            PanicGuardResult::Panicked(message) => {
                let error = RpcError::new(self.inner.codes.internal(), "request processing panicked")
                    .with_data(json!({ "request": request, "panic": message }));
                PendingResponse::failed(id, error).finish()
            }
        };
        (response.error().cloned(), response)
    }

    async fn run(&self, mut req: Request) -> Response {
        let codes = self.inner.codes.as_ref();
        let log_payloads = self.inner.config.log_payloads;
        let stack = self.snapshot();
        let mut res = PendingResponse::for_request(&req);
        let caller_id = req.id.clone();

        debug!(id = ?req.id, depth = stack.len(), "Processing request");
        if log_payloads {
            debug!(params = ?req.params, "Request params");
        }

        if let Err(err) = pipeline::execute(&stack, &mut req, &mut res, codes).await {
            let error = match res.error.take() {
                Some(existing) => existing,
                None => standardize(err, &req, codes),
            };
            // Error responses always answer under the caller's id
            res.id = caller_id;
            res.fail(error);
        }

        let response = res.finish();
        match response.error() {
            Some(error) => debug!(code = error.code, message = %error.message, "Request failed"),
            None => debug!("Request completed"),
        }
        if log_payloads {
            if let Some(result) = response.result() {
                debug!(result = %result, "Response result");
            }
        }
        response
    }

    fn validate(&self, raw: Value) -> Result<Request, Response> {
        let codes = self.inner.codes.as_ref();
        let reject = |id: Option<Id>, message: String, raw: Value| {
            debug!(reason = %message, "Rejected malformed request");
            let error =
                RpcError::new(codes.invalid_request(), message).with_data(json!({ "request": raw }));
            PendingResponse::failed(id, error).finish()
        };

        if !raw.is_object() {
            let message = format!("Requests must be plain objects. Received: {}", kind(&raw));
            return Err(reject(None, message, raw));
        }

        let id = raw.get("id").and_then(|v| Id::deserialize(v).ok());

        if !matches!(raw.get("method"), Some(Value::String(_))) {
            let received = raw.get("method").map_or("undefined", kind);
            let message = format!("Must specify a string method. Received: {}", received);
            return Err(reject(id, message, raw));
        }

        match serde_json::from_value::<Request>(raw.clone()) {
            Ok(req) => Ok(req),
            Err(err) => Err(reject(id, format!("Malformed request: {}", err), raw)),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.inner.config.name)
            .field("depth", &self.len())
            .finish()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// An engine running as one middleware of a parent engine.
///
/// The child stack runs against the parent's request/response pair. If a
/// child middleware completes the request, the child unwinds immediately and
/// then either ends the parent pipeline or fails it with the child's error.
/// Otherwise the parent continues and the child's cleanup handlers are
/// returned as a single handler, so they unwind in nested order.
#[derive(Debug, Clone)]
pub struct EngineMiddleware {
    engine: Engine,
}

#[async_trait]
impl Middleware for EngineMiddleware {
    async fn handle(
        &self,
        req: &mut Request,
        res: &mut PendingResponse,
        end: End,
    ) -> Result<Option<ReturnHandler>, MiddlewareError> {
        let stack = self.engine.snapshot();
        let codes = self.engine.code_table();
        let pass = pipeline::run_all(&stack, req, res, codes).await;

        if !pass.complete {
            return Ok(Some(ReturnHandler::new(NestedUnwind {
                handlers: pass.handlers,
            })));
        }

        pipeline::unwind(pass.handlers, res).await?;
        if let Some(err) = pass.error {
            return Err(err.into());
        }
        end.end();
        Ok(None)
    }
}

struct NestedUnwind {
    handlers: Vec<ReturnHandler>,
}

#[async_trait]
impl Unwind for NestedUnwind {
    async fn unwind(self: Box<Self>, res: &mut PendingResponse) -> Result<(), MiddlewareError> {
        pipeline::unwind(self.handlers, res).await
    }
}
