//! Middleware contract.
//!
//! A middleware receives the request, the response under construction and an
//! [`End`] handle. It then does exactly one of:
//!
//! - call `end.end()` to declare the response final (usually after setting
//!   `res.result`)
//! - return `Ok(None)` or `Ok(Some(handler))` to pass control to the next
//!   middleware, optionally registering a cleanup handler for the unwind
//! - return `Err(..)` to fail the request
//!
//! `end` only counts while the middleware call is still running. Stashing the
//! handle and calling it after `handle` has returned has no effect, because
//! the runner has already concluded that the middleware passed the request on.

use super::deferred::Deferred;
use crate::domain::{PendingResponse, Request};
use crate::error::MiddlewareError;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Request-processing unit composed serially with others
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(
        &self,
        req: &mut Request,
        res: &mut PendingResponse,
        end: End,
    ) -> Result<Option<ReturnHandler>, MiddlewareError>;
}

/// Middleware shared between the stack and in-flight requests
pub type SharedMiddleware = Arc<dyn Middleware>;

/// How a middleware call settled, as seen by the runner
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Signal {
    Ended,
    EndedWith(Value),
    Proceed,
}

/// Completion handle passed to each middleware call
#[derive(Clone)]
pub struct End {
    signal: Arc<Deferred<Signal>>,
}

impl End {
    pub(crate) fn new(signal: Arc<Deferred<Signal>>) -> Self {
        Self { signal }
    }

    /// Declare the response final and stop the pipeline here
    pub fn end(&self) {
        self.settle(Signal::Ended);
    }

    /// End with an argument, for middleware bridged from dynamically typed
    /// sources. A falsy value behaves like [`End::end`]; a truthy value is a
    /// contract violation and fails the request with an internal error.
    pub fn end_with(&self, value: Value) {
        if is_truthy(&value) {
            self.settle(Signal::EndedWith(value));
        } else {
            self.settle(Signal::Ended);
        }
    }

    /// Whether this middleware call has already been settled
    pub fn is_settled(&self) -> bool {
        self.signal.is_resolved()
    }

    fn settle(&self, signal: Signal) {
        if !self.signal.resolve(signal) {
            debug!("end called after the middleware call had already settled; ignored");
        }
    }
}

impl std::fmt::Debug for End {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("End")
            .field("settled", &self.is_settled())
            .finish()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Cleanup logic run during the unwind, after the forward pass.
///
/// Receives the response so it can adjust what the caller finally sees.
#[async_trait]
pub trait Unwind: Send {
    async fn unwind(self: Box<Self>, res: &mut PendingResponse) -> Result<(), MiddlewareError>;
}

/// Cleanup handler contributed by a middleware
pub struct ReturnHandler(Box<dyn Unwind>);

impl ReturnHandler {
    pub fn new(unwind: impl Unwind + 'static) -> Self {
        Self(Box::new(unwind))
    }

    /// Synchronous handler with access to the response
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce(&mut PendingResponse) -> Result<(), MiddlewareError> + Send + 'static,
    {
        Self::new(FnUnwind(f))
    }

    /// Suspending handler that does not touch the response
    pub fn from_future<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = Result<(), MiddlewareError>> + Send + 'static,
    {
        Self::new(FutureUnwind(fut))
    }

    pub(crate) async fn run(self, res: &mut PendingResponse) -> Result<(), MiddlewareError> {
        self.0.unwind(res).await
    }
}

impl std::fmt::Debug for ReturnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReturnHandler")
    }
}

struct FnUnwind<F>(F);

#[async_trait]
impl<F> Unwind for FnUnwind<F>
where
    F: FnOnce(&mut PendingResponse) -> Result<(), MiddlewareError> + Send + 'static,
{
    async fn unwind(self: Box<Self>, res: &mut PendingResponse) -> Result<(), MiddlewareError> {
        (self.0)(res)
    }
}

struct FutureUnwind<Fut>(Fut);

#[async_trait]
impl<Fut> Unwind for FutureUnwind<Fut>
where
    Fut: Future<Output = Result<(), MiddlewareError>> + Send + 'static,
{
    async fn unwind(self: Box<Self>, _res: &mut PendingResponse) -> Result<(), MiddlewareError> {
        self.0.await
    }
}

/// Adapt a synchronous closure into a [`Middleware`]
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(&mut Request, &mut PendingResponse, End) -> Result<Option<ReturnHandler>, MiddlewareError>
        + Send
        + Sync
        + 'static,
{
    FnMiddleware(f)
}

/// Middleware backed by a closure; see [`from_fn`]
pub struct FnMiddleware<F>(F);

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut Request, &mut PendingResponse, End) -> Result<Option<ReturnHandler>, MiddlewareError>
        + Send
        + Sync
        + 'static,
{
    async fn handle(
        &self,
        req: &mut Request,
        res: &mut PendingResponse,
        end: End,
    ) -> Result<Option<ReturnHandler>, MiddlewareError> {
        (self.0)(req, res, end)
    }
}
