// Middleware Runner
// Runs one middleware and decides whether the pipeline continues.

use super::deferred::Deferred;
use super::middleware::{End, Middleware, ReturnHandler, Signal};
use crate::domain::{PendingResponse, Request};
use crate::error::{standardize, RpcError};
use crate::port::CodeTable;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a single middleware call
#[derive(Debug)]
pub(crate) enum Step {
    /// Pass to the next middleware
    Next,
    /// `end` was called; the response is final
    Ended,
    /// The middleware failed or broke the contract; `res.error` holds the error
    Failed(RpcError),
}

impl Step {
    pub(crate) fn is_complete(&self) -> bool {
        !matches!(self, Step::Next)
    }
}

/// Run `middleware` against the request/response pair.
///
/// The middleware's own return and a call to `end` race on a one-shot
/// signal. Whichever settles it first decides the step; an `end` that
/// arrives after the middleware has returned is ignored.
pub(crate) async fn run_middleware(
    middleware: &dyn Middleware,
    req: &mut Request,
    res: &mut PendingResponse,
    handlers: &mut Vec<ReturnHandler>,
    codes: &dyn CodeTable,
) -> Step {
    let signal = Arc::new(Deferred::new());
    let returned = middleware
        .handle(req, res, End::new(Arc::clone(&signal)))
        .await;

    let handler = match returned {
        Ok(handler) => handler,
        Err(thrown) => {
            let error = standardize(thrown, req, codes);
            debug!(
                method = %req.method,
                code = error.code,
                message = %error.message,
                "Middleware failed"
            );
            res.error = Some(error.clone());
            return Step::Failed(error);
        }
    };

    signal.resolve(Signal::Proceed);

    match signal.wait().await {
        Signal::EndedWith(value) => violation(
            req,
            res,
            codes,
            format!(
                "end must be called without an argument; report errors by returning Err. Received: {}",
                value
            ),
        ),
        _ if res.error.is_some() => violation(
            req,
            res,
            codes,
            "response error was assigned directly; report errors by returning Err".to_string(),
        ),
        Signal::Ended => {
            if handler.is_some() {
                debug!(method = %req.method, "Cleanup handler returned alongside end; ignored");
            }
            Step::Ended
        }
        Signal::Proceed => {
            if let Some(handler) = handler {
                handlers.push(handler);
            }
            Step::Next
        }
    }
}

fn violation(
    req: &Request,
    res: &mut PendingResponse,
    codes: &dyn CodeTable,
    message: String,
) -> Step {
    warn!(method = %req.method, violation = %message, "Middleware contract violation");
    let error =
        RpcError::new(codes.internal(), message).with_data(json!({ "request": req.to_value() }));
    res.error = Some(error.clone());
    Step::Failed(error)
}
