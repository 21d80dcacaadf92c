// Pipeline Executor
// Serial forward pass over the stack, completion check, reverse-order unwind.

use super::middleware::{ReturnHandler, SharedMiddleware};
use super::runner::{run_middleware, Step};
use crate::domain::{PendingResponse, Request};
use crate::error::{MiddlewareError, RpcError};
use crate::port::CodeTable;
use serde_json::json;
use tracing::{error, warn};

/// Result of the forward pass over a stack
#[derive(Debug, Default)]
pub(crate) struct Pass {
    pub error: Option<RpcError>,
    pub complete: bool,
    pub handlers: Vec<ReturnHandler>,
}

/// Run each middleware in stack order until one of them completes the request
pub(crate) async fn run_all(
    stack: &[SharedMiddleware],
    req: &mut Request,
    res: &mut PendingResponse,
    codes: &dyn CodeTable,
) -> Pass {
    let mut pass = Pass::default();

    for middleware in stack {
        let step = run_middleware(middleware.as_ref(), req, res, &mut pass.handlers, codes).await;
        match step {
            Step::Next => continue,
            Step::Ended => {
                pass.complete = true;
                break;
            }
            Step::Failed(err) => {
                pass.complete = true;
                pass.error = Some(err);
                break;
            }
        }
    }

    pass
}

/// Every request must be concluded by some middleware, with a result or an error
pub(crate) fn check_completion(
    req: &Request,
    res: &PendingResponse,
    complete: bool,
    codes: &dyn CodeTable,
) -> Result<(), RpcError> {
    if !complete {
        warn!(method = %req.method, "Nothing ended the request");
        return Err(RpcError::new(
            codes.internal(),
            format!("nothing ended the request: {}", req.to_value()),
        )
        .with_data(json!({ "request": req.to_value() })));
    }

    if !res.is_settled() {
        warn!(method = %req.method, "Request ended without a result or an error");
        return Err(RpcError::new(
            codes.internal(),
            format!("response has no error or result for request: {}", req.to_value()),
        )
        .with_data(json!({ "request": req.to_value() })));
    }

    Ok(())
}

/// Run cleanup handlers last-registered first. A failing handler aborts the unwind.
pub(crate) async fn unwind(
    handlers: Vec<ReturnHandler>,
    res: &mut PendingResponse,
) -> Result<(), MiddlewareError> {
    for handler in handlers.into_iter().rev() {
        if let Err(err) = handler.run(res).await {
            error!(error = %err, "Cleanup handler failed; remaining handlers skipped");
            return Err(err);
        }
    }
    Ok(())
}

/// Process one request against `stack`.
///
/// The unwind always runs before a forward-pass error is surfaced, so callers
/// observe cleanup finishing before they observe the failure.
pub(crate) async fn execute(
    stack: &[SharedMiddleware],
    req: &mut Request,
    res: &mut PendingResponse,
    codes: &dyn CodeTable,
) -> Result<(), MiddlewareError> {
    let pass = run_all(stack, req, res, codes).await;
    check_completion(req, res, pass.complete, codes)?;
    unwind(pass.handlers, res).await?;

    match pass.error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
