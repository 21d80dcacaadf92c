// Id Remap Middleware
// Gives each request a process-unique id while the pipeline runs.

use crate::unique_id::unique_id;
use async_trait::async_trait;
use stackrpc_core::{End, Id, Middleware, MiddlewareError, PendingResponse, Request, ReturnHandler};
use tracing::trace;

/// Replace the request id with a unique one and restore the caller's id on
/// the response during the unwind.
///
/// Useful in front of middleware that forward requests upstream, where ids
/// from different callers could collide. When the request fails without an
/// unwind (nothing ended it), the engine still answers under the caller's id.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdRemap;

#[async_trait]
impl Middleware for IdRemap {
    async fn handle(
        &self,
        req: &mut Request,
        res: &mut PendingResponse,
        _end: End,
    ) -> Result<Option<ReturnHandler>, MiddlewareError> {
        let original = req.id.take();
        let remapped = Id::from(unique_id());
        trace!(original = ?original, remapped = %remapped, "Remapping request id");

        req.id = Some(remapped.clone());
        res.id = Some(remapped);

        Ok(Some(ReturnHandler::from_fn(move |res| {
            res.id = original;
            Ok(())
        })))
    }
}
