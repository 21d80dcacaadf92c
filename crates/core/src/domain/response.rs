// Response Model
// PendingResponse is what middleware edit; Response is what callers receive.

use super::request::{present_id, Id, Request, JSONRPC_VERSION};
use crate::error::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response under construction, owned by the pipeline for one request.
///
/// Middleware write `result`. `error` is filled in by the engine when a
/// middleware fails; assigning it directly is a contract violation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingResponse {
    pub jsonrpc: String,
    pub id: Option<Id>,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

impl PendingResponse {
    pub fn for_request(req: &Request) -> Self {
        Self {
            jsonrpc: req.jsonrpc.clone(),
            id: req.id.clone(),
            result: None,
            error: None,
        }
    }

    pub(crate) fn failed(id: Option<Id>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Has a result or an error been attached
    pub fn is_settled(&self) -> bool {
        self.result.is_some() || self.error.is_some()
    }

    /// Attach `error`, dropping any result
    pub(crate) fn fail(&mut self, error: RpcError) {
        self.result = None;
        self.error = Some(error);
    }

    /// Freeze into a caller-facing response. An error always wins over a result.
    pub fn finish(self) -> Response {
        let outcome = match (self.error, self.result) {
            (Some(error), _) => ResponseOutcome::Error(error),
            (None, Some(result)) => ResponseOutcome::Result(result),
            (None, None) => ResponseOutcome::Error(RpcError::internal(
                "response has neither a result nor an error",
            )),
        };
        Response {
            jsonrpc: self.jsonrpc,
            id: self.id,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseOutcome {
    Result(Value),
    Error(RpcError),
}

/// Final JSON-RPC response: exactly one of `result` / `error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(default, deserialize_with = "present_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(flatten)]
    pub outcome: ResponseOutcome,
}

impl Response {
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            ResponseOutcome::Result(v) => Some(v),
            ResponseOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RpcError> {
        match &self.outcome {
            ResponseOutcome::Error(e) => Some(e),
            ResponseOutcome::Result(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Error(_))
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.outcome {
            ResponseOutcome::Result(v) => Ok(v),
            ResponseOutcome::Error(e) => Err(e),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Outgoing call shape, mirroring [`super::Call`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Single(Response),
    Batch(Vec<Response>),
}

impl Reply {
    pub fn into_single(self) -> Option<Response> {
        match self {
            Reply::Single(r) => Some(r),
            Reply::Batch(_) => None,
        }
    }

    pub fn into_batch(self) -> Option<Vec<Response>> {
        match self {
            Reply::Batch(rs) => Some(rs),
            Reply::Single(_) => None,
        }
    }
}
