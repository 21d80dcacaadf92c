// Error types and the coercion that turns any middleware failure into a
// JSON-RPC error object.

use crate::domain::Request;
use crate::port::CodeTable;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

const FALLBACK_MESSAGE: &str = "Internal JSON-RPC error.";
const NON_ERROR_MESSAGE: &str = "non-error value thrown";

/// JSON-RPC error object (`{code, message, data?}`)
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(crate::port::code::INTERNAL_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(crate::port::code::INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            crate::port::code::METHOD_NOT_FOUND,
            format!("The method \"{}\" does not exist / is not available.", method),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(crate::port::code::INVALID_PARAMS, message)
    }
}

/// Failure raised by a middleware or a cleanup handler.
///
/// The variants mirror what [`standardize`] can receive:
/// - `Rpc`: a value that already carries a code and a message
/// - `Error`: an error with a message but no JSON-RPC code
/// - `Value`: something that is not an error at all
#[derive(Error, Debug)]
pub enum MiddlewareError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Error(#[from] anyhow::Error),

    #[error("non-error value thrown: {0}")]
    Value(Value),
}

impl MiddlewareError {
    /// Error-like failure from a plain message
    pub fn msg<M>(message: M) -> Self
    where
        M: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        MiddlewareError::Error(anyhow::Error::msg(message))
    }

    /// Non-error failure (a bare JSON value)
    pub fn value(value: impl Into<Value>) -> Self {
        MiddlewareError::Value(value.into())
    }
}

impl From<serde_json::Error> for MiddlewareError {
    fn from(err: serde_json::Error) -> Self {
        MiddlewareError::Error(err.into())
    }
}

/// Coerce a middleware failure into a JSON-RPC error object.
///
/// Rules:
/// - an `Rpc` value with a recognised code and a non-empty message passes through unchanged
/// - anything error-like is wrapped with the internal code, keeping its message and
///   attaching `{request, originalError}` as data
/// - a non-error value becomes `"non-error value thrown"` with `{request, thrownValue}`
pub fn standardize(thrown: MiddlewareError, request: &Request, codes: &dyn CodeTable) -> RpcError {
    match thrown {
        MiddlewareError::Rpc(err) if codes.is_valid(err.code) && !err.message.is_empty() => err,
        MiddlewareError::Rpc(err) => {
            let original = serde_json::to_value(&err).unwrap_or_default();
            let message = if err.message.is_empty() {
                FALLBACK_MESSAGE.to_string()
            } else {
                err.message
            };
            RpcError::new(codes.internal(), message).with_data(json!({
                "request": request.to_value(),
                "originalError": original,
            }))
        }
        MiddlewareError::Error(err) => {
            let causes: Vec<String> = err.chain().skip(1).map(|c| c.to_string()).collect();
            let message = err.to_string();
            let mut original = json!({ "message": message });
            if !causes.is_empty() {
                original["causes"] = json!(causes);
            }
            RpcError::new(codes.internal(), message).with_data(json!({
                "request": request.to_value(),
                "originalError": original,
            }))
        }
        MiddlewareError::Value(value) => {
            RpcError::new(codes.internal(), NON_ERROR_MESSAGE).with_data(json!({
                "request": request.to_value(),
                "thrownValue": value,
            }))
        }
    }
}
