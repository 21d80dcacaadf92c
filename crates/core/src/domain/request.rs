// Request Model

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

pub const JSONRPC_VERSION: &str = "2.0";

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

/// Request id (number, string, or an explicit `null`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(Number),
    String(String),
    Null,
}

/// Deserialize a present `id` key, keeping `null` as [`Id::Null`].
///
/// Combined with `#[serde(default)]`, an absent key stays `None`.
pub(crate) fn present_id<'de, D>(deserializer: D) -> Result<Option<Id>, D::Error>
where
    D: Deserializer<'de>,
{
    Id::deserialize(deserializer).map(Some)
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Id::Number(n.into())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n.into())
    }
}

impl From<i32> for Id {
    fn from(n: i32) -> Self {
        Id::Number(i64::from(n).into())
    }
}

impl From<u32> for Id {
    fn from(n: u32) -> Self {
        Id::Number(u64::from(n).into())
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{}", n),
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Null => f.write_str("null"),
        }
    }
}

/// JSON-RPC request.
///
/// A request without `id` is a notification; the engine still answers it.
/// Fields beyond the protocol ones are kept in `extensions` so middleware can
/// attach and read their own metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, deserialize_with = "present_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl Request {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: default_version(),
            method: method.into(),
            id: None,
            params: None,
            extensions: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<Id>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl From<Request> for Value {
    fn from(req: Request) -> Self {
        req.to_value()
    }
}

/// Incoming call shape: one request or an ordered batch
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Single(Value),
    Batch(Vec<Value>),
}

impl From<Value> for Call {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Call::Batch(items),
            other => Call::Single(other),
        }
    }
}

impl From<Request> for Call {
    fn from(req: Request) -> Self {
        Call::Single(req.into())
    }
}

impl From<Vec<Request>> for Call {
    fn from(reqs: Vec<Request>) -> Self {
        Call::Batch(reqs.into_iter().map(Value::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_request() {
        let req: Request = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": "abc",
            "method": "eth_chainId",
            "params": [1, 2],
            "origin": "example.com"
        }))
        .unwrap();

        assert_eq!(req.id, Some(Id::from("abc")));
        assert_eq!(req.params, Some(json!([1, 2])));
        assert_eq!(req.extensions.get("origin"), Some(&json!("example.com")));
    }

    #[test]
    fn test_notification_round_trip_omits_id() {
        let req: Request = serde_json::from_value(json!({"method": "ping"})).unwrap();
        assert!(req.is_notification());
        assert_eq!(req.jsonrpc, JSONRPC_VERSION);
        assert_eq!(req.to_value(), json!({"jsonrpc": "2.0", "method": "ping"}));
    }

    #[test]
    fn test_null_id_is_kept() {
        let req: Request = serde_json::from_value(json!({"method": "m", "id": null})).unwrap();
        assert_eq!(req.id, Some(Id::Null));
        assert!(!req.is_notification());
        assert_eq!(req.to_value(), json!({"jsonrpc": "2.0", "method": "m", "id": null}));
    }

    #[test]
    fn test_boolean_id_is_rejected() {
        let result = serde_json::from_value::<Request>(json!({"method": "m", "id": true}));
        assert!(result.is_err());
    }

    #[test]
    fn test_call_from_value_shape() {
        assert!(matches!(Call::from(json!([{}, {}])), Call::Batch(items) if items.len() == 2));
        assert!(matches!(Call::from(json!({"method": "m"})), Call::Single(_)));
        assert!(matches!(Call::from(json!("not a request")), Call::Single(_)));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(Id::from(3).to_string(), "3");
        assert_eq!(Id::from("x").to_string(), "\"x\"");
    }
}
