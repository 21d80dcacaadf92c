// Shared helpers for integration tests

#![allow(dead_code)]

use serde_json::{json, Value};
use stackrpc_core::{from_fn, Middleware, ReturnHandler};
use std::sync::{Arc, Mutex, Once};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Install the test subscriber once per binary.
///
/// `RUST_LOG` controls the filter (default `stackrpc_core=debug`);
/// `STACKRPC_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("stackrpc_core=debug,stackrpc_middleware=debug"));

        let log_format =
            std::env::var("STACKRPC_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

        let result = match log_format.as_str() {
            "json" => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_test_writer())
                .try_init(),
            _ => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_test_writer())
                .try_init(),
        };
        if result.is_ok() {
            tracing::debug!(format = %log_format, "Test tracing initialized");
        }
    });
}

pub fn request(id: i64, method: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method})
}

/// Middleware that sets `result` and ends
pub fn answer(result: Value) -> impl Middleware {
    from_fn(move |_req, res, end| {
        res.result = Some(result.clone());
        end.end();
        Ok(None)
    })
}

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Middleware that passes on and registers a cleanup handler logging `name`
pub fn cleanup(log: &Log, name: &'static str) -> impl Middleware {
    let log = Arc::clone(log);
    from_fn(move |_req, _res, _end| {
        let log = Arc::clone(&log);
        Ok(Some(ReturnHandler::from_fn(move |_| {
            log.lock().unwrap().push(name.to_string());
            Ok(())
        })))
    })
}
