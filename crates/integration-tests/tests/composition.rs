//! Composition
//!
//! Nested engines, merged stacks and the bundled middleware working
//! together in one pipeline.

mod common;

use common::{answer, cleanup, entries, init_tracing, new_log, request};
use serde_json::json;
use stackrpc_core::{code, from_fn, Engine, Id, ReturnHandler, RpcError, SharedMiddleware};
use stackrpc_middleware::{merge, IdRemap, Scaffold};
use std::sync::{Arc, Mutex};

/// Full provider-like stack: id remapping, a fixed table, then a fallback
fn provider() -> Engine {
    let engine = Engine::new();
    engine.push(IdRemap);
    engine.push(
        Scaffold::new()
            .result("net_version", json!("1"))
            .result("eth_chainId", json!("0x1"))
            .middleware(
                "eth_echo",
                from_fn(|req, res, end| {
                    res.result = req.params.clone();
                    end.end();
                    Ok(None)
                }),
            ),
    );
    engine.push(from_fn(|req, _res, _end| {
        Err(RpcError::method_not_found(&req.method).into())
    }));
    engine
}

#[tokio::test]
async fn test_provider_stack_answers_and_restores_ids() {
    init_tracing();
    let engine = provider();

    let response = engine.handle_request(request(17, "eth_chainId")).await;
    assert_eq!(response.result(), Some(&json!("0x1")));
    assert_eq!(response.id, Some(Id::from(17)));

    let response = engine
        .handle_request(json!({"jsonrpc": "2.0", "id": "s", "method": "eth_echo", "params": [3]}))
        .await;
    assert_eq!(response.result(), Some(&json!([3])));
    assert_eq!(response.id, Some(Id::from("s")));
}

#[tokio::test]
async fn test_provider_stack_reports_unknown_methods() {
    init_tracing();
    let engine = provider();

    let response = engine.handle_request(request(2, "eth_unknown")).await;
    let error = response.error().unwrap();
    assert_eq!(error.code, code::METHOD_NOT_FOUND);
    assert_eq!(response.id, Some(Id::from(2)));
}

#[tokio::test]
async fn test_caller_id_survives_unfinished_remapped_request() {
    init_tracing();
    let engine = Engine::new();
    engine.push(IdRemap);

    let response = engine.handle_request(request(5, "m")).await;
    assert!(response.error().unwrap().message.starts_with("nothing ended the request"));
    assert_eq!(response.id, Some(Id::from(5)));
}

#[tokio::test]
async fn test_remapped_ids_are_distinct_inside_the_pipeline() {
    init_tracing();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let engine = Engine::new();
    engine.push(IdRemap);
    let record = Arc::clone(&seen);
    engine.push(from_fn(move |req, res, end| {
        record.lock().unwrap().push(req.id.clone());
        res.result = Some(json!(true));
        end.end();
        Ok(None)
    }));

    let responses = engine
        .handle_batch(vec![request(1, "m"), request(1, "m"), request(1, "m")])
        .await;

    for response in &responses {
        assert_eq!(response.id, Some(Id::from(1)));
    }
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 3);
    for (i, a) in seen.iter().enumerate() {
        assert_ne!(a, &Some(Id::from(1)));
        for b in &seen[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[tokio::test]
async fn test_nested_engine_unwinds_in_nested_order() {
    init_tracing();
    let log = new_log();

    let child = Engine::new();
    child.push(cleanup(&log, "child-1"));
    child.push(cleanup(&log, "child-2"));

    let parent = Engine::new();
    parent.push(cleanup(&log, "parent-1"));
    parent.push(child.as_middleware());
    parent.push(cleanup(&log, "parent-2"));
    parent.push(answer(json!("done")));

    let response = parent.handle_request(request(1, "m")).await;
    assert_eq!(response.result(), Some(&json!("done")));
    assert_eq!(entries(&log), vec!["parent-2", "child-2", "child-1", "parent-1"]);
}

#[tokio::test]
async fn test_nested_engine_that_ends_stops_the_parent() {
    init_tracing();
    let log = new_log();

    let child = Engine::new();
    child.push(cleanup(&log, "child"));
    child.push(answer(json!("from child")));

    let parent = Engine::new();
    parent.push(cleanup(&log, "parent"));
    parent.push(child.as_middleware());
    parent.push(answer(json!("from parent")));

    let response = parent.handle_request(request(1, "m")).await;
    assert_eq!(response.result(), Some(&json!("from child")));
    assert_eq!(entries(&log), vec!["child", "parent"]);
}

#[tokio::test]
async fn test_nested_engine_failure_fails_the_parent() {
    init_tracing();
    let log = new_log();

    let child = Engine::new();
    child.push(cleanup(&log, "child"));
    child.push(from_fn(|_req, _res, _end| Err(RpcError::new(4100, "unauthorized").into())));

    let parent = Engine::new();
    parent.push(cleanup(&log, "parent"));
    parent.push(child.as_middleware());
    parent.push(answer(json!("unreachable")));

    let response = parent.handle_request(request(1, "m")).await;
    let error = response.error().unwrap();
    assert_eq!(error.code, code::UNAUTHORIZED);
    assert_eq!(error.message, "unauthorized");
    assert_eq!(entries(&log), vec!["child", "parent"]);
}

#[tokio::test]
async fn test_merged_stack_behaves_like_inline_middleware() {
    init_tracing();
    let log = new_log();
    let parts: Vec<SharedMiddleware> = vec![
        Arc::new(cleanup(&log, "merged-1")),
        Arc::new(cleanup(&log, "merged-2")),
    ];

    let engine = Engine::new();
    engine.push(merge(parts));
    engine.push(cleanup(&log, "after"));
    engine.push(answer(json!(0)));

    let response = engine.handle_request(request(1, "m")).await;
    assert_eq!(response.result(), Some(&json!(0)));
    assert_eq!(entries(&log), vec!["after", "merged-2", "merged-1"]);
}

#[tokio::test]
async fn test_cleanup_can_rewrite_the_result() {
    init_tracing();
    let engine = Engine::new();
    engine.push(from_fn(|_req, _res, _end| {
        Ok(Some(ReturnHandler::from_fn(|res| {
            if let Some(result) = res.result.as_mut() {
                result["wrapped"] = json!(true);
            }
            Ok(())
        })))
    }));
    engine.push(answer(json!({"value": 1})));

    let response = engine.handle_request(request(1, "m")).await;
    assert_eq!(response.result(), Some(&json!({"value": 1, "wrapped": true})));
}

#[tokio::test]
async fn test_middleware_can_emit_engine_events() {
    init_tracing();
    let engine = Engine::new();
    let mut notifications = engine.events().subscribe("notification");

    let emitter = engine.clone();
    engine.push(from_fn(move |req, res, end| {
        emitter
            .events()
            .emit("notification", json!({"method": req.method.clone()}));
        res.result = Some(json!(null));
        end.end();
        Ok(None)
    }));

    engine.handle_request(request(1, "eth_subscribe")).await;
    let event = notifications.recv().await.unwrap();
    assert_eq!(event, json!({"method": "eth_subscribe"}));
    assert_eq!(engine.events().listener_count("notification"), 1);
}
