// ABOUTME: Compute client tests against a mock HTTP server: status mapping, auth header, wire format and audit

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use netcalc::client::{AuditLog, ComputeClient, ComputeError, ComputeRoute, ErrorKind};
use netcalc::connection::{
    ConnectionMonitor, ConnectionStatus, Endpoint, EndpointHandle, MonitorOptions,
};
use netcalc::models::{NumberFormat, Operator};

fn monitor_for(base_url: &str, token: Option<&str>) -> Arc<ConnectionMonitor> {
    let endpoint = Endpoint::from_settings(base_url, token.map(str::to_string)).unwrap();
    ConnectionMonitor::new(
        EndpointHandle::new(endpoint),
        MonitorOptions {
            retry_interval: Duration::from_millis(200),
            request_timeout: Duration::from_secs(2),
        },
    )
}

fn client_for(server: &MockServer, token: Option<&str>) -> ComputeClient {
    let monitor = monitor_for(&server.url("/calc/"), token);
    ComputeClient::new(monitor, Arc::new(AuditLog::disabled()), NumberFormat::invariant())
}

#[tokio::test]
async fn posts_invariant_operands_with_bearer_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/calc/compute")
            .header("authorization", "Bearer secret")
            .json_body(json!({"op": "+", "num1": "5", "num2": "3"}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"op": "+", "num1": "5", "num2": "3", "result": "8"}));
    });

    let client = client_for(&server, Some("secret"));
    let result = client.compute("5", "3", Operator::Add).await;

    assert_eq!(result, Ok("8".to_string()));
    mock.assert_calls(1);
}

#[tokio::test]
async fn omits_authorization_without_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/calc/compute")
            .header_missing("authorization");
        then.status(200)
            .json_body(json!({"op": "*", "num1": "2", "num2": "4", "result": "8"}));
    });

    let client = client_for(&server, None);
    assert_eq!(client.compute("2", "4", Operator::Mul).await, Ok("8".to_string()));
    mock.assert_calls(1);
}

#[tokio::test]
async fn comma_display_operands_are_sent_invariant() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/calc/compute")
            .json_body(json!({"op": "*", "num1": "2.5", "num2": "-4"}));
        then.status(200)
            .json_body(json!({"op": "*", "num1": "2.5", "num2": "-4", "result": "-10"}));
    });

    let monitor = monitor_for(&server.url("/calc/"), None);
    let client = ComputeClient::new(
        monitor,
        Arc::new(AuditLog::disabled()),
        NumberFormat::with_separator(','),
    );
    assert_eq!(client.compute("2,5", "-4", Operator::Mul).await, Ok("-10".to_string()));
    mock.assert_calls(1);
}

#[tokio::test]
async fn result_is_rounded_to_fifteen_significant_digits() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/calc/compute");
        then.status(200).json_body(
            json!({"op": "+", "num1": "0.1", "num2": "0.2", "result": "0.30000000000000004"}),
        );
    });

    let client = client_for(&server, None);
    assert_eq!(client.compute("0.1", "0.2", Operator::Add).await, Ok("0.3".to_string()));
}

#[tokio::test]
async fn bad_request_carries_server_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/calc/compute");
        then.status(400).json_body(json!({"error": "Cannot divide by zero."}));
    });

    let client = client_for(&server, Some("secret"));
    let err = client.compute("1", "0", Operator::Div).await.unwrap_err();

    assert_eq!(
        err,
        ComputeError::Rejected {
            status: 400,
            message: "Cannot divide by zero.".to_string()
        }
    );
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.display_text(), "Cannot divide by zero.");
}

#[tokio::test]
async fn unauthorized_does_not_affect_connection_state() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/calc/compute");
        then.status(401).json_body(json!({"error": "Invalid token"}));
    });

    let monitor = monitor_for(&server.url("/calc/"), Some("wrong"));
    let client = ComputeClient::new(
        Arc::clone(&monitor),
        Arc::new(AuditLog::disabled()),
        NumberFormat::invariant(),
    );
    let err = client.compute("1", "1", Operator::Add).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(err.display_text(), "Authentication failed");
    assert_eq!(monitor.status(), ConnectionStatus::Connecting);
    assert_eq!(monitor.retry_loops_started(), 0);
}

#[tokio::test]
async fn server_errors_map_to_server_kind() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/calc/compute");
        then.status(503).body("upstream unavailable");
    });

    let monitor = monitor_for(&server.url("/calc/"), None);
    let client = ComputeClient::new(
        Arc::clone(&monitor),
        Arc::new(AuditLog::disabled()),
        NumberFormat::invariant(),
    );
    let err = client.compute("1", "1", Operator::Add).await.unwrap_err();
    assert_eq!(err, ComputeError::Server { status: 503 });
    assert!(!err.triggers_reconnect());
    assert_eq!(monitor.status(), ConnectionStatus::Connecting);
    assert_eq!(monitor.retry_loops_started(), 0);
}

#[tokio::test]
async fn malformed_success_body_is_a_protocol_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/calc/compute");
        then.status(200).json_body(json!({"result": "not a number"}));
    });

    let client = client_for(&server, None);
    let err = client.compute("1", "1", Operator::Add).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn per_operator_route_posts_to_operator_path() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/calc/div")
            .json_body(json!({"op": "/", "num1": "9", "num2": "3"}));
        then.status(200)
            .json_body(json!({"op": "/", "num1": "9", "num2": "3", "result": "3"}));
    });

    let client = client_for(&server, None).with_route(ComputeRoute::PerOperator);
    assert_eq!(client.compute("9", "3", Operator::Div).await, Ok("3".to_string()));
    mock.assert_calls(1);
}

#[tokio::test]
async fn transport_failure_takes_the_monitor_offline() {
    // Reserve a port and release it so nothing is listening there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let monitor = monitor_for(&format!("http://127.0.0.1:{port}/calc/"), None);
    let client = ComputeClient::new(
        Arc::clone(&monitor),
        Arc::new(AuditLog::disabled()),
        NumberFormat::invariant(),
    );

    let err = client.compute("1", "1", Operator::Add).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionLost);
    assert_eq!(err.display_text(), "Connection error");
    assert_eq!(monitor.status(), ConnectionStatus::Offline);
    assert_eq!(monitor.retry_loops_started(), 1);

    monitor.shutdown();
}

#[tokio::test]
async fn audit_log_records_request_meta_and_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/calc/compute");
        then.status(200)
            .header("content-type", "application/json; charset=utf-8")
            .json_body(json!({"op": "-", "num1": "7", "num2": "2", "result": "5"}));
    });

    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("logs").join("audit.jsonl");
    let monitor = monitor_for(&server.url("/calc/"), None);
    let client = ComputeClient::new(
        monitor,
        Arc::new(AuditLog::open(&audit_path).unwrap()),
        NumberFormat::invariant(),
    );

    client.compute("7", "2", Operator::Sub).await.unwrap();

    let records: Vec<Value> = std::fs::read_to_string(&audit_path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let types: Vec<&str> = records.iter().filter_map(|r| r["type"].as_str()).collect();
    assert_eq!(types, vec!["request", "meta", "response"]);

    assert_eq!(records[0]["op"], "-");
    assert_eq!(records[0]["num1"], "7");
    assert_eq!(records[1]["status"], 200);
    assert_eq!(records[1]["contentType"], "application/json");
    assert_eq!(records[2]["result"], "5");
    assert!(records.iter().all(|r| r["timestamp"].is_string()));
}
