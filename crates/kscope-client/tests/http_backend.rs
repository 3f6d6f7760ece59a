// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kscope_client::{load_block, load_catalog, HttpBackend, TraceBackend, TransportError};
use kscope_trace::BlockCoord;

async fn server() -> MockServer {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_src"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x = 1\ny = x + 1\n"))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/process_blocks"))
        .and(body_json(json!({ "x": 2, "y": 0, "z": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "source_line": "x = 1", "changed_vars": { "x": { "data": 1 } } },
                { "source_line": "y = x + 1", "changed_vars": {
                    "y": { "data": [2, 2], "dims": [2, -1, -1] } } }
            ]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ops": { "visualization_data": { "0_0_0": [{}], "2_0_1": [{}, {}] } },
            "kernel_src": "x = 1"
        })))
        .mount(&mock)
        .await;
    mock
}

#[tokio::test]
async fn block_round_trip_over_http() {
    let mock = server().await;
    let backend = HttpBackend::new(mock.uri()).unwrap();
    let data = load_block(&backend, BlockCoord::new(2, 0, 1)).await.unwrap();
    assert_eq!(data.trace.source().len(), 2);
    let state = data.trace.state_at(2);
    assert_eq!(state["y"].dims, vec![2, -1, -1]);
}

#[tokio::test]
async fn catalog_over_http() {
    let mock = server().await;
    let backend = HttpBackend::new(format!("{}/", mock.uri())).unwrap();
    let catalog = load_catalog(&backend).await.unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.ops(BlockCoord::new(2, 0, 1)), Some(2));
    assert_eq!(catalog.ops(BlockCoord::new(1, 0, 0)), None);
}

#[tokio::test]
async fn unknown_block_is_a_status_error() {
    let mock = server().await;
    let backend = HttpBackend::new(mock.uri()).unwrap();
    // No mock matches this body, so wiremock answers 404.
    let err = backend.fetch_trace(BlockCoord::new(7, 7, 7)).await.unwrap_err();
    assert!(matches!(
        err,
        TransportError::Status {
            endpoint: "/process_blocks",
            status: 404
        }
    ));
}

#[tokio::test]
async fn malformed_trace_body_is_a_decode_error() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_src"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x = 1"))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/process_blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "oops": [] })))
        .mount(&mock)
        .await;
    let backend = HttpBackend::new(mock.uri()).unwrap();
    let err = load_block(&backend, BlockCoord::default()).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
}
