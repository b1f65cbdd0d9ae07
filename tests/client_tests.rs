//! Client instance tests
//!
//! Exercise assembly, dispatch, retries and error routing end to end over
//! the scripted transport

use api_requests::models::{header, query, KeyOrDefault};
use api_requests::transport::ScriptedReply;
use api_requests::{
    ApiClient, ApiError, ApiFailure, ApiMethodProperties, ApiResponse, ApiResult, CallArgs,
    ClientConfig, ClientDescriptor, ErrorHandler, ErrorHandlerSpec, HttpVerb, InitArgs, Rational,
    ScriptedTransport,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

fn example_descriptor(config: ClientConfig) -> Arc<ClientDescriptor> {
    ClientDescriptor::builder("Example")
        .config(config)
        .headers(header([KeyOrDefault::from("Api-Key"), ("Key-1", "default-value").into()]))
        .queries(query([("format", "json")]))
        .method("status", ApiMethodProperties::get("status"))
        .method("create", ApiMethodProperties::post("items").ok_codes([201]))
        .build()
        .expect("Failed to build descriptor")
}

fn client_with(descriptor: Arc<ClientDescriptor>, transport: Arc<ScriptedTransport>) -> ApiClient {
    ApiClient::with_transport(
        descriptor,
        InitArgs::new("https://api.example.com").value("Api-Key", "X"),
        transport,
    )
    .expect("Failed to create client")
}

#[test]
fn test_instance_assembly() {
    let client = client_with(
        example_descriptor(ClientConfig::default()),
        Arc::new(ScriptedTransport::new()),
    );

    assert_eq!(
        client.headers(),
        &vec![
            ("Api-Key".to_string(), "X".to_string()),
            ("Key-1".to_string(), "default-value".to_string()),
        ]
    );
    assert_eq!(client.query(), &vec![("format".to_string(), "json".to_string())]);
}

#[test]
fn test_missing_required_field() {
    let result = ApiClient::with_transport(
        example_descriptor(ClientConfig::default()),
        InitArgs::new("https://api.example.com"),
        Arc::new(ScriptedTransport::new()),
    );

    match result {
        Err(ApiError::MissingRequiredField(key)) => assert_eq!(key, "Api-Key"),
        other => panic!("Expected missing field error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_from_values_uses_renamed_base_field() {
    let descriptor = example_descriptor(ClientConfig::default().rename_base_field("host"));
    let values: HashMap<String, String> = [
        ("host", "https://api.example.com"),
        ("suffix", "v3"),
        ("Api-Key", "X"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let client = assert_ok!(ApiClient::from_values(descriptor, values));
    assert_eq!(client.base_url(), "https://api.example.com");
    assert_eq!(assert_ok!(client.url_for("status")), "https://api.example.com/v3/status");
}

#[tokio::test]
async fn test_ok_response_passes_through() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(ApiResponse::json_body(201, &serde_json::json!({"id": 7}))),
    );
    let client = client_with(example_descriptor(ClientConfig::default().suffix("v1")), transport.clone());

    let response = assert_ok!(
        client
            .call("create", CallArgs::new().json(serde_json::json!({"name": "widget"})))
            .await
    );
    assert_eq!(response.status, 201);
    assert_eq!(response.json::<serde_json::Value>().unwrap()["id"], 7);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].verb, HttpVerb::Post);
    assert_eq!(requests[0].url, "https://api.example.com/v1/items");
    assert!(requests[0]
        .headers
        .contains(&("Api-Key".to_string(), "X".to_string())));
    assert_eq!(requests[0].query, vec![("format".to_string(), "json".to_string())]);
}

#[tokio::test]
async fn test_unknown_operation() {
    let client = client_with(
        example_descriptor(ClientConfig::default()),
        Arc::new(ScriptedTransport::new()),
    );
    let result = client.call("missing", CallArgs::new()).await;
    assert!(matches!(result, Err(ApiError::UnknownMethod(op)) if op == "missing"));
}

#[tokio::test]
async fn test_unhandled_error_response() {
    let transport = Arc::new(ScriptedTransport::new().respond(ApiResponse::new(500, "oops")));
    let client = client_with(example_descriptor(ClientConfig::default()), transport);

    let error = assert_err!(client.call("status", CallArgs::new()).await);
    assert_eq!(error.status_code(), Some(500));
    assert_eq!(error.kind(), "unhandled_api_error");
    assert_eq!(error.response().map(|r| r.text()), Some("oops".to_string()));
}

#[tokio::test]
async fn test_handler_result_becomes_call_result() {
    let descriptor = ClientDescriptor::builder("Handled")
        .method("status", ApiMethodProperties::get("status"))
        .error_handler(
            ErrorHandlerSpec::new(|_: &ApiClient, _: ApiFailure| -> ApiResult<ApiResponse> {
                Ok(ApiResponse::new(200, "fallback"))
            })
            .for_codes([404]),
        )
        .build()
        .unwrap();
    let transport = Arc::new(ScriptedTransport::new().respond(ApiResponse::new(404, "")));
    let client = ApiClient::with_transport(descriptor, InitArgs::new("https://x.test"), transport).unwrap();

    let response = assert_ok!(client.call("status", CallArgs::new()).await);
    assert_eq!(response.status, 200);
    assert_eq!(response.text(), "fallback");
}

#[tokio::test]
async fn test_handler_failure_propagates() {
    let descriptor = ClientDescriptor::builder("Failing")
        .method("status", ApiMethodProperties::get("status"))
        .error_handler(ErrorHandlerSpec::new(
            |_: &ApiClient, failure: ApiFailure| -> ApiResult<ApiResponse> {
                Err(ApiError::Handler(anyhow::anyhow!("rejected with {}", failure.status)))
            },
        ))
        .build()
        .unwrap();
    let transport = Arc::new(ScriptedTransport::new().respond(ApiResponse::new(403, "")));
    let client = ApiClient::with_transport(descriptor, InitArgs::new("https://x.test"), transport).unwrap();

    match client.call("status", CallArgs::new()).await {
        Err(ApiError::Handler(error)) => assert_eq!(error.to_string(), "rejected with 403"),
        other => panic!("Expected handler error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undeclared_status_still_routed() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();

    let descriptor = ClientDescriptor::builder("Declared")
        .method("status", ApiMethodProperties::get("status").error_codes([404]))
        .error_handler(ErrorHandlerSpec::new(
            move |_: &ApiClient, failure: ApiFailure| -> ApiResult<ApiResponse> {
                record.lock().unwrap().push((failure.status, failure.expected));
                Ok(failure.response)
            },
        ))
        .build()
        .unwrap();
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(ApiResponse::new(404, ""))
            .respond(ApiResponse::new(503, "")),
    );
    let client = ApiClient::with_transport(descriptor, InitArgs::new("https://x.test"), transport).unwrap();

    assert_eq!(client.call("status", CallArgs::new()).await.unwrap().status, 404);
    assert_eq!(client.call("status", CallArgs::new()).await.unwrap().status, 503);
    assert_eq!(*seen.lock().unwrap(), vec![(404, true), (503, false)]);
}

/// Retries a rate-limited call once through the client
struct RetryOnce;

#[async_trait]
impl ErrorHandler for RetryOnce {
    async fn handle(&self, client: &ApiClient, failure: ApiFailure) -> ApiResult<ApiResponse> {
        if failure.response.header("retry-after").is_some() {
            return client.call("fallback", CallArgs::new()).await;
        }
        Ok(failure.response)
    }
}

#[tokio::test]
async fn test_async_handler_can_call_client() {
    let descriptor = ClientDescriptor::builder("Recovering")
        .method("status", ApiMethodProperties::get("status"))
        .method("fallback", ApiMethodProperties::get("status/cached"))
        .error_handler(ErrorHandlerSpec::new(RetryOnce).for_methods(["status"]).for_codes([429]))
        .build()
        .unwrap();
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(ApiResponse::new(429, "").with_header("Retry-After", "1"))
            .respond(ApiResponse::new(200, "cached")),
    );
    let client =
        ApiClient::with_transport(descriptor, InitArgs::new("https://x.test"), transport.clone()).unwrap();

    let response = client.call("status", CallArgs::new()).await.unwrap();
    assert_eq!(response.text(), "cached");

    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, vec!["https://x.test/status", "https://x.test/status/cached"]);
}

#[tokio::test(start_paused = true)]
async fn test_retries_consume_rate_tokens() {
    let config = ClientConfig::default()
        .requests_per_sec(Rational::integer(1))
        .request_timeout_sec(0.1)
        .attempts_after_timeout(2)
        .delay_before_attempt_sec(0.0);
    let descriptor = ClientDescriptor::builder("Slow")
        .config(config)
        .method("status", ApiMethodProperties::get("status"))
        .build()
        .unwrap();
    let transport = Arc::new(ScriptedTransport::new().always(ScriptedReply::Timeout));
    let client =
        ApiClient::with_transport(descriptor, InitArgs::new("https://x.test"), transport.clone()).unwrap();

    let result = client.call("status", CallArgs::new()).await;
    assert!(matches!(result, Err(ApiError::TimeoutExhausted { attempts: 3 })));

    let recorded = transport.recorded();
    assert_eq!(recorded.len(), 3);
    for pair in recorded.windows(2) {
        assert!(pair[1].at - pair[0].at >= Duration::from_secs(1));
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_calls_share_rate_limit() {
    let config = ClientConfig::default().requests_per_sec(Rational::integer(2));
    let descriptor = ClientDescriptor::builder("Shared")
        .config(config)
        .method("status", ApiMethodProperties::get("status"))
        .build()
        .unwrap();
    let transport = Arc::new(
        ScriptedTransport::new().always(ScriptedReply::Respond(ApiResponse::new(200, ""))),
    );
    let client =
        ApiClient::with_transport(descriptor, InitArgs::new("https://x.test"), transport.clone()).unwrap();

    let start = Instant::now();
    let calls = (0..5).map(|_| client.call("status", CallArgs::new()));
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(transport.calls(), 5);
    // 4 intervals of half a second after the free first token
    assert!(start.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_instances_limit_independently() {
    let config = ClientConfig::default().requests_per_sec(Rational::integer(1));
    let descriptor = ClientDescriptor::builder("Independent")
        .config(config)
        .method("status", ApiMethodProperties::get("status"))
        .build()
        .unwrap();
    let reply = ScriptedReply::Respond(ApiResponse::new(200, ""));
    let first = ApiClient::with_transport(
        descriptor.clone(),
        InitArgs::new("https://a.test"),
        Arc::new(ScriptedTransport::new().always(reply.clone())),
    )
    .unwrap();
    let second = ApiClient::with_transport(
        descriptor,
        InitArgs::new("https://b.test"),
        Arc::new(ScriptedTransport::new().always(reply)),
    )
    .unwrap();

    let start = Instant::now();
    let (a, b) = tokio::join!(
        first.call("status", CallArgs::new()),
        second.call("status", CallArgs::new())
    );

    assert_ok!(a);
    assert_ok!(b);
    // Each instance spends its own free first token
    assert!(start.elapsed() < Duration::from_millis(500));
}
