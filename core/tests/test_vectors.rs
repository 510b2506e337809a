//! Verify per-endpoint requests and outcomes against `test-vectors/requests.json`.
//!
//! Each case fills a form, optionally sets a session token, and submits it
//! through a transport that records the request and replays a simulated
//! response. Bodies are compared as parsed JSON, not raw strings, to avoid
//! false negatives from field ordering.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use trueshift_core::{
    handlers, ApiClient, ApiError, EndpointId, Form, HttpMethod, HttpRequest, HttpResponse,
    Outcome, Session, TracingNotifier, Transport,
};

const BASE_URL: &str = "https://trueshift.test";

#[derive(Default)]
struct ReplayTransport {
    sent: Mutex<Vec<HttpRequest>>,
    replies: Mutex<VecDeque<HttpResponse>>,
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.sent.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::NetworkError("no simulated response".to_string()))
    }
}

fn parse_method(s: &str) -> HttpMethod {
    s.parse().unwrap_or_else(|e| panic!("{e}"))
}

fn expected_headers(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (
                arr[0].as_str().unwrap().to_string(),
                arr[1].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let endpoint: EndpointId = case["endpoint"].as_str().unwrap().parse().unwrap();

        let session = Arc::new(Session::in_memory());
        if let Some(token) = case["token"].as_str() {
            session.set(token).unwrap();
        }
        let transport = Arc::new(ReplayTransport::default());
        if let Some(sim) = case["simulated_response"].as_object() {
            transport.replies.lock().unwrap().push_back(HttpResponse {
                status: sim["status"].as_u64().unwrap() as u16,
                headers: Vec::new(),
                body: sim["body"].as_str().unwrap().to_string(),
            });
        }
        let client = ApiClient::new(BASE_URL, session.clone(), transport.clone());

        let form = Form::new(endpoint.descriptor(), Arc::new(TracingNotifier));
        for (field, value) in case["fields"].as_object().unwrap() {
            form.set_field(field, value.as_str().unwrap()).unwrap();
        }
        let outcome = handlers::submit(&form, &client, endpoint, &TracingNotifier)
            .await
            .unwrap();

        // Verify request
        let sent = transport.sent.lock().unwrap().clone();
        let expected_req = &case["expected_request"];
        if expected_req.is_null() {
            assert!(sent.is_empty(), "{name}: nothing should be sent");
        } else {
            assert_eq!(sent.len(), 1, "{name}: exactly one request");
            let req = &sent[0];
            assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
            assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");
            assert_eq!(req.headers, expected_headers(&expected_req["headers"]), "{name}: headers");
            match req.body.as_deref() {
                Some(body) => {
                    let body: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(body, expected_req["body"], "{name}: body");
                }
                None => assert!(expected_req["body"].is_null(), "{name}: body should be None"),
            }
        }

        // Verify outcome
        if let Some(fragment) = case["expected_error_contains"].as_str() {
            match &outcome {
                Outcome::Failure(message) => {
                    assert!(message.contains(fragment), "{name}: {message}")
                }
                other => panic!("{name}: expected failure, got {other:?}"),
            }
        } else {
            assert_eq!(outcome.to_value(), case["expected_outcome"], "{name}: outcome");
        }
        assert_eq!(form.outcome(), Some(outcome), "{name}: stored outcome");

        if let Some(token) = case.get("expected_token") {
            assert_eq!(session.get().as_deref(), token.as_str(), "{name}: session token");
        }
    }
}
