//! Shared test transports.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use hookline::{
    BoxFuture, CancellationToken, Client, ClientConfig, HeaderMap, RawResponse, Result, Transport,
    TransportRequest,
};
use serde_json::Value;

/// What a [`StubTransport`] saw, without the cancellation token.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: hookline::Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Seen {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// In-memory transport replaying scripted responses in order.
///
/// Once the script is exhausted every request gets `200 {}`.
#[derive(Debug, Default)]
pub struct StubTransport {
    script: Mutex<VecDeque<Result<RawResponse>>>,
    seen: Mutex<Vec<Seen>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, response: Result<RawResponse>) -> &Self {
        self.script.lock().expect("script lock").push_back(response);
        self
    }

    pub fn respond_json(&self, status: u16, body: &Value) -> &Self {
        self.respond(Ok(json_response(status, body)))
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().expect("seen lock").clone()
    }

    pub fn client(self: &Arc<Self>, config: ClientConfig) -> Client {
        Client::with_transport(Arc::clone(self), config)
    }
}

impl Transport for StubTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<RawResponse>> {
        let body = request
            .body
            .as_ref()
            .map(|bytes| serde_json::from_slice(bytes).expect("request body is JSON"));
        self.seen.lock().expect("seen lock").push(Seen {
            method: request.method,
            url: request.url,
            headers: request.headers,
            body,
        });

        let next = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Ok(json_response(200, &serde_json::json!({}))));
        Box::pin(async move { next })
    }
}

pub fn json_response(status: u16, body: &Value) -> RawResponse {
    let reason = http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or_default();
    RawResponse::new(
        status,
        reason,
        HeaderMap::new(),
        serde_json::to_vec(body).expect("serialize body"),
    )
}

/// Transport that never answers; records the cancellation token it was given.
#[derive(Debug, Default)]
pub struct PendingTransport {
    tokens: Mutex<Vec<CancellationToken>>,
}

impl PendingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn tokens(&self) -> Vec<CancellationToken> {
        self.tokens.lock().expect("tokens lock").clone()
    }
}

impl Transport for PendingTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<RawResponse>> {
        self.tokens
            .lock()
            .expect("tokens lock")
            .push(request.cancellation);
        Box::pin(std::future::pending())
    }
}
