//! Shared mock transport for integration tests

#![allow(dead_code)]

use futon_client::{Method, Transport, TransportResponse, ViewRequest};
use futon_core::Result;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// One request as the transport saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub body: Option<String>,
    pub cacheable: bool,
}

struct Inner {
    responses: Mutex<Vec<(u16, String)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// In-memory transport: queued responses, recorded requests
#[derive(Clone)]
pub struct MockTransport(Arc<Inner>);

impl MockTransport {
    pub fn new() -> Self {
        Self(Arc::new(Inner {
            responses: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }))
    }

    pub fn enqueue(&self, status: u16, body: &str) {
        self.0
            .responses
            .lock()
            .unwrap()
            .push((status, body.to_string()));
    }

    pub fn enqueue_ok(&self, body: &str) {
        self.enqueue(200, body);
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.0.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.recorded().last().expect("no request recorded").clone()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &ViewRequest) -> Result<TransportResponse> {
        self.0.requests.lock().unwrap().push(RecordedRequest {
            method: request.method,
            path: request.path.clone(),
            query: request.query.clone(),
            body: request.body.clone(),
            cacheable: request.cacheable,
        });
        let mut responses = self.0.responses.lock().unwrap();
        assert!(!responses.is_empty(), "no queued response for {}", request.path);
        let (status, body) = responses.remove(0);
        Ok(TransportResponse {
            status,
            body: Box::new(Cursor::new(body.into_bytes())),
        })
    }
}
