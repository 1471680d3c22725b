//! HTTP transport seam and the default ureq implementation
//!
//! The engine consumes a [`Transport`]: method, path, rendered query
//! string, and optional body in; status plus a byte stream out. Pooling,
//! TLS, auth, and retry policy all live behind this trait, never here.
//!
//! [`HttpTransport`] is the stock implementation over a `ureq` agent.
//! Cache-eligible requests are sent as plain GETs; non-eligible ones
//! carry `Cache-Control: no-cache` so intermediaries revalidate.

use futon_core::{Error, Result};
use std::io::Read;
use std::time::Duration;

/// HTTP method of a view request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Query-string request
    Get,
    /// Request with a `{"keys":[...]}` body
    Post,
}

/// One executable view request
#[derive(Debug, Clone)]
pub struct ViewRequest {
    /// HTTP method
    pub method: Method,
    /// Request path, e.g. `/db/_design/d/_view/v`
    pub path: String,
    /// Rendered query string without the leading `?` (may be empty)
    pub query: String,
    /// JSON body for POST requests
    pub body: Option<String>,
    /// Whether a cached transport call is acceptable
    pub cacheable: bool,
}

impl ViewRequest {
    /// GET request
    pub fn get(path: String, query: String, cacheable: bool) -> Self {
        Self {
            method: Method::Get,
            path,
            query,
            body: None,
            cacheable,
        }
    }

    /// POST request carrying a JSON body
    pub fn post(path: String, query: String, body: String) -> Self {
        Self {
            method: Method::Post,
            path,
            query,
            body: Some(body),
            cacheable: false,
        }
    }

    /// Path plus query string, ready to append to a base URL
    pub fn url_tail(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

/// Raw transport response: status plus an unread body stream
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body; read it incrementally, it is not buffered here
    pub body: Box<dyn Read + Send>,
}

/// Pluggable HTTP executor for view requests
pub trait Transport: Send + Sync {
    /// Execute one request and hand back the unread response
    fn execute(&self, request: &ViewRequest) -> Result<TransportResponse>;
}

/// Configuration for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Server base URL, e.g. `http://127.0.0.1:5984`
    pub base_url: String,
    /// Global request timeout
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5984".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Default transport over a `ureq` agent
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport from configuration
    pub fn new(config: TransportConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &ViewRequest) -> Result<TransportResponse> {
        let url = format!("{}{}", self.base_url, request.url_tail());
        let response = match request.method {
            Method::Get => {
                let mut builder = self.agent.get(&url).header("Accept", "application/json");
                if !request.cacheable {
                    builder = builder.header("Cache-Control", "no-cache");
                }
                builder.call()
            }
            Method::Post => self
                .agent
                .post(&url)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .send(request.body.as_deref().unwrap_or("{}").as_bytes()),
        }
        .map_err(|e| Error::DocumentAccess(format!("request to {url} failed: {e}")))?;

        let status = response.status().as_u16();
        tracing::debug!(target: "futon::transport", %url, status, "executed view request");
        Ok(TransportResponse {
            status,
            body: Box::new(response.into_body().into_reader()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_tail_without_query() {
        let request = ViewRequest::get("/db/_all_docs".to_string(), String::new(), true);
        assert_eq!(request.url_tail(), "/db/_all_docs");
    }

    #[test]
    fn test_url_tail_with_query() {
        let request = ViewRequest::get("/db/_all_docs".to_string(), "limit=5".to_string(), true);
        assert_eq!(request.url_tail(), "/db/_all_docs?limit=5");
    }

    #[test]
    fn test_post_requests_are_never_cache_eligible() {
        let request = ViewRequest::post("/p".to_string(), String::new(), "{}".to_string());
        assert!(!request.cacheable);
    }

    #[test]
    fn test_default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:5984");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new(TransportConfig {
            base_url: "http://localhost:5984/".to_string(),
            ..TransportConfig::default()
        });
        assert_eq!(transport.base_url, "http://localhost:5984");
    }
}
