//! HTTP transport implementation
//!
//! reqwest-backed transport, with an optional persistent connection

use super::{Transport, TransportFailure};
use crate::models::{ApiResponse, HttpRequest, HttpVerb, RequestBody};
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::OnceCell;
use reqwest::header::CONNECTION;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("api-requests/", env!("CARGO_PKG_VERSION"));

/// reqwest transport
///
/// The underlying client is built on first use and dropped with the
/// transport. With `keep_alive` off, no idle connection is kept and every
/// request asks the server to close its connection.
#[derive(Debug)]
pub struct HttpTransport {
    keep_alive: bool,
    client: OnceCell<Client>,
}

impl HttpTransport {
    pub fn new(keep_alive: bool) -> Self {
        Self {
            keep_alive,
            client: OnceCell::new(),
        }
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    fn client(&self) -> Result<&Client, TransportFailure> {
        self.client.get_or_try_init(|| {
            debug!("Creating HTTP client (keep-alive: {})", self.keep_alive);
            let mut builder = Client::builder().user_agent(USER_AGENT);
            if !self.keep_alive {
                builder = builder.pool_max_idle_per_host(0);
            }
            builder
                .build()
                .map_err(|e| TransportFailure::Connection(format!("Failed to create HTTP client: {}", e)))
        })
    }
}

fn to_method(verb: HttpVerb) -> Method {
    match verb {
        HttpVerb::Get => Method::GET,
        HttpVerb::Options => Method::OPTIONS,
        HttpVerb::Head => Method::HEAD,
        HttpVerb::Post => Method::POST,
        HttpVerb::Put => Method::PUT,
        HttpVerb::Patch => Method::PATCH,
        HttpVerb::Delete => Method::DELETE,
    }
}

fn to_failure(error: reqwest::Error) -> TransportFailure {
    if error.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::Connection(error.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(
        &self,
        request: &HttpRequest,
        timeout: Duration,
    ) -> Result<ApiResponse, TransportFailure> {
        let client = self.client()?;

        let mut builder = client
            .request(to_method(request.verb), &request.url)
            .timeout(timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if !self.keep_alive {
            builder = builder.header(CONNECTION, "close");
        }
        builder = match &request.body {
            Some(RequestBody::Json(body)) => builder.json(body),
            Some(RequestBody::Text(body)) => builder.body(body.clone()),
            None => builder,
        };

        let response = builder.send().await.map_err(to_failure)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(key, value)| {
                value.to_str().ok().map(|v| (key.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(to_failure)?.to_vec();

        Ok(ApiResponse {
            status,
            headers,
            body,
            received_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let transport = HttpTransport::new(true);
        assert!(transport.keep_alive());
        assert!(transport.client().is_ok());
        // Second access reuses the same client
        let first = transport.client().unwrap() as *const Client;
        let second = transport.client().unwrap() as *const Client;
        assert_eq!(first, second);
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_method(HttpVerb::Patch), Method::PATCH);
        assert_eq!(to_method(HttpVerb::Options), Method::OPTIONS);
    }
}
