//! Request and response records
//!
//! What flows between the client instance, the executor and the transport

use crate::models::HttpVerb;
use crate::utils::error::ApiResult;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Ordered key/value pairs, as sent on the wire
pub type Pairs = Vec<(String, String)>;

/// Insert or replace `key`, keeping the position of an existing entry
pub(crate) fn upsert(pairs: &mut Pairs, key: &str, value: &str) {
    match pairs.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => pairs.push((key.to_string(), value.to_string())),
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestBody {
    Json(serde_json::Value),
    Text(String),
}

/// Per-call arguments of a described operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub headers: Pairs,
    pub query: Pairs,
    pub body: Option<RequestBody>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a header for this call
    pub fn header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        upsert(&mut self.headers, key.as_ref(), value.as_ref());
        self
    }

    /// Add or replace a query parameter for this call
    pub fn query(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.set_query(key.as_ref(), value.as_ref());
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    /// In-place variant of [`CallArgs::query`]
    pub fn set_query(&mut self, key: &str, value: &str) {
        upsert(&mut self.query, key, value);
    }
}

/// Fully resolved request handed to a transport
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub verb: HttpVerb,
    pub url: String,
    pub headers: Pairs,
    pub query: Pairs,
    pub body: Option<RequestBody>,
}

/// Raw transport response, whatever its status
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Pairs,
    pub body: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            received_at: Utc::now(),
        }
    }

    /// Response with a JSON body
    pub fn json_body(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string()).with_header("content-type", "application/json")
    }

    pub fn with_header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        upsert(&mut self.headers, key.as_ref(), value.as_ref());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as text, invalid UTF-8 replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
