//! Error handler and paginator registrations
//!
//! User callbacks attached to a descriptor, plus the scope (operations and
//! status codes) each one applies to.

use crate::models::{ApiResponse, CallArgs};
use crate::services::ApiClient;
use crate::utils::error::{ApiError, ApiResult};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A non-ok response handed to an error handler
#[derive(Debug, Clone)]
pub struct ApiFailure {
    /// Operation name the call was made through
    pub operation: String,
    pub status: u16,
    pub response: ApiResponse,
    /// Whether the status is one of the operation's declared error codes
    pub expected: bool,
}

/// Turns an error response into the call's result
///
/// Whatever the handler returns becomes the result of the call; failures
/// it returns propagate to the caller as-is.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, client: &ApiClient, failure: ApiFailure) -> ApiResult<ApiResponse>;
}

#[async_trait]
impl<F> ErrorHandler for F
where
    F: Fn(&ApiClient, ApiFailure) -> ApiResult<ApiResponse> + Send + Sync,
{
    async fn handle(&self, client: &ApiClient, failure: ApiFailure) -> ApiResult<ApiResponse> {
        (self)(client, failure)
    }
}

/// Registration of one error handler
#[derive(Clone)]
pub struct ErrorHandlerSpec {
    pub name: Option<String>,
    pub handler: Arc<dyn ErrorHandler>,
    /// Empty: applies to all operations
    pub api_methods: BTreeSet<String>,
    /// `None` or empty: applies to all status codes
    pub error_codes: Option<BTreeSet<u16>>,
}

impl ErrorHandlerSpec {
    /// Handler applying to every operation and status code
    pub fn new(handler: impl ErrorHandler + 'static) -> Self {
        Self {
            name: None,
            handler: Arc::new(handler),
            api_methods: BTreeSet::new(),
            error_codes: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn for_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.api_methods = methods.into_iter().map(Into::into).collect();
        self
    }

    pub fn for_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.error_codes = Some(codes.into_iter().collect());
        self
    }

    pub fn matches_method(&self, operation: &str) -> bool {
        self.api_methods.is_empty() || self.api_methods.contains(operation)
    }

    pub fn matches_code(&self, status: u16) -> bool {
        match &self.error_codes {
            Some(codes) if !codes.is_empty() => codes.contains(&status),
            _ => true,
        }
    }

    pub fn is_method_specific(&self) -> bool {
        !self.api_methods.is_empty()
    }

    pub fn is_code_specific(&self) -> bool {
        self.error_codes.as_ref().is_some_and(|codes| !codes.is_empty())
    }
}

impl fmt::Debug for ErrorHandlerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandlerSpec")
            .field("name", &self.name)
            .field("api_methods", &self.api_methods)
            .field("error_codes", &self.error_codes)
            .finish_non_exhaustive()
    }
}

/// Query parameter carrying the continuation token by default
pub const DEFAULT_CURSOR_PARAM: &str = "cursor";

/// One page of a paginated operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<serde_json::Value>,
    /// `None`: this was the last page
    pub next: Option<String>,
}

impl Page {
    pub fn new(items: Vec<serde_json::Value>, next: Option<String>) -> Self {
        Self { items, next }
    }

    pub fn last(items: Vec<serde_json::Value>) -> Self {
        Self { items, next: None }
    }
}

/// Splits a response into items and a continuation token
pub trait Paginator: Send + Sync {
    fn paginate(&self, client: &ApiClient, response: &ApiResponse) -> ApiResult<Page>;

    /// Prepare the arguments of the next call from a continuation token
    fn continue_with(&self, args: &mut CallArgs, token: &str) {
        args.set_query(DEFAULT_CURSOR_PARAM, token);
    }
}

impl<F> Paginator for F
where
    F: Fn(&ApiClient, &ApiResponse) -> ApiResult<Page> + Send + Sync,
{
    fn paginate(&self, client: &ApiClient, response: &ApiResponse) -> ApiResult<Page> {
        (self)(client, response)
    }
}

/// Cursor pagination over a JSON body such as
/// `{"items": [...], "next": "token"}`
#[derive(Debug, Clone)]
pub struct JsonCursorPaginator {
    pub items_field: String,
    pub next_field: String,
    pub cursor_param: String,
}

impl JsonCursorPaginator {
    pub fn new(
        items_field: impl Into<String>,
        next_field: impl Into<String>,
        cursor_param: impl Into<String>,
    ) -> Self {
        Self {
            items_field: items_field.into(),
            next_field: next_field.into(),
            cursor_param: cursor_param.into(),
        }
    }
}

impl Default for JsonCursorPaginator {
    fn default() -> Self {
        Self::new("items", "next", DEFAULT_CURSOR_PARAM)
    }
}

impl Paginator for JsonCursorPaginator {
    fn paginate(&self, _client: &ApiClient, response: &ApiResponse) -> ApiResult<Page> {
        let body: serde_json::Value = response.json()?;
        let items = match body.get(&self.items_field) {
            Some(serde_json::Value::Array(items)) => items.clone(),
            Some(serde_json::Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(ApiError::Handler(anyhow::anyhow!(
                    "Field '{}' is not an array: {}",
                    self.items_field,
                    other
                )))
            }
        };
        let next = match body.get(&self.next_field) {
            Some(serde_json::Value::String(token)) if !token.is_empty() => Some(token.clone()),
            Some(serde_json::Value::Number(token)) => Some(token.to_string()),
            _ => None,
        };
        Ok(Page { items, next })
    }

    fn continue_with(&self, args: &mut CallArgs, token: &str) {
        args.set_query(&self.cursor_param, token);
    }
}

/// Registration of one paginator
#[derive(Clone)]
pub struct PaginatorSpec {
    pub name: Option<String>,
    pub paginator: Arc<dyn Paginator>,
    /// Empty: applies to all paginated operations
    pub api_methods: BTreeSet<String>,
}

impl PaginatorSpec {
    pub fn new(paginator: impl Paginator + 'static) -> Self {
        Self {
            name: None,
            paginator: Arc::new(paginator),
            api_methods: BTreeSet::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn for_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.api_methods = methods.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches_method(&self, operation: &str) -> bool {
        self.api_methods.is_empty() || self.api_methods.contains(operation)
    }

    pub fn is_method_specific(&self) -> bool {
        !self.api_methods.is_empty()
    }
}

impl fmt::Debug for PaginatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatorSpec")
            .field("name", &self.name)
            .field("api_methods", &self.api_methods)
            .finish_non_exhaustive()
    }
}
