//! API client instance
//!
//! A live client built from a descriptor: resolved header/query values, a
//! private rate limiter and a transport. Every call flows through
//! assembly, rate limiting, the retrying executor and the error router;
//! paginated operations wrap that cycle in the pagination engine.

use crate::models::request::upsert;
use crate::models::{ApiResponse, CallArgs, ClientDescriptor, HttpRequest, Pairs};
use crate::services::assembly::{assemble, join_url, InitArgs};
use crate::services::executor::{Executor, RetryPolicy};
use crate::services::limiter::RateLimiter;
use crate::services::pagination::{item_stream, page_stream, BoxStream};
use crate::services::router::ErrorRouter;
use crate::transport::{HttpTransport, Transport};
use crate::utils::error::{ApiError, ApiResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

/// Client instance
#[derive(Debug)]
pub struct ApiClient {
    descriptor: Arc<ClientDescriptor>,
    base_url: String,
    suffix: Option<String>,
    headers: Pairs,
    query: Pairs,
    executor: Executor,
}

impl ApiClient {
    /// Create an instance using the HTTP transport
    pub fn new(descriptor: Arc<ClientDescriptor>, args: InitArgs) -> ApiResult<Self> {
        let transport = Arc::new(HttpTransport::new(descriptor.config().keep_alive));
        Self::with_transport(descriptor, args, transport)
    }

    /// Create an instance from a flat key/value map, see [`InitArgs::from_values`]
    pub fn from_values(
        descriptor: Arc<ClientDescriptor>,
        values: HashMap<String, String>,
    ) -> ApiResult<Self> {
        let args = InitArgs::from_values(descriptor.config(), values)?;
        Self::new(descriptor, args)
    }

    /// Create an instance sending requests through `transport`
    pub fn with_transport(
        descriptor: Arc<ClientDescriptor>,
        args: InitArgs,
        transport: Arc<dyn Transport>,
    ) -> ApiResult<Self> {
        let fields = assemble(&descriptor, &args.values)?;

        let config = descriptor.config();
        let suffix = args.suffix.or_else(|| config.suffix.clone());
        let executor = Executor::new(
            transport,
            RateLimiter::new(config.requests_per_sec),
            RetryPolicy::from_config(config),
        );

        debug!(
            "Created '{}' client for {} via {} transport",
            descriptor.name(),
            args.url,
            executor.transport().name()
        );

        Ok(Self {
            descriptor,
            base_url: args.url,
            suffix,
            headers: fields.headers,
            query: fields.query,
            executor,
        })
    }

    pub fn descriptor(&self) -> &Arc<ClientDescriptor> {
        &self.descriptor
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Resolved header values sent with every request
    pub fn headers(&self) -> &Pairs {
        &self.headers
    }

    /// Resolved query values sent with every request
    pub fn query(&self) -> &Pairs {
        &self.query
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.executor.policy()
    }

    /// URL an operation is sent to
    pub fn url_for(&self, operation: &str) -> ApiResult<String> {
        let properties = self
            .descriptor
            .method(operation)
            .ok_or_else(|| ApiError::UnknownMethod(operation.to_string()))?;
        let suffix = self.suffix.as_deref().unwrap_or("");
        Ok(join_url(&self.base_url, &[suffix, &properties.api_method]))
    }

    /// Build the request for one call; call arguments override instance values
    pub fn request_for(&self, operation: &str, args: CallArgs) -> ApiResult<HttpRequest> {
        let properties = self
            .descriptor
            .method(operation)
            .ok_or_else(|| ApiError::UnknownMethod(operation.to_string()))?;

        let mut headers = self.headers.clone();
        for (key, value) in &args.headers {
            upsert(&mut headers, key, value);
        }
        let mut query = self.query.clone();
        for (key, value) in &args.query {
            upsert(&mut query, key, value);
        }

        Ok(HttpRequest {
            verb: properties.http_verb,
            url: self.url_for(operation)?,
            headers,
            query,
            body: args.body,
        })
    }

    /// Perform one call of `operation`.
    ///
    /// Ok responses are returned as-is; others go to the selected error
    /// handler, whose result becomes the call's result.
    pub async fn call(&self, operation: &str, args: CallArgs) -> ApiResult<ApiResponse> {
        let request = self.request_for(operation, args)?;

        let span = info_span!(
            "api_call",
            request_id = %Uuid::new_v4(),
            client = %self.descriptor.name(),
            operation = %operation,
            verb = %request.verb,
        );

        async {
            let response = self.executor.execute(&request).await?;
            ErrorRouter::new(&self.descriptor)
                .route(self, operation, response)
                .await
        }
        .instrument(span)
        .await
    }

    /// Lazily fetch the pages of a paginated operation
    pub fn pages(
        &self,
        operation: &str,
        args: CallArgs,
    ) -> ApiResult<BoxStream<'_, Vec<serde_json::Value>>> {
        let properties = self
            .descriptor
            .method(operation)
            .ok_or_else(|| ApiError::UnknownMethod(operation.to_string()))?;
        if !properties.pagination {
            return Err(ApiError::NotPaginated(operation.to_string()));
        }

        // Resolved when the descriptor was built
        let spec = self
            .descriptor
            .paginator_for(operation)
            .ok_or_else(|| ApiError::NotPaginated(operation.to_string()))?;

        Ok(page_stream(self, operation, args, spec.paginator.clone()))
    }

    /// Lazily fetch the items of a paginated operation across all pages
    pub fn paginate(
        &self,
        operation: &str,
        args: CallArgs,
    ) -> ApiResult<BoxStream<'_, serde_json::Value>> {
        Ok(item_stream(self.pages(operation, args)?))
    }
}
