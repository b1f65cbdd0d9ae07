//! Error router
//!
//! Routes non-ok responses to the most specific registered error handler

use crate::models::{ApiFailure, ApiResponse, ClientDescriptor, ErrorHandlerSpec};
use crate::services::ApiClient;
use crate::utils::error::{ApiError, ApiResult};
use crate::utils::logging::body_preview;
use tracing::{debug, error, warn};

/// Rank of a handler for a failing call, `None` if it does not apply.
///
/// Naming the operation outranks naming the status code, which outranks
/// a full wildcard.
pub fn specificity(spec: &ErrorHandlerSpec, operation: &str, status: u16) -> Option<u8> {
    if !spec.matches_method(operation) || !spec.matches_code(status) {
        return None;
    }
    let method_rank = if spec.is_method_specific() { 2 } else { 0 };
    let code_rank = if spec.is_code_specific() { 1 } else { 0 };
    Some(method_rank + code_rank)
}

/// Error router over a descriptor's handler table
#[derive(Debug, Clone, Copy)]
pub struct ErrorRouter<'a> {
    descriptor: &'a ClientDescriptor,
}

impl<'a> ErrorRouter<'a> {
    pub fn new(descriptor: &'a ClientDescriptor) -> Self {
        Self { descriptor }
    }

    /// Pick the handler for `status` returned by `operation`.
    ///
    /// Among handlers of equal rank the first declared wins.
    pub fn select(&self, operation: &str, status: u16) -> Option<&'a ErrorHandlerSpec> {
        let mut best: Option<(u8, &'a ErrorHandlerSpec)> = None;
        for spec in self.descriptor.error_handlers() {
            if let Some(rank) = specificity(spec, operation, status) {
                if best.map_or(true, |(best_rank, _)| rank > best_rank) {
                    best = Some((rank, spec));
                }
            }
        }
        best.map(|(_, spec)| spec)
    }

    /// Pass ok responses through, hand the rest to a handler.
    ///
    /// Handler failures are returned unchanged.
    pub async fn route(
        &self,
        client: &ApiClient,
        operation: &str,
        response: ApiResponse,
    ) -> ApiResult<ApiResponse> {
        let properties = self
            .descriptor
            .method(operation)
            .ok_or_else(|| ApiError::UnknownMethod(operation.to_string()))?;

        let status = response.status;
        if properties.is_ok(status) {
            return Ok(response);
        }

        let expected = properties.is_expected_error(status);
        if !expected {
            warn!("Operation '{}' returned undeclared status {}", operation, status);
        }

        match self.select(operation, status) {
            Some(spec) => {
                debug!(
                    "Routing status {} of '{}' to error handler {}",
                    status,
                    operation,
                    spec.name.as_deref().unwrap_or("<unnamed>")
                );
                let failure = ApiFailure {
                    operation: operation.to_string(),
                    status,
                    response,
                    expected,
                };
                spec.handler.handle(client, failure).await
            }
            None => {
                let error = ApiError::UnhandledApiError { status, response };
                if error.should_log_details() {
                    if let Some(response) = error.response() {
                        error!(
                            "Unhandled status {} from '{}': {}",
                            status,
                            operation,
                            body_preview(&response.body)
                        );
                    }
                }
                Err(error)
            }
        }
    }
}
