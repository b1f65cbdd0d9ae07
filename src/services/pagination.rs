//! Pagination engine
//!
//! Drives a paginated operation as a lazy stream: each page is fetched only
//! when the consumer asks for more items, and the stream ends once the
//! paginator stops returning a continuation token. Dropping the stream
//! early issues no further calls.

use crate::models::{CallArgs, Paginator, PaginatorSpec};
use crate::services::ApiClient;
use crate::utils::error::{helpers::config_error, ApiError, ApiResult};
use futures::stream::{self, TryStreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{debug, info};

/// A boxed stream of fallible results
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = ApiResult<T>> + Send + 'a>>;

/// Find the one paginator for a paginated operation.
///
/// Paginators naming the operation outrank wildcard ones. No match, or
/// several matches of the best rank, is a configuration error.
pub fn resolve_paginator(paginators: &[PaginatorSpec], operation: &str) -> ApiResult<usize> {
    let matching: Vec<(usize, bool)> = paginators
        .iter()
        .enumerate()
        .filter(|(_, spec)| spec.matches_method(operation))
        .map(|(index, spec)| (index, spec.is_method_specific()))
        .collect();

    let want_specific = matching.iter().any(|(_, specific)| *specific);
    let best: Vec<usize> = matching
        .into_iter()
        .filter(|(_, specific)| *specific == want_specific)
        .map(|(index, _)| index)
        .collect();

    match best.as_slice() {
        [index] => Ok(*index),
        [] => Err(config_error(format!(
            "No paginator matches paginated operation '{}'",
            operation
        ))),
        several => Err(config_error(format!(
            "Paginators {:?} all match paginated operation '{}'",
            several, operation
        ))),
    }
}

/// Pagination state
#[derive(Debug)]
enum PageState {
    /// Arguments of the next page's call
    Fetching(CallArgs),
    Exhausted,
}

async fn next_page(
    client: &ApiClient,
    operation: &str,
    paginator: &dyn Paginator,
    state: PageState,
) -> ApiResult<Option<(Vec<serde_json::Value>, PageState)>> {
    let args = match state {
        PageState::Fetching(args) => args,
        PageState::Exhausted => return Ok(None),
    };

    let response = client.call(operation, args.clone()).await?;
    let page = paginator.paginate(client, &response)?;
    debug!("Page of '{}' yielded {} items", operation, page.items.len());

    let next = match page.next.as_deref() {
        Some(token) => {
            let mut next_args = args;
            paginator.continue_with(&mut next_args, token);
            PageState::Fetching(next_args)
        }
        None => {
            info!("Pagination of '{}' exhausted", operation);
            PageState::Exhausted
        }
    };

    Ok(Some((page.items, next)))
}

/// Stream of page item lists
pub fn page_stream<'a>(
    client: &'a ApiClient,
    operation: &str,
    args: CallArgs,
    paginator: Arc<dyn Paginator>,
) -> BoxStream<'a, Vec<serde_json::Value>> {
    let operation = operation.to_string();
    let pages = stream::try_unfold(PageState::Fetching(args), move |state| {
        let operation = operation.clone();
        let paginator = paginator.clone();
        async move { next_page(client, &operation, paginator.as_ref(), state).await }
    });
    Box::pin(pages)
}

/// Stream of individual items across pages
pub fn item_stream<'a>(
    pages: BoxStream<'a, Vec<serde_json::Value>>,
) -> BoxStream<'a, serde_json::Value> {
    let items = pages
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<_, ApiError>)))
        .try_flatten();
    Box::pin(items)
}
