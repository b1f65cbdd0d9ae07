//! Descriptor model module
//!
//! Data records describing a configured client: operations, header/query
//! templates, error handlers, paginators and the request/response records
//! passed between runtime stages.

pub mod descriptor;
pub mod handler;
pub mod method;
pub mod parts;
pub mod request;

pub use descriptor::{ClientDescriptor, DescriptorBuilder, SUFFIX_FIELD};
pub use handler::{
    ApiFailure, ErrorHandler, ErrorHandlerSpec, JsonCursorPaginator, Page, Paginator,
    PaginatorSpec, DEFAULT_CURSOR_PARAM,
};
pub use method::{ApiMethodProperties, HttpVerb, DEFAULT_OK_CODE};
pub use parts::{header, query, FieldTemplate, HeaderPart, KeyOrDefault, QueryPart};
pub use request::{ApiResponse, CallArgs, HttpRequest, Pairs, RequestBody};
