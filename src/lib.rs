//! API Requests Library
//!
//! Declarative HTTP API clients: describe an API once (endpoints, header
//! and query templates, error handlers, paginators) and get instances that
//! rate-limit, retry timeouts, route error responses and paginate lazily.
//!
//! ```no_run
//! use api_requests::{ApiClient, ApiMethodProperties, CallArgs, ClientDescriptor, InitArgs};
//! use api_requests::models::header;
//!
//! # async fn run() -> api_requests::ApiResult<()> {
//! let descriptor = ClientDescriptor::builder("Example")
//!     .headers(header(["Api-Key"]))
//!     .method("status", ApiMethodProperties::get("status"))
//!     .build()?;
//!
//! let client = ApiClient::new(
//!     descriptor,
//!     InitArgs::new("https://api.example.com").value("Api-Key", "secret"),
//! )?;
//! let response = client.call("status", CallArgs::new()).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod models;
pub mod services;
pub mod transport;
pub mod utils;

// Re-export common types
pub use config::{ClientConfig, ClientProfiles, LoggingConfig};
pub use models::{
    ApiFailure, ApiMethodProperties, ApiResponse, CallArgs, ClientDescriptor, ErrorHandler,
    ErrorHandlerSpec, HeaderPart, HttpVerb, Page, Paginator, PaginatorSpec, QueryPart,
};
pub use services::{ApiClient, InitArgs};
pub use transport::{HttpTransport, ScriptedTransport, Transport};
pub use utils::error::{ApiError, ApiResult};
pub use utils::Rational;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
