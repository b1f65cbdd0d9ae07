//! Service layer module
//!
//! Request-dispatch runtime: instance assembly, rate limiter, retrying
//! executor, error router and pagination engine

pub mod assembly;
pub mod client;
pub mod executor;
pub mod limiter;
pub mod pagination;
pub mod router;

pub use assembly::{InitArgs, ResolvedFields};
pub use client::ApiClient;
pub use executor::{Executor, RetryPolicy};
pub use limiter::{RateLimiter, TokenBucket};
pub use pagination::BoxStream;
pub use router::ErrorRouter;
