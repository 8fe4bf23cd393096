//! Endpoint module
//!
//! An endpoint descriptor pairs an HTTP method and path template with a
//! record decoder and its own rate limiter. Two endpoint kinds share the
//! same resolve → execute → decode pipeline:
//!
//! - [`SingleEndpoint`]: one request, one record
//! - [`PaginatedEndpoint`]: a [`Paginator`](crate::pagination::Paginator)
//!   over cursor-linked pages of records

mod executor;
mod types;

pub use executor::execute;
pub use types::{decode_json, DecodeFn, EndpointDescriptor, PaginatedEndpoint, SingleEndpoint};
