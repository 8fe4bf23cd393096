//! Request execution
//!
//! The one place a request crosses the rate limiter: take a token, send,
//! then feed the response headers back into the limiter.

use super::types::EndpointDescriptor;
use crate::error::{Error, Result};
use crate::http::{HttpResponse, Transport};
use crate::types::Query;

/// Send one request for `descriptor` through `transport`.
///
/// The limiter observes the headers of every completed exchange, including
/// non-2xx ones and those whose body failed to arrive, so the caller
/// decides what counts as failure. Transport errors are returned as-is and
/// nothing is retried.
pub async fn execute<R>(
    transport: &dyn Transport,
    descriptor: &EndpointDescriptor<R>,
    path: &str,
    query: &Query,
) -> Result<HttpResponse> {
    let limiter = descriptor.rate_limiter();
    limiter.acquire().await;

    let response = transport
        .send(descriptor.method().clone(), path, query)
        .await
        .inspect_err(|err| {
            if let Error::Body { headers, .. } = err {
                limiter.observe(headers);
            }
        })?;
    limiter.observe(&response.headers);

    Ok(response)
}
