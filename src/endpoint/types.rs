//! Endpoint descriptors and the two endpoint kinds

use super::executor::execute;
use crate::error::{Error, Result};
use crate::http::{RateLimiter, Transport};
use crate::pagination::{PageSource, Paginator};
use crate::template::{PathParams, PathTemplate};
use crate::types::Query;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

/// Turns a response body (or one page item) into a record
pub type DecodeFn<R> = fn(&[u8]) -> Result<R>;

/// Default decoder: JSON into any deserializable record
pub fn decode_json<R: DeserializeOwned>(body: &[u8]) -> Result<R> {
    serde_json::from_slice(body).map_err(|e| Error::decode(e.to_string()))
}

/// Static definition of one API operation.
///
/// Each descriptor owns its rate limiter; two descriptors never share a
/// bucket, even when they point at the same path.
pub struct EndpointDescriptor<R> {
    method: Method,
    path: PathTemplate,
    query_params: Vec<String>,
    decode: DecodeFn<R>,
    rate_limiter: RateLimiter,
}

impl<R: DeserializeOwned> EndpointDescriptor<R> {
    /// Describe an endpoint whose records are decoded from JSON
    pub fn new(method: Method, path: &str) -> Self {
        Self::with_decoder(method, path, decode_json::<R>)
    }
}

impl<R> EndpointDescriptor<R> {
    /// Describe an endpoint with a custom record decoder
    pub fn with_decoder(method: Method, path: &str, decode: DecodeFn<R>) -> Self {
        let path = PathTemplate::new(path);
        let rate_limiter = RateLimiter::new(format!("{method} {path}"));
        Self {
            method,
            path,
            query_params: Vec::new(),
            decode,
            rate_limiter,
        }
    }

    /// Parameter names sent in the query string instead of the path
    #[must_use]
    pub fn query_params(mut self, names: &[&str]) -> Self {
        self.query_params = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &PathTemplate {
        &self.path
    }

    pub fn query_names(&self) -> &[String] {
        &self.query_params
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Resolve caller parameters into a request path and query
    pub fn resolve(&self, params: PathParams) -> Result<(String, Query)> {
        self.path.resolve(params, &self.query_params)
    }

    /// Decode one record
    pub fn decode(&self, body: &[u8]) -> Result<R> {
        (self.decode)(body)
    }
}

impl<R> fmt::Display for EndpointDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint({}, {})", self.method, self.path)
    }
}

impl<R> fmt::Debug for EndpointDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDescriptor")
            .field("method", &self.method)
            .field("path", &self.path.as_str())
            .field("query_params", &self.query_params)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

/// An endpoint answering with a single record
pub struct SingleEndpoint<R> {
    descriptor: Arc<EndpointDescriptor<R>>,
}

impl<R> SingleEndpoint<R> {
    pub fn new(descriptor: EndpointDescriptor<R>) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
        }
    }

    pub fn descriptor(&self) -> &EndpointDescriptor<R> {
        &self.descriptor
    }

    /// Fetch and decode the record.
    ///
    /// Fails with [`Error::MissingPathParam`] before any request when a
    /// placeholder is unfilled, with [`Error::Api`] on a non-2xx status (the
    /// body is not decoded) and with [`Error::Decode`] on a shape mismatch.
    pub async fn call(&self, transport: &dyn Transport, params: PathParams) -> Result<R> {
        let (path, query) = self.descriptor.resolve(params)?;
        let response = execute(transport, &self.descriptor, &path, &query)
            .await?
            .error_for_status()?;
        self.descriptor.decode(&response.body)
    }
}

impl<R> Clone for SingleEndpoint<R> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
        }
    }
}

impl<R> fmt::Debug for SingleEndpoint<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SingleEndpoint")
            .field(&self.descriptor)
            .finish()
    }
}

/// An endpoint answering with cursor-linked pages of records
pub struct PaginatedEndpoint<R> {
    descriptor: Arc<EndpointDescriptor<R>>,
}

impl<R> PaginatedEndpoint<R> {
    pub fn new(descriptor: EndpointDescriptor<R>) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
        }
    }

    pub fn descriptor(&self) -> &EndpointDescriptor<R> {
        &self.descriptor
    }

    /// Start a lazy pagination; no request is sent until the first page is
    /// asked for.
    pub fn paginate(&self, transport: Arc<dyn Transport>, params: PathParams) -> Result<Paginator<R>> {
        let (path, query) = self.descriptor.resolve(params)?;
        let source = PageSource::new(Arc::clone(&self.descriptor), transport, path, query);
        Ok(Paginator::new(source))
    }
}

impl<R> Clone for PaginatedEndpoint<R> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
        }
    }
}

impl<R> fmt::Debug for PaginatedEndpoint<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PaginatedEndpoint")
            .field(&self.descriptor)
            .finish()
    }
}
