//! HTTP module
//!
//! Provides the transport the endpoints send through and the
//! server-driven rate limiter each endpoint owns.
//!
//! # Features
//!
//! - **Transport seam**: any [`Transport`] can stand in for the network
//! - **Bearer session**: token, base URL and timeout set once per client
//! - **Rate Limiting**: token bucket sized and refilled from `X-Ratelimit-*` headers

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, HttpResponse, Transport};
pub use rate_limit::{
    RateLimitHeaders, RateLimiter, LIMIT_HEADER, REMAINING_HEADER, RESET_HEADER,
};
