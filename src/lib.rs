// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # gitbook
//!
//! A typed async client for the GitBook API.
//!
//! ## Features
//!
//! - **Typed endpoints**: every operation is a descriptor with a path
//!   template and a record decoder
//! - **Adaptive rate limiting**: each endpoint throttles itself from the
//!   `X-Ratelimit-*` headers the server returns
//! - **Cursor pagination**: lazy, forward-only paginators over `next` cursors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gitbook::{Client, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::new("gb_api_...")?;
//!
//!     let me = client.get_user(None).await?;
//!     println!("{}", me.display_name);
//!
//!     let mut spaces = client.get_spaces()?.limit(50);
//!     while let Some(page) = spaces.next_page().await? {
//!         for space in page.items() {
//!             println!("{}", space.title);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Client ──► SingleEndpoint::call ──┐
//!        └─► Paginator::next_page ──┴─► execute ─► RateLimiter::acquire
//!                                               ─► Transport::send
//!                                               ─► RateLimiter::observe
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and constants
pub mod types;

/// HTTP transport and rate limiting
pub mod http;

/// Path templates
pub mod template;

/// Endpoint descriptors and request execution
pub mod endpoint;

/// Cursor pagination
pub mod pagination;

/// API record types
pub mod models;

/// Route table
pub mod endpoints;

/// Client configuration
pub mod config;

/// The API client
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
