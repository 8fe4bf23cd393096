//! Pagination module
//!
//! Cursor pagination as the API does it: each page body carries its items
//! plus optional `next` / `previous` objects holding an opaque `page` token
//! that is sent back verbatim to fetch the neighbouring page.
//!
//! # Overview
//!
//! - [`PageSource`] holds one resolved request and fetches single pages
//! - [`PageSet`] is one fetched page, able to fetch its neighbours
//! - [`Paginator`] walks forward through the pages lazily

mod paginator;
mod types;

pub use paginator::Paginator;
pub use types::{PageSet, PageSource, LIMIT_PARAM, PAGE_PARAM};
