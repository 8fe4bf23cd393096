//! Pages and the requests that produce them

use crate::endpoint::{execute, EndpointDescriptor};
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::types::Query;
use serde::Deserialize;
use serde_json::value::RawValue;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Query parameter carrying the page size
pub const LIMIT_PARAM: &str = "limit";
/// Query parameter carrying the page cursor
pub const PAGE_PARAM: &str = "page";

/// Pagination envelope: `{"items": [...], "next": {"page": ..}, "previous": {"page": ..}}`
#[derive(Debug, Deserialize)]
struct RawPage {
    items: Vec<Box<RawValue>>,
    #[serde(default)]
    next: Option<Cursor>,
    #[serde(default)]
    previous: Option<Cursor>,
}

#[derive(Debug, Deserialize)]
struct Cursor {
    #[serde(default)]
    page: Option<String>,
}

/// One resolved paginated request: the endpoint, the transport, the
/// rendered path and the query every page shares
pub struct PageSource<R> {
    descriptor: Arc<EndpointDescriptor<R>>,
    transport: Arc<dyn Transport>,
    path: String,
    query: Query,
}

impl<R> PageSource<R> {
    pub fn new(
        descriptor: Arc<EndpointDescriptor<R>>,
        transport: Arc<dyn Transport>,
        path: String,
        query: Query,
    ) -> Self {
        Self {
            descriptor,
            transport,
            path,
            query,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fetch one page.
    ///
    /// `limit` and `page` are added to the shared query when set. The items
    /// are decoded with the endpoint's decoder; a page either decodes fully
    /// or the whole fetch fails.
    pub async fn fetch_page(self: Arc<Self>, limit: Option<u32>, page: Option<&str>) -> Result<PageSet<R>> {
        let mut query = self.query.clone();
        if let Some(limit) = limit {
            query.push((LIMIT_PARAM.to_string(), limit.to_string()));
        }
        if let Some(page) = page {
            query.push((PAGE_PARAM.to_string(), page.to_string()));
        }

        let response = execute(self.transport.as_ref(), &self.descriptor, &self.path, &query)
            .await?
            .error_for_status()?;

        let raw: RawPage = serde_json::from_slice(&response.body)
            .map_err(|e| Error::decode(format!("invalid page envelope: {e}")))?;
        let items = raw
            .items
            .iter()
            .map(|item| self.descriptor.decode(item.get().as_bytes()))
            .collect::<Result<Vec<R>>>()?;

        let next_page = raw.next.and_then(|c| c.page);
        let prev_page = raw.previous.and_then(|c| c.page);
        debug!(
            endpoint = %self.descriptor,
            items = items.len(),
            has_next = next_page.is_some(),
            "Fetched page"
        );

        Ok(PageSet {
            items,
            next_page,
            prev_page,
            limit,
            source: self,
        })
    }
}

impl<R> fmt::Debug for PageSource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageSource")
            .field("endpoint", &self.descriptor.to_string())
            .field("path", &self.path)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

/// An immutable page of records with cursors to its neighbours
pub struct PageSet<R> {
    items: Vec<R>,
    next_page: Option<String>,
    prev_page: Option<String>,
    limit: Option<u32>,
    source: Arc<PageSource<R>>,
}

impl<R> PageSet<R> {
    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn into_items(self) -> Vec<R> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cursor of the following page, if the server reported one
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Cursor of the preceding page, if the server reported one
    pub fn prev_page(&self) -> Option<&str> {
        self.prev_page.as_deref()
    }

    /// Page size this page was requested with
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Fetch the following page with the same limit.
    ///
    /// Returns `Ok(None)` without sending anything when there is no next
    /// cursor.
    pub async fn next(&self) -> Result<Option<PageSet<R>>> {
        match &self.next_page {
            Some(token) => self.fetch(token).await.map(Some),
            None => Ok(None),
        }
    }

    /// Fetch the preceding page with the same limit.
    ///
    /// Returns `Ok(None)` without sending anything when there is no previous
    /// cursor.
    pub async fn prev(&self) -> Result<Option<PageSet<R>>> {
        match &self.prev_page {
            Some(token) => self.fetch(token).await.map(Some),
            None => Ok(None),
        }
    }

    async fn fetch(&self, token: &str) -> Result<PageSet<R>> {
        Arc::clone(&self.source)
            .fetch_page(self.limit, Some(token))
            .await
    }
}

impl<R: fmt::Debug> fmt::Debug for PageSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageSet")
            .field("items", &self.items)
            .field("next_page", &self.next_page)
            .field("prev_page", &self.prev_page)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}
