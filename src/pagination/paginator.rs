//! Forward-only iteration over pages

use super::types::{PageSet, PageSource};
use crate::error::Result;
use futures::Stream;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PaginatorState {
    NotStarted,
    HasPage { next_page: Option<String> },
    Exhausted,
}

/// Lazily fetches pages one at a time, following `next` cursors.
///
/// The sequence ends the first time the server reports no next cursor. Once
/// exhausted it stays exhausted: further calls to [`Paginator::next_page`]
/// return `Ok(None)` without sending requests. A failed fetch leaves the
/// paginator where it was, so the same step can be attempted again.
pub struct Paginator<R> {
    source: Arc<PageSource<R>>,
    limit: Option<u32>,
    state: PaginatorState,
}

impl<R> Paginator<R> {
    pub fn new(source: PageSource<R>) -> Self {
        Self {
            source: Arc::new(source),
            limit: None,
            state: PaginatorState::NotStarted,
        }
    }

    /// Set the page size for every following fetch
    #[must_use]
    pub fn limit(mut self, limit: impl Into<Option<u32>>) -> Self {
        self.limit = limit.into();
        self
    }

    /// Change the page size for every following fetch
    pub fn set_limit(&mut self, limit: Option<u32>) {
        self.limit = limit;
    }

    pub fn page_limit(&self) -> Option<u32> {
        self.limit
    }

    /// Whether the last page has been passed
    pub fn is_exhausted(&self) -> bool {
        self.state == PaginatorState::Exhausted
    }

    /// Fetch the next page, or `None` once the sequence has ended
    pub async fn next_page(&mut self) -> Result<Option<PageSet<R>>> {
        let token = match &self.state {
            PaginatorState::Exhausted => return Ok(None),
            PaginatorState::NotStarted => None,
            PaginatorState::HasPage { next_page: None } => {
                self.state = PaginatorState::Exhausted;
                return Ok(None);
            }
            PaginatorState::HasPage {
                next_page: Some(token),
            } => Some(token.clone()),
        };

        let page = Arc::clone(&self.source)
            .fetch_page(self.limit, token.as_deref())
            .await?;
        self.state = PaginatorState::HasPage {
            next_page: page.next_page().map(str::to_string),
        };
        Ok(Some(page))
    }

    /// Fetch every remaining page and concatenate the items
    pub async fn collect_items(mut self) -> Result<Vec<R>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page.into_items());
        }
        Ok(items)
    }

    /// Turn the paginator into a stream of pages
    pub fn into_stream(self) -> impl Stream<Item = Result<PageSet<R>>> {
        futures::stream::try_unfold(self, |mut paginator| async move {
            Ok(paginator.next_page().await?.map(|page| (page, paginator)))
        })
    }
}

impl<R> fmt::Debug for Paginator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("source", &self.source)
            .field("limit", &self.limit)
            .field("state", &self.state)
            .finish()
    }
}
