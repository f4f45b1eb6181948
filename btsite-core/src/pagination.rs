//! Multi-page listing traversal.
//!
//! Both architectures walk paginated listings the same way: fetch a page,
//! fold its items into a running total, pause, follow the cursor. The walk
//! ends when a page reports no successor. Cursors already visited also end
//! the walk, and [`PageWalker`] refuses to go past its page cap.

use std::collections::HashSet;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use crate::config::ClientSettings;
use crate::errors::SiteError;

/// One fetched page and the cursor of the page after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T, C> {
    pub items: Vec<T>,
    pub next: Option<C>,
}

impl<T> Page<T, String> {
    /// Builds a page from an engine cursor, where an empty cursor ends the listing.
    pub fn with_cursor(items: Vec<T>, next_page: String) -> Self {
        Self {
            items,
            next: (!next_page.is_empty()).then_some(next_page),
        }
    }
}

impl<T> Page<T, u32> {
    /// Builds a page of a numbered listing that ends at the first empty page.
    pub fn numbered(items: Vec<T>, page_number: u32) -> Self {
        let next = (!items.is_empty()).then(|| page_number + 1);
        Self { items, next }
    }
}

/// Walks paginated listings with a fixed delay between page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWalker {
    delay: Duration,
    max_pages: usize,
}

impl PageWalker {
    pub fn new(delay: Duration, max_pages: usize) -> Self {
        Self { delay, max_pages }
    }

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(settings.page_delay, settings.max_pages)
    }

    /// Fetches pages starting at `start` and folds every item into `init`.
    ///
    /// # Errors
    /// - Any error returned by `fetch`, immediately and without a partial total
    /// - `SiteError::PaginationLimit` - More than `max_pages` pages were requested
    pub async fn fold<C, T, A, F, Fut, G>(
        &self,
        start: C,
        init: A,
        mut fetch: F,
        mut fold: G,
    ) -> Result<A, SiteError>
    where
        C: Clone + Eq + Hash + Debug,
        F: FnMut(C) -> Fut,
        Fut: Future<Output = Result<Page<T, C>, SiteError>>,
        G: FnMut(A, T) -> A,
    {
        let mut visited = HashSet::new();
        let mut cursor = start;
        let mut acc = init;
        let mut pages = 0usize;

        loop {
            if pages >= self.max_pages {
                tracing::warn!("Pagination stopped after {} pages", pages);
                return Err(SiteError::PaginationLimit {
                    pages: self.max_pages,
                });
            }
            if pages > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            visited.insert(cursor.clone());
            let page = fetch(cursor).await?;
            pages += 1;
            acc = page.items.into_iter().fold(acc, &mut fold);

            match page.next {
                None => break,
                Some(next) if visited.contains(&next) => {
                    tracing::warn!("Pagination cursor {:?} repeats, stopping", next);
                    break;
                }
                Some(next) => cursor = next,
            }
        }

        tracing::debug!("Pagination finished after {} pages", pages);
        Ok(acc)
    }
}
