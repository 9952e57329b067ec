//! Follow-the-cursor pagination loop.
//!
//! [`PageMerger`] folds a cursor chain into one [`MergedSerp`]. It is
//! generic over an async `fetch_next` closure so the primary search and
//! the maps follow-up reuse the same loop with different parameter
//! builders (and so tests can script page sequences directly).

use crate::merge::accumulator::SerpAccumulator;
use crate::merge::cursor::next_cursor;
use crate::types::{MergedSerp, SerpPage};
use std::collections::HashSet;
use std::future::Future;

/// Pagination bounds for one call chain.
#[derive(Debug, Clone, Copy)]
pub struct PageMerger {
    /// Maximum pages fetched, including the first.
    pub max_pages: usize,
    /// Stop following cursors once this many organic items are merged.
    pub max_items: usize,
}

impl PageMerger {
    pub fn new(max_pages: usize, max_items: usize) -> Self {
        Self {
            max_pages,
            max_items,
        }
    }

    /// Merge a cursor chain starting from an already-fetched first
    /// page.
    ///
    /// Stops when: the current page has no cursor, `max_pages` is
    /// reached, `max_items` organic items have been merged, a cursor
    /// repeats a previously seen value (cycle guard — halts without an
    /// extra fetch), or `fetch_next` returns no page.
    pub async fn merge<F, Fut>(&self, first_page: SerpPage, mut fetch_next: F) -> MergedSerp
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Option<SerpPage>>,
    {
        let mut acc = SerpAccumulator::new();
        let mut seen_cursors: HashSet<String> = HashSet::new();
        let mut page = first_page;

        loop {
            let cursor = next_cursor(&page);
            acc.absorb(&page);

            let Some(cursor) = cursor else {
                break;
            };
            if acc.pages_fetched() >= self.max_pages {
                tracing::debug!(max_pages = self.max_pages, "page budget reached");
                break;
            }
            if acc.organic_len() >= self.max_items {
                tracing::debug!(max_items = self.max_items, "merged item budget reached");
                break;
            }
            if !seen_cursors.insert(cursor.clone()) {
                tracing::warn!(cursor = %cursor, "pagination cursor repeated; halting");
                break;
            }

            match fetch_next(cursor).await {
                Some(next_page) => page = next_page,
                None => break,
            }
        }

        let merged = acc.finish();
        tracing::debug!(
            pages = merged.pages_fetched,
            organic = merged.organic.len(),
            "pagination merged"
        );
        merged
    }
}
