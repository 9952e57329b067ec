//! Next-page cursor extraction.
//!
//! The provider reports pagination as a fully-formed "next" URL; the
//! cursor is its `start` offset parameter. A page without a parseable
//! cursor terminates pagination.

use crate::types::SerpPage;
use url::Url;

/// Extract the next-page cursor (the `start` offset) from a page's
/// pagination link, if any.
pub fn next_cursor(page: &SerpPage) -> Option<String> {
    let next = page.pagination.as_ref()?.next.as_deref()?;
    let parsed = Url::parse(next).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "start")
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.is_empty())
}
