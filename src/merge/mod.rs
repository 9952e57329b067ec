//! Pagination and page merging.
//!
//! [`cursor`] extracts the next-page cursor from a response,
//! [`accumulator`] merges repeated-shape pages with per-entity stable
//! keys, and [`paginate`] drives the follow-the-cursor loop with its
//! stop conditions.

pub mod accumulator;
pub mod cursor;
pub mod paginate;

pub use accumulator::SerpAccumulator;
pub use cursor::next_cursor;
pub use paginate::PageMerger;
