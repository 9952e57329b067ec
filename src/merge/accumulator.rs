//! Repeated-shape page merging with per-entity stable keys.
//!
//! [`SerpAccumulator`] folds pages into one [`MergedSerp`] with
//! first-seen-wins, order-preserving deduplication. Keys per entity:
//!
//! - organic items: link; fallback title + position when link is absent
//! - related/PAA questions: question text
//! - related searches: query text
//! - discussion/forum items: link; fallback title
//! - places: place identifier; fallback title + address
//!
//! Absorbing the same page content twice is idempotent — entity counts
//! do not change.

use crate::types::{
    DiscussionItem, MergedSerp, OrganicResult, Place, RelatedQuestion, SerpPage,
};
use std::collections::HashSet;

/// Accumulates pages into one merged result.
#[derive(Debug, Default)]
pub struct SerpAccumulator {
    merged: MergedSerp,
    seen_organic: HashSet<String>,
    seen_questions: HashSet<String>,
    seen_searches: HashSet<String>,
    seen_discussions: HashSet<String>,
    seen_places: HashSet<String>,
}

impl SerpAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one page into the accumulated result and count it as
    /// fetched. Singleton modules (AI answer, knowledge graph, ads,
    /// metadata URLs) are taken from the first page that carries them.
    pub fn absorb(&mut self, page: &SerpPage) {
        self.merged.pages_fetched += 1;

        for item in &page.organic_results {
            if self.seen_organic.insert(organic_key(item)) {
                self.merged.organic.push(item.clone());
            }
        }
        self.absorb_questions(&page.related_questions);
        for item in &page.related_searches {
            let key = item.query.clone().unwrap_or_default();
            if self.seen_searches.insert(key) {
                self.merged.related_searches.push(item.clone());
            }
        }
        for item in &page.discussions {
            if self.seen_discussions.insert(discussion_key(item)) {
                self.merged.discussions.push(item.clone());
            }
        }
        if let Some(local) = &page.local_results {
            self.merged.local_results_present = true;
            self.absorb_places(local.places());
        }

        if self.merged.ai_overview.is_none() {
            self.merged.ai_overview = page.ai_overview.clone();
        }
        if self.merged.knowledge_graph.is_none() {
            self.merged.knowledge_graph = page.knowledge_graph.clone();
        }
        if self.merged.ads.is_empty() {
            self.merged.ads = page.ads.clone();
        }
        if self.merged.google_url.is_none() {
            self.merged.google_url = page
                .search_metadata
                .as_ref()
                .and_then(|m| m.google_url.clone());
        }
        if self.merged.maps_url.is_none() {
            self.merged.maps_url = page
                .serpapi_search_metadata
                .as_ref()
                .and_then(|m| m.google_maps_url.clone());
        }
    }

    /// Merge question items by question text (used both for pages and
    /// for the related-questions follow-up chain).
    pub fn absorb_questions(&mut self, questions: &[RelatedQuestion]) {
        for item in questions {
            let key = item.question.clone().unwrap_or_default();
            if self.seen_questions.insert(key) {
                self.merged.related_questions.push(item.clone());
            }
        }
    }

    /// Merge place entries by place identity (used both for local packs
    /// embedded in SERP pages and for dedicated maps pages).
    pub fn absorb_places(&mut self, places: &[Place]) {
        for place in places {
            if self.seen_places.insert(place_key(place)) {
                self.merged.local_places.push(place.clone());
            }
        }
    }

    /// Number of organic items merged so far.
    pub fn organic_len(&self) -> usize {
        self.merged.organic.len()
    }

    /// Pages absorbed so far.
    pub fn pages_fetched(&self) -> usize {
        self.merged.pages_fetched
    }

    /// Finish accumulation and take the merged result.
    pub fn finish(self) -> MergedSerp {
        self.merged
    }
}

fn organic_key(item: &OrganicResult) -> String {
    match item.link.as_deref() {
        Some(link) if !link.is_empty() => format!("link:{link}"),
        _ => format!(
            "title:{}|{}",
            item.title.as_deref().unwrap_or(""),
            item.position.map(|p| p.to_string()).unwrap_or_default()
        ),
    }
}

fn discussion_key(item: &DiscussionItem) -> String {
    match item.link.as_deref() {
        Some(link) if !link.is_empty() => format!("link:{link}"),
        _ => format!("title:{}", item.title.as_deref().unwrap_or("")),
    }
}

/// Stable identity key for a place entry.
pub fn place_key(place: &Place) -> String {
    match place.place_id.as_deref() {
        Some(id) if !id.is_empty() => format!("id:{id}"),
        _ => format!(
            "name:{}|{}",
            place.title.as_deref().unwrap_or(""),
            place.address.as_deref().unwrap_or("")
        ),
    }
}
