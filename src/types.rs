//! Wire envelopes for search-results API responses and the merged
//! primary result.
//!
//! One API response deserializes into a [`SerpPage`]: every optional
//! module is an `Option` or a defaulted `Vec`, so downstream planners
//! branch on explicit presence instead of probing raw key/value maps.
//! Pages are treated as read-only once parsed.

use serde::{Deserialize, Serialize};

/// One raw response page from the search-results API.
///
/// Every field the acquisition core consumes is typed here; unknown
/// fields in the response are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerpPage {
    /// Organic search results, in rank order.
    #[serde(default)]
    pub organic_results: Vec<OrganicResult>,
    /// People-also-ask follow-up questions.
    #[serde(default)]
    pub related_questions: Vec<RelatedQuestion>,
    /// Related-search suggestions from the bottom of the page.
    #[serde(default)]
    pub related_searches: Vec<RelatedSearch>,
    /// Discussion/forum items.
    #[serde(default, rename = "discussions_and_forums")]
    pub discussions: Vec<DiscussionItem>,
    /// Paid ads.
    #[serde(default)]
    pub ads: Vec<Ad>,
    /// Knowledge graph panel, kept opaque — downstream classification
    /// owns its interpretation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_graph: Option<serde_json::Value>,
    /// Local pack (main SERP) or flat place list (maps engine).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_results: Option<LocalResults>,
    /// Synthesized AI answer block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_overview: Option<AiOverview>,
    /// Autocomplete suggestions (autocomplete engine only).
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    /// Engine-reported request metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_metadata: Option<SearchMetadata>,
    /// Provider-side request metadata (carries the maps URL used for
    /// geography pinning).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serpapi_search_metadata: Option<ProviderMetadata>,
    /// Next-page link container.
    #[serde(default, rename = "serpapi_pagination", skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Engine-reported error. A page carrying this is a failed call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One organic search result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// One people-also-ask question, possibly AI-generated and possibly
/// carrying a continuation token for the dedicated follow-up engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelatedQuestion {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text_blocks: Vec<TextBlock>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl RelatedQuestion {
    /// Whether this question's answer is an AI-generated block.
    pub fn is_ai_generated(&self) -> bool {
        self.kind.as_deref() == Some("ai_overview")
    }
}

/// One related-search suggestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelatedSearch {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// One discussion/forum item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscussionItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// One paid ad.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ad {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub block_position: Option<String>,
}

/// Local results appear in two shapes on the wire: the main SERP nests
/// places under `{"places": […]}` while the maps engine returns a flat
/// array. Both deserialize into this enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalResults {
    /// Main-SERP local pack.
    Pack { places: Vec<Place> },
    /// Dedicated maps-engine page.
    Flat(Vec<Place>),
}

impl LocalResults {
    /// The place entries regardless of wire shape.
    pub fn places(&self) -> &[Place] {
        match self {
            Self::Pack { places } => places,
            Self::Flat(places) => places,
        }
    }
}

/// One place entry from a local pack or maps page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub category: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews: Option<u64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// Synthesized AI answer attached to a search response.
///
/// Either fully contained (snippet or text blocks present, no token) or
/// paginated via `page_token`, in which case a follow-up call retrieves
/// the full content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiOverview {
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub text_blocks: Vec<TextBlock>,
    #[serde(default)]
    pub page_token: Option<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub references: Vec<Citation>,
}

impl AiOverview {
    /// Flattened answer text: the snippet when present, otherwise the
    /// text blocks joined in order (nested lists included).
    pub fn text(&self) -> Option<String> {
        if let Some(snippet) = &self.snippet {
            if !snippet.is_empty() {
                return Some(snippet.clone());
            }
        }
        let mut parts = Vec::new();
        for block in &self.text_blocks {
            block.collect_text(&mut parts);
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Citation/reference entries regardless of which wire key carried
    /// them.
    pub fn sources(&self) -> impl Iterator<Item = &Citation> {
        self.citations.iter().chain(self.references.iter())
    }
}

/// One structured block of AI answer text. Blocks may nest one level
/// via `list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub list: Vec<TextBlock>,
}

impl TextBlock {
    fn collect_text(&self, out: &mut Vec<String>) {
        if let Some(s) = &self.snippet {
            if !s.is_empty() {
                out.push(s.clone());
            }
        }
        if let Some(t) = &self.text {
            if !t.is_empty() {
                out.push(t.clone());
            }
        }
        for item in &self.list {
            item.collect_text(out);
        }
    }
}

/// One citation or reference attached to an AI answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub relevance: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Engine-reported request metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchMetadata {
    #[serde(default)]
    pub google_url: Option<String>,
}

/// Provider-side metadata; `google_maps_url` carries the coordinates
/// used to pin the maps follow-up to the same geography.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderMetadata {
    #[serde(default)]
    pub google_maps_url: Option<String>,
}

/// Next-page link container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next: Option<String>,
}

/// Union of the primary call's pages after pagination: deduplicated
/// sub-lists plus first-seen singleton modules, with the page count for
/// audit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergedSerp {
    pub organic: Vec<OrganicResult>,
    pub related_questions: Vec<RelatedQuestion>,
    pub related_searches: Vec<RelatedSearch>,
    pub discussions: Vec<DiscussionItem>,
    /// Deduplicated places; main-SERP pack entries first, maps entries
    /// appended by the local planner.
    pub local_places: Vec<Place>,
    pub ads: Vec<Ad>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_graph: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_overview: Option<AiOverview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maps_url: Option<String>,
    /// Whether any page carried a `local_results` module, even an
    /// empty one.
    pub local_results_present: bool,
    /// Pages merged to produce this result.
    pub pages_fetched: usize,
}

impl MergedSerp {
    /// Whether the primary result showed a local pack. Keys on module
    /// presence, so an empty pack still signals local intent.
    pub fn has_local_pack(&self) -> bool {
        self.local_results_present || !self.local_places.is_empty()
    }
}
