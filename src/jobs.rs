//! Keyword-to-job expansion.
//!
//! Each input keyword becomes one labelled query job (`A`, `B`, ...
//! `Z`, `AA`, `AB`, ...). With AI-alternative expansion enabled, each
//! keyword additionally yields two informational reformulations phrased
//! the way AI answers are usually triggered, labelled `<base>.1` and
//! `<base>.2`.

use crate::config::AcquireConfig;
use serde::Serialize;

/// One query to acquire, tied back to the keyword it came from.
#[derive(Debug, Clone, Serialize)]
pub struct QueryJob {
    /// The query text dispatched to the search engine (before any
    /// location suffixing the orchestrator applies).
    pub executed_query: String,
    /// The input keyword this job derives from. Equal to
    /// `executed_query` for base jobs.
    pub source_keyword: String,
    /// Stable audit label (`A`, `B.1`, ...).
    pub label: String,
}

/// Expand input keywords into the ordered job list.
pub fn expand_keywords(keywords: &[String], config: &AcquireConfig) -> Vec<QueryJob> {
    let mut jobs = Vec::new();
    for (index, keyword) in keywords.iter().enumerate() {
        let base = base_label(index);
        jobs.push(QueryJob {
            executed_query: keyword.clone(),
            source_keyword: keyword.clone(),
            label: base.clone(),
        });

        if config.ai_query_alternatives {
            let alternatives = ai_query_alternatives(keyword, config.location_city());
            for (offset, alternative) in alternatives.into_iter().enumerate() {
                jobs.push(QueryJob {
                    executed_query: alternative,
                    source_keyword: keyword.clone(),
                    label: format!("{base}.{}", offset + 1),
                });
            }
        }
    }
    jobs
}

/// Reformulate a transactional keyword into informational questions
/// that commonly trigger a synthesized AI answer.
///
/// The service term is the keyword with a leading `best` and anything
/// from a trailing ` in <place>` clause removed; the cost question is
/// pinned to the configured city, not the place named in the keyword.
pub fn ai_query_alternatives(keyword: &str, city: &str) -> Vec<String> {
    let lowered = keyword.trim().to_lowercase();
    let core = lowered.strip_prefix("best ").unwrap_or(&lowered);
    let service = match core.split_once(" in ") {
        Some((before, _)) => before,
        None => core,
    }
    .trim();
    if service.is_empty() {
        return Vec::new();
    }
    vec![
        format!("How to choose the right {service}?"),
        format!("How much does {service} cost in {city}?"),
    ]
}

/// Spreadsheet-style label for a zero-based index: `A`..`Z`, `AA`,
/// `AB`, ...
fn base_label(index: usize) -> String {
    let mut value = index + 1;
    let mut label = Vec::new();
    while value > 0 {
        let rem = (value - 1) % 26;
        label.push(b'A' + rem as u8);
        value = (value - 1) / 26;
    }
    label.reverse();
    // Labels are built from ASCII uppercase only.
    String::from_utf8(label).unwrap_or_default()
}
