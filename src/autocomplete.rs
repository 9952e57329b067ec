//! Autocomplete with progressive query-variant fallback.
//!
//! Long localized keywords often return no autocomplete suggestions, so
//! the resolver derives a fixed variant ladder from the source keyword
//! and tries each in order, stopping at the first variant that yields
//! any suggestions:
//!
//! 1. the keyword verbatim
//! 2. the keyword with a trailing `in <city>` / `<city>` removed
//! 3. the bare topic, with leading phrasing like `help with` removed
//! 4. the bare topic followed by `help`
//!
//! Variants are deduplicated before dispatch. Failed calls count as
//! empty and the ladder continues.

use crate::config::AcquireConfig;
use crate::params::CallParams;
use crate::retry::{RetryClient, Sleeper};
use crate::transport::SerpTransport;
use crate::types::Suggestion;
use std::collections::HashSet;
use std::time::Duration;

const TOPIC_PREFIXES: [&str; 2] = ["help with ", "how to "];

/// Merged suggestions from the ladder, plus every variant actually
/// dispatched.
#[derive(Debug, Default)]
pub struct AutocompleteOutcome {
    /// Deduplicated suggestions (case-insensitive on the value) from
    /// every variant that answered. `None` only when every variant
    /// call failed outright; an empty list means the calls succeeded
    /// and the engine had nothing to suggest.
    pub suggestions: Option<Vec<Suggestion>>,
    /// Variants dispatched, in order, including the productive one.
    pub variants_tried: Vec<String>,
}

/// Build the ordered, deduplicated variant ladder for one keyword.
pub fn query_variants(keyword: &str, city: &str) -> Vec<String> {
    let keyword = keyword.trim();
    let mut variants = Vec::new();
    push_unique(&mut variants, keyword.to_string());

    let without_city = strip_city(keyword, city);
    push_unique(&mut variants, without_city.clone());

    let mut topic = without_city.as_str();
    for prefix in TOPIC_PREFIXES {
        if let Some(rest) = strip_prefix_ci(topic, prefix) {
            topic = rest.trim();
            break;
        }
    }
    push_unique(&mut variants, topic.to_string());
    push_unique(&mut variants, format!("{topic} help"));

    variants
}

/// Walk the variant ladder until one call yields suggestions.
///
/// Suggestions from every variant that answered are merged; an empty
/// answer keeps the ladder going, a failed call keeps it going too but
/// does not count as an answer.
pub async fn resolve_autocomplete<T: SerpTransport, S: Sleeper>(
    client: &RetryClient<T, S>,
    sleeper: &S,
    keyword: &str,
    config: &AcquireConfig,
) -> AutocompleteOutcome {
    let mut outcome = AutocompleteOutcome::default();
    let mut merged: Vec<Suggestion> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut any_answered = false;
    let delay = Duration::from_millis(config.inter_page_delay_ms);

    for variant in query_variants(keyword, config.location_city()) {
        if !outcome.variants_tried.is_empty() {
            sleeper.sleep(delay).await;
        }
        outcome.variants_tried.push(variant.clone());

        let params = CallParams::new("google_autocomplete")
            .with("q", variant.as_str())
            .with("no_cache", "true");

        match client.execute(&params).await {
            Ok(page) => {
                any_answered = true;
                for suggestion in page.suggestions {
                    let key = suggestion
                        .value
                        .as_deref()
                        .unwrap_or("")
                        .trim()
                        .to_lowercase();
                    if seen.insert(key) {
                        merged.push(suggestion);
                    }
                }
                if !merged.is_empty() {
                    tracing::debug!(
                        variant = %variant,
                        count = merged.len(),
                        "autocomplete variant productive"
                    );
                    break;
                }
                tracing::debug!(variant = %variant, "autocomplete variant empty; trying next");
            }
            Err(err) => {
                tracing::warn!(variant = %variant, error = %err, "autocomplete call failed");
            }
        }
    }

    if any_answered {
        outcome.suggestions = Some(merged);
    }
    outcome
}

fn push_unique(variants: &mut Vec<String>, candidate: String) {
    let candidate = candidate.trim().to_string();
    if candidate.is_empty() {
        return;
    }
    if !variants.iter().any(|v| v.eq_ignore_ascii_case(&candidate)) {
        variants.push(candidate);
    }
}

/// Remove a trailing `in <city>` or bare `<city>` mention.
fn strip_city(keyword: &str, city: &str) -> String {
    if city.is_empty() {
        return keyword.to_string();
    }
    let with_in = format!(" in {city}");
    let bare = format!(" {city}");
    if let Some(head) = strip_suffix_ci(keyword, &with_in) {
        return head.trim().to_string();
    }
    if let Some(head) = strip_suffix_ci(keyword, &bare) {
        return head.trim().to_string();
    }
    keyword.to_string()
}

// ASCII-case-insensitive affix removal; suffix boundaries are checked
// so multi-byte keywords never split mid-character.
fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = text.len().checked_sub(suffix.len())?;
    if !text.is_char_boundary(cut) {
        return None;
    }
    let (head, tail) = text.split_at(cut);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if text.len() < prefix.len() || !text.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, tail) = text.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix).then_some(tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SerpError;
    use crate::retry::RetryPolicy;
    use crate::types::SerpPage;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    struct NoopSleeper;

    impl Sleeper for NoopSleeper {
        async fn sleep(&self, _duration: Duration) {}
    }

    struct ScriptedTransport {
        script: Mutex<Vec<Option<SerpPage>>>,
        calls: Mutex<Vec<CallParams>>,
    }

    impl ScriptedTransport {
        fn new(mut script: Vec<Option<SerpPage>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<CallParams> {
            self.calls.lock().expect("lock").clone()
        }
    }

    impl SerpTransport for ScriptedTransport {
        async fn execute(&self, params: &CallParams) -> Result<SerpPage, SerpError> {
            self.calls.lock().expect("lock").push(params.clone());
            match self.script.lock().expect("lock").pop() {
                Some(Some(page)) => Ok(page),
                _ => Err(SerpError::Transport("scripted failure".into())),
            }
        }
    }

    fn client(script: Vec<Option<SerpPage>>) -> RetryClient<ScriptedTransport, NoopSleeper> {
        RetryClient::new(
            ScriptedTransport::new(script),
            NoopSleeper,
            RetryPolicy {
                max_attempts: 1,
                base_backoff: Duration::ZERO,
                max_jitter: Duration::ZERO,
            },
        )
    }

    fn page(value: serde_json::Value) -> SerpPage {
        serde_json::from_value(value).expect("page")
    }

    #[test]
    fn variants_for_localized_help_keyword() {
        let variants = query_variants("help with stress in vancouver", "Vancouver");
        assert_eq!(
            variants,
            vec![
                "help with stress in vancouver".to_string(),
                "help with stress".to_string(),
                "stress".to_string(),
                "stress help".to_string(),
            ]
        );
    }

    #[test]
    fn variants_strip_bare_trailing_city() {
        let variants = query_variants("counselling Vancouver", "Vancouver");
        assert_eq!(variants[0], "counselling Vancouver");
        assert_eq!(variants[1], "counselling");
        assert!(variants.contains(&"counselling help".to_string()));
    }

    #[test]
    fn variants_without_city_mention_skip_duplicates() {
        let variants = query_variants("how to meditate", "Vancouver");
        assert_eq!(
            variants,
            vec![
                "how to meditate".to_string(),
                "meditate".to_string(),
                "meditate help".to_string(),
            ]
        );
    }

    #[test]
    fn variants_are_case_insensitive_on_city() {
        let variants = query_variants("therapy in VANCOUVER", "Vancouver");
        assert_eq!(variants[1], "therapy");
    }

    #[tokio::test]
    async fn first_productive_variant_stops_the_ladder() {
        let client = client(vec![
            Some(page(json!({"suggestions": []}))),
            Some(page(json!({
                "suggestions": [{"value": "help with stress at work"}]
            }))),
        ]);
        let config = AcquireConfig::default();

        let outcome = resolve_autocomplete(
            &client,
            &NoopSleeper,
            "help with stress in vancouver",
            &config,
        )
        .await;

        assert_eq!(outcome.variants_tried.len(), 2);
        assert_eq!(outcome.variants_tried[1], "help with stress");
        assert_eq!(outcome.suggestions.expect("answered").len(), 1);

        let calls = client.transport().calls();
        assert_eq!(calls[0].engine(), "google_autocomplete");
        assert_eq!(calls[0].get("q"), Some("help with stress in vancouver"));
        assert_eq!(calls[1].get("q"), Some("help with stress"));
    }

    #[tokio::test]
    async fn failed_call_continues_the_ladder() {
        let client = client(vec![
            None,
            Some(page(json!({"suggestions": [{"value": "stress relief"}]}))),
        ]);
        let config = AcquireConfig::default();

        let outcome =
            resolve_autocomplete(&client, &NoopSleeper, "stress in vancouver", &config).await;
        assert_eq!(outcome.suggestions.expect("answered").len(), 1);
        assert_eq!(outcome.variants_tried.len(), 2);
    }

    #[tokio::test]
    async fn all_variants_empty_yields_no_suggestions() {
        let client = client(vec![
            Some(page(json!({"suggestions": []}))),
            Some(page(json!({"suggestions": []}))),
            Some(page(json!({"suggestions": []}))),
            Some(page(json!({"suggestions": []}))),
        ]);
        let config = AcquireConfig::default();

        let outcome = resolve_autocomplete(
            &client,
            &NoopSleeper,
            "help with stress in vancouver",
            &config,
        )
        .await;
        // Empty but answered: a valid empty result, not a failure.
        assert_eq!(outcome.suggestions.expect("answered").len(), 0);
        assert_eq!(outcome.variants_tried.len(), 4);
    }

    #[tokio::test]
    async fn every_call_failing_yields_none() {
        let client = client(vec![None, None, None, None]);
        let config = AcquireConfig::default();

        let outcome = resolve_autocomplete(
            &client,
            &NoopSleeper,
            "help with stress in vancouver",
            &config,
        )
        .await;
        assert!(outcome.suggestions.is_none());
        assert_eq!(outcome.variants_tried.len(), 4);
    }

    #[tokio::test]
    async fn suggestion_values_dedup_case_insensitively() {
        let client = client(vec![Some(page(json!({
            "suggestions": [
                {"value": "Stress Relief"},
                {"value": "stress relief "},
                {"value": "stress management"}
            ]
        })))]);
        let config = AcquireConfig::default();

        let outcome = resolve_autocomplete(&client, &NoopSleeper, "stress", &config).await;
        let suggestions = outcome.suggestions.expect("answered");
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].value.as_deref(), Some("Stress Relief"));
    }
}
