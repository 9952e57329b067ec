//! Bounded related-questions token chain.
//!
//! Question entries in a SERP can carry a continuation token that
//! yields a page of further questions, and those questions can carry
//! tokens of their own. The chain walks that token graph breadth-first
//! under a hard call budget, skipping tokens it has already dispatched.
//! Failed calls are absorbed; they still consume budget.

use crate::params::CallParams;
use crate::retry::{RetryClient, Sleeper};
use crate::transport::SerpTransport;
use crate::types::{RelatedQuestion, SerpPage};
use std::collections::{HashSet, VecDeque};

/// Pages fetched by the chain, plus the number of calls it issued.
#[derive(Debug, Default)]
pub struct RelatedChainOutcome {
    pub pages: Vec<SerpPage>,
    pub calls_made: usize,
}

/// Walk continuation tokens seeded by the merged primary questions.
///
/// `max_calls` caps calls issued, successful or not. A token seen twice
/// is dispatched once.
pub async fn expand_related_questions<T: SerpTransport, S: Sleeper>(
    client: &RetryClient<T, S>,
    seeds: &[RelatedQuestion],
    max_calls: usize,
) -> RelatedChainOutcome {
    let mut outcome = RelatedChainOutcome::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();

    enqueue_tokens(seeds, &mut seen, &mut queue);

    while let Some(token) = queue.pop_front() {
        if outcome.calls_made >= max_calls {
            tracing::debug!(max_calls, "related-questions call budget reached");
            break;
        }
        outcome.calls_made += 1;

        let params = CallParams::new("google_related_questions")
            .with("next_page_token", token)
            .with("no_cache", "true");

        match client.execute(&params).await {
            Ok(page) => {
                enqueue_tokens(&page.related_questions, &mut seen, &mut queue);
                outcome.pages.push(page);
            }
            Err(err) => {
                tracing::warn!(error = %err, "related-questions call failed; continuing chain");
            }
        }
    }

    outcome
}

fn enqueue_tokens(
    questions: &[RelatedQuestion],
    seen: &mut HashSet<String>,
    queue: &mut VecDeque<String>,
) {
    for question in questions {
        let Some(token) = question.next_page_token.as_deref() else {
            continue;
        };
        if !token.is_empty() && seen.insert(token.to_string()) {
            queue.push_back(token.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SerpError;
    use crate::retry::RetryPolicy;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

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

    fn questions(value: serde_json::Value) -> Vec<RelatedQuestion> {
        serde_json::from_value(value).expect("questions")
    }

    fn page(value: serde_json::Value) -> SerpPage {
        serde_json::from_value(value).expect("page")
    }

    #[tokio::test]
    async fn seeds_without_tokens_issue_no_calls() {
        let client = client(vec![]);
        let seeds = questions(json!([{"question": "Why?"}, {"question": "How?"}]));

        let outcome = expand_related_questions(&client, &seeds, 5).await;
        assert_eq!(outcome.calls_made, 0);
        assert!(outcome.pages.is_empty());
    }

    #[tokio::test]
    async fn chain_follows_tokens_found_in_fetched_pages() {
        let client = client(vec![
            Some(page(json!({
                "related_questions": [
                    {"question": "Second hop?", "next_page_token": "t2"}
                ]
            }))),
            Some(page(json!({
                "related_questions": [{"question": "Terminal"}]
            }))),
        ]);
        let seeds = questions(json!([{"question": "Seed?", "next_page_token": "t1"}]));

        let outcome = expand_related_questions(&client, &seeds, 5).await;
        assert_eq!(outcome.calls_made, 2);
        assert_eq!(outcome.pages.len(), 2);

        let calls = client.transport().calls();
        assert_eq!(calls[0].engine(), "google_related_questions");
        assert_eq!(calls[0].get("next_page_token"), Some("t1"));
        assert_eq!(calls[1].get("next_page_token"), Some("t2"));
        assert!(calls[0].get("q").is_none());
    }

    #[tokio::test]
    async fn call_budget_caps_the_chain() {
        let client = client(vec![
            Some(page(json!({
                "related_questions": [{"question": "More", "next_page_token": "t2"}]
            }))),
            Some(page(json!({
                "related_questions": [{"question": "Even more", "next_page_token": "t3"}]
            }))),
        ]);
        let seeds = questions(json!([{"question": "Seed?", "next_page_token": "t1"}]));

        let outcome = expand_related_questions(&client, &seeds, 2).await;
        assert_eq!(outcome.calls_made, 2);
        assert_eq!(outcome.pages.len(), 2);
    }

    #[tokio::test]
    async fn repeated_token_dispatches_once() {
        let client = client(vec![Some(page(json!({"related_questions": []})))]);
        let seeds = questions(json!([
            {"question": "First?", "next_page_token": "dup"},
            {"question": "Second?", "next_page_token": "dup"}
        ]));

        let outcome = expand_related_questions(&client, &seeds, 5).await;
        assert_eq!(outcome.calls_made, 1);
    }

    #[tokio::test]
    async fn failed_call_consumes_budget_and_chain_continues() {
        let client = client(vec![
            None,
            Some(page(json!({"related_questions": [{"question": "Recovered"}]}))),
        ]);
        let seeds = questions(json!([
            {"question": "A?", "next_page_token": "t1"},
            {"question": "B?", "next_page_token": "t2"}
        ]));

        let outcome = expand_related_questions(&client, &seeds, 5).await;
        assert_eq!(outcome.calls_made, 2);
        assert_eq!(outcome.pages.len(), 1);
    }

    #[tokio::test]
    async fn empty_token_is_ignored() {
        let client = client(vec![]);
        let seeds = questions(json!([{"question": "A?", "next_page_token": ""}]));

        let outcome = expand_related_questions(&client, &seeds, 5).await;
        assert_eq!(outcome.calls_made, 0);
    }
}
