//! AI-answer resolution state machine.
//!
//! Four terminal outcomes from the (answer-present, token-present)
//! combinations, plus a fallback probe:
//!
//! - answer absent, probe disabled or empty → [`AiOverviewMode::NotPresent`]
//! - answer absent, probe without location bias finds one →
//!   [`AiOverviewMode::FallbackWithoutLocation`]
//! - answer present, no continuation token →
//!   [`AiOverviewMode::DirectInMain`] (content already complete, no call)
//! - answer present with token → exactly one follow-up call carrying
//!   only the token → [`AiOverviewMode::TokenFollowupSuccess`] or
//!   [`AiOverviewMode::TokenFollowupFailed`]
//!
//! A failed follow-up is non-fatal: the job keeps whatever the primary
//! call already produced.

use crate::config::AcquireConfig;
use crate::params::CallParams;
use crate::retry::{RetryClient, Sleeper};
use crate::transport::SerpTransport;
use crate::types::AiOverview;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal state of the AI-answer machine, recorded in the audit
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiOverviewMode {
    NotPresent,
    DirectInMain,
    TokenFollowupSuccess,
    TokenFollowupFailed,
    FallbackWithoutLocation,
}

impl AiOverviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotPresent => "not_present",
            Self::DirectInMain => "direct_in_main",
            Self::TokenFollowupSuccess => "token_followup_success",
            Self::TokenFollowupFailed => "token_followup_failed",
            Self::FallbackWithoutLocation => "fallback_without_location",
        }
    }
}

impl fmt::Display for AiOverviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the machine resolved, with follow-up timing for the audit
/// entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AiOverviewOutcome {
    pub mode: Option<AiOverviewMode>,
    /// Best available answer content after resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<AiOverview>,
    pub token_received_at: Option<DateTime<Utc>>,
    pub followup_started_at: Option<DateTime<Utc>>,
    pub followup_latency_ms: Option<u64>,
    pub error: Option<String>,
}

impl AiOverviewOutcome {
    fn terminal(mode: AiOverviewMode, overview: Option<AiOverview>) -> Self {
        Self {
            mode: Some(mode),
            overview,
            ..Default::default()
        }
    }

    /// The resolved mode (always set once the machine has run).
    pub fn resolved_mode(&self) -> AiOverviewMode {
        self.mode.unwrap_or(AiOverviewMode::NotPresent)
    }
}

/// Run the AI-answer machine against the primary result's answer block.
///
/// `query` is the job's executed query; the fallback probe reuses it
/// verbatim with the location bias removed.
pub async fn resolve_ai_overview<T: SerpTransport, S: Sleeper>(
    client: &RetryClient<T, S>,
    primary: Option<&AiOverview>,
    query: &str,
    config: &AcquireConfig,
) -> AiOverviewOutcome {
    let Some(overview) = primary else {
        return probe_without_location(client, query, config).await;
    };

    let Some(token) = overview.page_token.clone() else {
        tracing::debug!("AI answer fully contained in primary response");
        return AiOverviewOutcome::terminal(AiOverviewMode::DirectInMain, Some(overview.clone()));
    };

    // Exactly one follow-up, carrying only the token.
    let token_received_at = Utc::now();
    let params = CallParams::new("google_ai_overview")
        .with("page_token", token)
        .with("no_cache", "true");

    let followup_started_at = Utc::now();
    tracing::info!("fetching AI answer continuation");
    let result = client.execute(&params).await;
    let latency = (Utc::now() - followup_started_at)
        .num_milliseconds()
        .max(0) as u64;

    match result {
        Ok(page) => {
            // Prefer the follow-up's content; never lose the primary's.
            let resolved = page.ai_overview.or_else(|| Some(overview.clone()));
            AiOverviewOutcome {
                mode: Some(AiOverviewMode::TokenFollowupSuccess),
                overview: resolved,
                token_received_at: Some(token_received_at),
                followup_started_at: Some(followup_started_at),
                followup_latency_ms: Some(latency),
                error: None,
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "AI answer follow-up failed; keeping primary content");
            AiOverviewOutcome {
                mode: Some(AiOverviewMode::TokenFollowupFailed),
                overview: Some(overview.clone()),
                token_received_at: Some(token_received_at),
                followup_started_at: Some(followup_started_at),
                followup_latency_ms: Some(latency),
                error: Some(err.to_string()),
            }
        }
    }
}

/// One probe with the same query text and no location bias. Used only
/// when the primary result carries no AI answer.
async fn probe_without_location<T: SerpTransport, S: Sleeper>(
    client: &RetryClient<T, S>,
    query: &str,
    config: &AcquireConfig,
) -> AiOverviewOutcome {
    if !config.ai_fallback_probe {
        return AiOverviewOutcome::terminal(AiOverviewMode::NotPresent, None);
    }

    let params = CallParams::new("google")
        .with("q", query)
        .with("hl", config.hl.as_str())
        .with("gl", config.gl.as_str())
        .with("no_cache", "true");

    tracing::debug!("probing for AI answer without location bias");
    match client.execute(&params).await {
        Ok(page) => match page.ai_overview {
            Some(overview) => {
                tracing::info!("AI answer found by location-free probe");
                AiOverviewOutcome::terminal(
                    AiOverviewMode::FallbackWithoutLocation,
                    Some(overview),
                )
            }
            None => AiOverviewOutcome::terminal(AiOverviewMode::NotPresent, None),
        },
        Err(err) => {
            tracing::warn!(error = %err, "AI probe failed");
            AiOverviewOutcome::terminal(AiOverviewMode::NotPresent, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SerpError;
    use crate::retry::RetryPolicy;
    use crate::types::SerpPage;
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

    fn overview(value: serde_json::Value) -> AiOverview {
        serde_json::from_value(value).expect("overview")
    }

    fn page(value: serde_json::Value) -> SerpPage {
        serde_json::from_value(value).expect("page")
    }

    #[tokio::test]
    async fn present_without_token_is_direct_in_main() {
        let client = client(vec![]);
        let primary = overview(json!({"snippet": "Complete answer."}));
        let config = AcquireConfig::default();

        let outcome = resolve_ai_overview(&client, Some(&primary), "q", &config).await;
        assert_eq!(outcome.resolved_mode(), AiOverviewMode::DirectInMain);
        assert!(client.transport().calls().is_empty());
        assert_eq!(
            outcome.overview.and_then(|o| o.snippet).as_deref(),
            Some("Complete answer.")
        );
    }

    #[tokio::test]
    async fn token_triggers_exactly_one_followup_with_only_the_token() {
        let client = client(vec![Some(page(json!({
            "ai_overview": {"snippet": "Detailed AI answer"}
        })))]);
        let primary = overview(json!({"page_token": "tok"}));
        let config = AcquireConfig::default();

        let outcome = resolve_ai_overview(&client, Some(&primary), "q", &config).await;
        assert_eq!(outcome.resolved_mode(), AiOverviewMode::TokenFollowupSuccess);

        let calls = client.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].engine(), "google_ai_overview");
        assert_eq!(calls[0].get("page_token"), Some("tok"));
        assert!(calls[0].get("q").is_none());
        assert!(calls[0].get("location").is_none());

        assert!(outcome.token_received_at.is_some());
        assert!(outcome.followup_started_at.is_some());
        assert!(outcome.followup_latency_ms.is_some());
        assert_eq!(
            outcome.overview.and_then(|o| o.snippet).as_deref(),
            Some("Detailed AI answer")
        );
    }

    #[tokio::test]
    async fn failed_followup_keeps_primary_content() {
        let client = client(vec![None]);
        let primary = overview(json!({"page_token": "tok", "snippet": "partial"}));
        let config = AcquireConfig::default();

        let outcome = resolve_ai_overview(&client, Some(&primary), "q", &config).await;
        assert_eq!(outcome.resolved_mode(), AiOverviewMode::TokenFollowupFailed);
        assert!(outcome.error.is_some());
        assert_eq!(
            outcome.overview.and_then(|o| o.snippet).as_deref(),
            Some("partial")
        );
    }

    #[tokio::test]
    async fn absent_answer_with_successful_probe_is_fallback() {
        let client = client(vec![Some(page(json!({
            "ai_overview": {"snippet": "AI fallback snippet"}
        })))]);
        let config = AcquireConfig::default();

        let outcome = resolve_ai_overview(&client, None, "stress help", &config).await;
        assert_eq!(
            outcome.resolved_mode(),
            AiOverviewMode::FallbackWithoutLocation
        );

        let calls = client.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].engine(), "google");
        assert_eq!(calls[0].get("q"), Some("stress help"));
        assert!(calls[0].get("location").is_none());
    }

    #[tokio::test]
    async fn absent_answer_with_empty_probe_stays_not_present() {
        let client = client(vec![Some(page(json!({"organic_results": []})))]);
        let config = AcquireConfig::default();

        let outcome = resolve_ai_overview(&client, None, "q", &config).await;
        assert_eq!(outcome.resolved_mode(), AiOverviewMode::NotPresent);
        assert!(outcome.overview.is_none());
    }

    #[tokio::test]
    async fn probe_failure_is_absorbed_as_not_present() {
        let client = client(vec![None]);
        let config = AcquireConfig::default();

        let outcome = resolve_ai_overview(&client, None, "q", &config).await;
        assert_eq!(outcome.resolved_mode(), AiOverviewMode::NotPresent);
    }

    #[tokio::test]
    async fn probe_disabled_skips_the_call() {
        let client = client(vec![]);
        let config = AcquireConfig {
            ai_fallback_probe: false,
            ..Default::default()
        };

        let outcome = resolve_ai_overview(&client, None, "q", &config).await;
        assert_eq!(outcome.resolved_mode(), AiOverviewMode::NotPresent);
        assert!(client.transport().calls().is_empty());
    }

    #[test]
    fn mode_strings_are_stable() {
        assert_eq!(AiOverviewMode::NotPresent.to_string(), "not_present");
        assert_eq!(AiOverviewMode::DirectInMain.to_string(), "direct_in_main");
        assert_eq!(
            AiOverviewMode::TokenFollowupSuccess.to_string(),
            "token_followup_success"
        );
        assert_eq!(
            AiOverviewMode::TokenFollowupFailed.to_string(),
            "token_followup_failed"
        );
        assert_eq!(
            AiOverviewMode::FallbackWithoutLocation.to_string(),
            "fallback_without_location"
        );
    }
}
