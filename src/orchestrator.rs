//! Sequential acquisition pipeline.
//!
//! One [`Orchestrator`] runs labelled query jobs in order, one at a
//! time. Per job: primary paginated search, then the AI-answer
//! machine, the maps local follow-up, the related-questions chain, and
//! autocomplete resolution. Follow-up failures degrade to whatever the
//! primary call produced; only a failed primary call marks the job
//! itself as failed, and even that never aborts the remaining jobs.
//! A politeness delay follows every job.

use crate::audit::{AuditEntry, QueryMetadata};
use crate::autocomplete::{resolve_autocomplete, AutocompleteOutcome};
use crate::config::AcquireConfig;
use crate::error::SerpError;
use crate::fingerprint::params_fingerprint;
use crate::jobs::QueryJob;
use crate::merge::{PageMerger, SerpAccumulator};
use crate::params::CallParams;
use crate::planner::{expand_related_questions, resolve_ai_overview, resolve_local_results};
use crate::retry::{RetryClient, RetryPolicy, Sleeper};
use crate::transport::SerpTransport;
use crate::types::MergedSerp;
use chrono::Utc;
use std::time::Duration;

/// Everything one job produced: the merged result, its audit entry and
/// provenance, and the autocomplete outcome for the source keyword.
#[derive(Debug)]
pub struct JobOutcome {
    pub job: QueryJob,
    pub merged: MergedSerp,
    pub audit: AuditEntry,
    pub metadata: QueryMetadata,
    pub autocomplete: AutocompleteOutcome,
}

/// Drives the per-job acquisition pipeline over a validated config.
pub struct Orchestrator<T, S> {
    client: RetryClient<T, S>,
    sleeper: S,
    config: AcquireConfig,
}

impl<T: SerpTransport, S: Sleeper + Clone> Orchestrator<T, S> {
    /// Build an orchestrator, validating the config first.
    ///
    /// # Errors
    ///
    /// Returns [`SerpError::Config`] when the config fails validation.
    pub fn new(transport: T, sleeper: S, config: AcquireConfig) -> Result<Self, SerpError> {
        config.validate()?;
        let client = RetryClient::new(transport, sleeper.clone(), RetryPolicy::from_config(&config));
        Ok(Self {
            client,
            sleeper,
            config,
        })
    }

    /// Run every job sequentially, in order, with a politeness delay
    /// after each one.
    pub async fn run(&self, jobs: &[QueryJob], run_id: &str) -> Vec<JobOutcome> {
        let delay = Duration::from_millis(self.config.inter_job_delay_ms);
        let mut outcomes = Vec::with_capacity(jobs.len());

        for job in jobs {
            tracing::info!(label = %job.label, keyword = %job.source_keyword, "acquiring query job");
            let outcome = self.acquire(job, run_id).await;
            tracing::info!(
                label = %job.label,
                organic = outcome.merged.organic.len(),
                pages = outcome.merged.pages_fetched,
                failed = outcome.audit.error.is_some(),
                "query job finished"
            );
            outcomes.push(outcome);
            self.sleeper.sleep(delay).await;
        }

        outcomes
    }

    /// Acquire one job end to end. Never returns an error: a failed
    /// primary call yields an empty merged result with the failure
    /// recorded in the audit entry.
    pub async fn acquire(&self, job: &QueryJob, run_id: &str) -> JobOutcome {
        let query_term = self.localized_query(&job.executed_query);
        let params = self.primary_params(&query_term);
        let fingerprint = params_fingerprint(&params);

        let mut audit = AuditEntry {
            run_id: run_id.to_string(),
            keyword: job.source_keyword.clone(),
            label: job.label.clone(),
            ..Default::default()
        };

        let first_page = match self.client.execute(&params).await {
            Ok(page) => page,
            Err(err) => {
                tracing::error!(label = %job.label, error = %err, "primary call failed");
                audit.error = Some(err.to_string());
                return JobOutcome {
                    job: job.clone(),
                    merged: MergedSerp::default(),
                    audit,
                    metadata: self.metadata(run_id, None, fingerprint),
                    autocomplete: AutocompleteOutcome::default(),
                };
            }
        };

        let merger = PageMerger::new(self.config.max_pages, self.config.max_organic_results);
        let page_delay = Duration::from_millis(self.config.inter_page_delay_ms);
        let mut merged = merger
            .merge(first_page, |cursor| {
                let next_params = params.clone().with("start", cursor);
                async move {
                    self.sleeper.sleep(page_delay).await;
                    match self.client.execute(&next_params).await {
                        Ok(page) => Some(page),
                        Err(err) => {
                            tracing::warn!(error = %err, "primary page fetch failed; stopping");
                            None
                        }
                    }
                }
            })
            .await;
        audit.primary_pages_fetched = merged.pages_fetched;

        // The probe reuses the job's query without the location suffix.
        let ai = resolve_ai_overview(
            &self.client,
            merged.ai_overview.as_ref(),
            &job.executed_query,
            &self.config,
        )
        .await;
        audit.ai_overview_mode = ai.mode;
        audit.page_token_received_at = ai.token_received_at;
        audit.followup_started_at = ai.followup_started_at;
        audit.followup_latency_ms = ai.followup_latency_ms;
        audit.error = ai.error;
        merged.ai_overview = ai.overview;
        audit.has_ai_overview = merged.ai_overview.is_some();

        if let Some(local) = resolve_local_results(
            &self.client,
            &self.sleeper,
            &merged,
            &query_term,
            &self.config,
        )
        .await
        {
            audit.local_pages_fetched = local.pages_fetched;
            merged.local_places = local.places;
        }

        let related = expand_related_questions(
            &self.client,
            &merged.related_questions,
            self.config.related_questions_max_calls,
        )
        .await;
        audit.related_questions_calls = related.calls_made;
        if !related.pages.is_empty() {
            let mut acc = SerpAccumulator::new();
            acc.absorb_questions(&merged.related_questions);
            for page in &related.pages {
                acc.absorb_questions(&page.related_questions);
            }
            merged.related_questions = acc.finish().related_questions;
        }

        let autocomplete = resolve_autocomplete(
            &self.client,
            &self.sleeper,
            &job.source_keyword,
            &self.config,
        )
        .await;
        audit.autocomplete_variants_tried = autocomplete.variants_tried.len();

        let metadata = self.metadata(run_id, merged.google_url.clone(), fingerprint);
        JobOutcome {
            job: job.clone(),
            merged,
            audit,
            metadata,
            autocomplete,
        }
    }

    /// Append the configured location when forcing local intent, unless
    /// the query already mentions its city.
    fn localized_query(&self, query: &str) -> String {
        if !self.config.force_local_intent {
            return query.to_string();
        }
        let city = self.config.location_city();
        if city.is_empty() || query.to_lowercase().contains(&city.to_lowercase()) {
            return query.to_string();
        }
        format!("{query} {}", self.config.location)
    }

    fn primary_params(&self, query_term: &str) -> CallParams {
        CallParams::new("google")
            .with("q", query_term)
            .with("location", self.config.location.as_str())
            .with("hl", self.config.hl.as_str())
            .with("gl", self.config.gl.as_str())
            .with("num", self.config.num.to_string())
            .with("device", self.config.device.as_str())
            .with("no_cache", "true")
    }

    fn metadata(
        &self,
        run_id: &str,
        google_url: Option<String>,
        params_fingerprint: String,
    ) -> QueryMetadata {
        QueryMetadata {
            run_id: run_id.to_string(),
            created_at: Utc::now(),
            google_url,
            params_fingerprint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_query_appends_location_once() {
        let orchestrator = Orchestrator::new(
            DummyTransport,
            crate::retry::TokioSleeper,
            AcquireConfig::default(),
        )
        .expect("config valid");
        assert_eq!(
            orchestrator.localized_query("counselling"),
            "counselling Vancouver, British Columbia, Canada"
        );
        // A keyword already naming the city stays untouched.
        assert_eq!(
            orchestrator.localized_query("counselling vancouver"),
            "counselling vancouver"
        );
        assert_eq!(
            orchestrator.localized_query("help in Vancouver today"),
            "help in Vancouver today"
        );
    }

    #[test]
    fn forced_intent_off_leaves_query_untouched() {
        let orchestrator = Orchestrator::new(
            DummyTransport,
            crate::retry::TokioSleeper,
            AcquireConfig {
                force_local_intent: false,
                ..Default::default()
            },
        )
        .expect("config valid");
        assert_eq!(orchestrator.localized_query("counselling"), "counselling");
    }

    #[test]
    fn primary_params_carry_the_full_set() {
        let orchestrator = Orchestrator::new(
            DummyTransport,
            crate::retry::TokioSleeper,
            AcquireConfig::default(),
        )
        .expect("config valid");
        let params = orchestrator.primary_params("counselling in Vancouver");
        assert_eq!(params.engine(), "google");
        assert_eq!(params.get("q"), Some("counselling in Vancouver"));
        assert_eq!(params.get("num"), Some("100"));
        assert_eq!(params.get("device"), Some("desktop"));
        assert_eq!(params.get("no_cache"), Some("true"));
        assert_eq!(
            params.get("location"),
            Some("Vancouver, British Columbia, Canada")
        );
        assert!(params.get("api_key").is_none());
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let result = Orchestrator::new(
            DummyTransport,
            crate::retry::TokioSleeper,
            AcquireConfig {
                max_pages: 0,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(SerpError::Config(_))));
    }

    struct DummyTransport;

    impl SerpTransport for DummyTransport {
        async fn execute(
            &self,
            _params: &CallParams,
        ) -> Result<crate::types::SerpPage, SerpError> {
            Err(SerpError::Transport("dummy".into()))
        }
    }
}
