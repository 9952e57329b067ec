//! # serp-acquire
//!
//! Multi-engine SERP acquisition for keyword audit runs.
//!
//! This crate drives a search-results JSON API through a small set of
//! cooperating engines: the primary paginated search, a dedicated
//! AI-answer continuation engine, a maps engine for local intent, a
//! related-questions chain, and autocomplete. One run takes a list of
//! keywords and produces, per labelled query job, a merged deduplicated
//! result plus an audit entry describing exactly which follow-up
//! branches fired.
//!
//! ## Design
//!
//! - One job at a time, calls strictly sequential with politeness
//!   delays between pages and between jobs
//! - Every call goes through one retry client with exponential backoff
//!   and jitter; follow-up failures degrade, never abort a job
//! - Pages merge with first-seen-wins deduplication per entity kind
//! - The API credential lives in the transport only; parameter logs and
//!   fingerprints never contain it
//!
//! ## Security
//!
//! - The API key is appended at send time and logged as `REDACTED`
//! - Parameter fingerprints are computed over the credential-free set
//! - No network listeners — this is a library, not a server

pub mod audit;
pub mod autocomplete;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod jobs;
pub mod merge;
pub mod orchestrator;
pub mod params;
pub mod planner;
pub mod retry;
pub mod transport;
pub mod types;

pub use audit::{AuditEntry, QueryMetadata};
pub use config::AcquireConfig;
pub use error::{Result, SerpError};
pub use jobs::{expand_keywords, QueryJob};
pub use orchestrator::{JobOutcome, Orchestrator};
pub use planner::AiOverviewMode;
pub use retry::TokioSleeper;
pub use transport::HttpTransport;
pub use types::{MergedSerp, SerpPage};

/// Acquire every keyword in one run.
///
/// Expands keywords into labelled jobs, then runs them sequentially
/// against the production HTTP transport. Individual job failures are
/// recorded in their audit entries; the run itself fails only on an
/// invalid config or an unusable transport.
///
/// # Errors
///
/// Returns [`SerpError::Config`] if `config` fails validation and
/// [`SerpError::Transport`] if the HTTP client cannot be built.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> serp_acquire::Result<()> {
/// let config = serp_acquire::AcquireConfig::default();
/// let keywords = vec!["counselling vancouver".to_string()];
/// let outcomes = serp_acquire::run_audit(&keywords, "api-key", &config, "run-1").await?;
/// for outcome in &outcomes {
///     println!("{}: {} organic results", outcome.job.label, outcome.merged.organic.len());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_audit(
    keywords: &[String],
    api_key: &str,
    config: &AcquireConfig,
    run_id: &str,
) -> Result<Vec<JobOutcome>> {
    config.validate()?;
    let transport = HttpTransport::new(api_key, config)?;
    let orchestrator = Orchestrator::new(transport, TokioSleeper, config.clone())?;
    let jobs = expand_keywords(keywords, config);
    Ok(orchestrator.run(&jobs, run_id).await)
}
