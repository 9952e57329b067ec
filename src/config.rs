//! Acquisition configuration with sensible defaults.
//!
//! [`AcquireConfig`] is an explicit immutable value passed into the
//! orchestrator's constructor — never ambient global state. The API
//! credential is deliberately not part of it; the credential belongs to
//! the transport and stays out of logs and fingerprints.

use crate::error::SerpError;

/// Configuration for one acquisition run.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct AcquireConfig {
    /// Named location sent with the primary call and used for local
    /// intent (e.g. `"Vancouver, British Columbia, Canada"`).
    pub location: String,
    /// Interface language parameter (`hl`).
    pub hl: String,
    /// Geography parameter (`gl`).
    pub gl: String,
    /// Requested result count per primary page (`num`).
    pub num: u32,
    /// Device parameter for the primary call.
    pub device: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Append the configured location to keywords that do not already
    /// mention its city, and always issue the maps follow-up.
    pub force_local_intent: bool,
    /// When the primary result has no AI answer, issue one probe call
    /// with the location bias removed.
    pub ai_fallback_probe: bool,
    /// Expand `best <service> in <place>` keywords into AI-likely
    /// reformulations (labelled `<base>.1`, `<base>.2`).
    pub ai_query_alternatives: bool,
    /// Maximum pages followed per paginated call chain.
    pub max_pages: usize,
    /// Stop paginating once this many organic items have been merged.
    pub max_organic_results: usize,
    /// Call budget for the related-questions token chain.
    pub related_questions_max_calls: usize,
    /// Retry attempts per call, including the first (must be ≥ 1).
    pub retry_max_attempts: u32,
    /// Base backoff between retry attempts, in milliseconds. Doubled
    /// per attempt.
    pub base_backoff_ms: u64,
    /// Upper bound of the uniform jitter added to each backoff sleep.
    pub max_jitter_ms: u64,
    /// Delay between page fetches inside a pagination loop.
    pub inter_page_delay_ms: u64,
    /// Politeness delay after each query job.
    pub inter_job_delay_ms: u64,
    /// Zoom parameter sent with the maps call when falling back to a
    /// named location instead of coordinates.
    pub maps_zoom: String,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            location: "Vancouver, British Columbia, Canada".into(),
            hl: "en".into(),
            gl: "ca".into(),
            num: 100,
            device: "desktop".into(),
            timeout_seconds: 20,
            force_local_intent: true,
            ai_fallback_probe: true,
            ai_query_alternatives: false,
            max_pages: 3,
            max_organic_results: 100,
            related_questions_max_calls: 5,
            retry_max_attempts: 3,
            base_backoff_ms: 500,
            max_jitter_ms: 250,
            inter_page_delay_ms: 400,
            inter_job_delay_ms: 1200,
            maps_zoom: "14".into(),
        }
    }
}

impl AcquireConfig {
    /// Validates this configuration, returning an error if any field is
    /// invalid.
    ///
    /// Checks:
    /// - `retry_max_attempts` must be at least 1
    /// - `max_pages` must be greater than 0
    /// - `max_organic_results` must be greater than 0
    /// - `num` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `hl`, `gl` and `maps_zoom` must not be empty
    pub fn validate(&self) -> Result<(), SerpError> {
        if self.retry_max_attempts == 0 {
            return Err(SerpError::Config(
                "retry_max_attempts must be at least 1".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(SerpError::Config("max_pages must be greater than 0".into()));
        }
        if self.max_organic_results == 0 {
            return Err(SerpError::Config(
                "max_organic_results must be greater than 0".into(),
            ));
        }
        if self.num == 0 {
            return Err(SerpError::Config("num must be greater than 0".into()));
        }
        if self.timeout_seconds == 0 {
            return Err(SerpError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.hl.is_empty() || self.gl.is_empty() {
            return Err(SerpError::Config("hl and gl must not be empty".into()));
        }
        if self.maps_zoom.is_empty() {
            return Err(SerpError::Config("maps_zoom must not be empty".into()));
        }
        Ok(())
    }

    /// The city portion of the configured location (text before the
    /// first comma), used for local-intent and variant matching.
    pub fn location_city(&self) -> &str {
        self.location
            .split(',')
            .next()
            .unwrap_or(self.location.as_str())
            .trim()
    }
}
