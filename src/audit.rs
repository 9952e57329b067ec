//! Per-job audit records.
//!
//! One [`AuditEntry`] per query job captures which follow-up branches
//! fired, the AI-answer mode and its follow-up timing, and call counts
//! per phase. [`QueryMetadata`] pins the job to a run and to the exact
//! parameter set that produced it via the parameter fingerprint.

use crate::planner::AiOverviewMode;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Audit record for one executed query job.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditEntry {
    pub run_id: String,
    /// Source keyword of the job.
    pub keyword: String,
    /// Job label (`A`, `B.1`, ...).
    pub label: String,
    /// Whether any AI answer content was present once resolution
    /// finished, from any branch.
    pub has_ai_overview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_overview_mode: Option<AiOverviewMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token_received_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_latency_ms: Option<u64>,
    /// Pages merged by the primary pagination chain.
    pub primary_pages_fetched: usize,
    /// Maps pages fetched by the local follow-up (0 when the gate did
    /// not fire or the call failed).
    pub local_pages_fetched: usize,
    /// Calls issued by the related-questions token chain.
    pub related_questions_calls: usize,
    /// Autocomplete variants dispatched.
    pub autocomplete_variants_tried: usize,
    /// Error text for the job: the primary call failing outright, or
    /// the AI token follow-up failing (the job itself still succeeds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Provenance attached to each job's acquired data.
#[derive(Debug, Clone, Serialize)]
pub struct QueryMetadata {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    /// The engine-reported result URL for the primary call, when the
    /// response carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_url: Option<String>,
    /// Fingerprint of the primary call's parameter set, computed before
    /// dispatch.
    pub params_fingerprint: String,
}
