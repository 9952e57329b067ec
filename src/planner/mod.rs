//! Conditional follow-up planners.
//!
//! Three independent state machines, each fed by the merged primary
//! result: the AI-answer machine ([`ai_overview`]), the bounded
//! related-questions token chain ([`related`]), and the maps local
//! results planner ([`local`]). Their failures are absorbed and
//! recorded — never fatal to the query job.

pub mod ai_overview;
pub mod local;
pub mod related;

pub use ai_overview::{resolve_ai_overview, AiOverviewMode, AiOverviewOutcome};
pub use local::{extract_latlong, resolve_local_results, LocalOutcome};
pub use related::{expand_related_questions, RelatedChainOutcome};
