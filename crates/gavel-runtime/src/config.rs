//! Runtime configuration for the debate pipeline.
//!
//! One struct carries every knob: evidence thresholds, context budget,
//! retry counts, timeouts, and the generation parameters shared by all
//! passes. Loadable from JSON; every field has a sensible default.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use gavel_core::{DEFAULT_CONTEXT_BUDGET, DEFAULT_MAX_CONTEXT_REVIEWS, DEFAULT_MIN_REVIEWS};

use crate::providers::CompletionConfig;

/// Configuration for the runtime pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Model used for every generation call.
    pub model: String,

    /// Maximum tokens per generation call.
    pub max_tokens: u32,

    /// Sampling temperature for all passes.
    pub temperature: f32,

    /// Per-call timeout for external calls (seconds on the wire).
    #[serde(with = "duration_secs")]
    pub call_timeout: Duration,

    /// Minimum review count for the real-review path.
    pub min_reviews: usize,

    /// How many reviews to request from the directory.
    pub review_fetch_limit: u32,

    /// Character budget for a rendered context.
    pub context_budget_chars: usize,

    /// Cap on reviews rendered into the context body.
    pub max_context_reviews: usize,

    /// Retries after a failed generation call, per pass.
    pub generation_retries: usize,

    /// Retries for the synthetic summarizer's generation call. Separate
    /// from `generation_retries`: the summarizer shares the provider with
    /// the debate passes but not their retry budget.
    pub summary_retries: usize,

    /// Judge re-asks after a validation failure.
    pub validation_retries: usize,

    /// Global token ceiling for one run across all passes.
    pub global_max_tokens: u32,

    /// Token ceiling per pass.
    pub per_pass_max_tokens: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            max_tokens: 512,
            temperature: 0.4,
            call_timeout: Duration::from_secs(30),
            min_reviews: DEFAULT_MIN_REVIEWS,
            review_fetch_limit: 6,
            context_budget_chars: DEFAULT_CONTEXT_BUDGET,
            max_context_reviews: DEFAULT_MAX_CONTEXT_REVIEWS,
            generation_retries: 2,
            summary_retries: 1,
            validation_retries: 1,
            global_max_tokens: 20_000,
            per_pass_max_tokens: 6_000,
        }
    }
}

impl RuntimeConfig {
    /// The completion parameters shared by every pass.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.call_timeout,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
