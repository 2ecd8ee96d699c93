//! The pipeline entry point: one business id in, one verdict out.
//!
//! `Pipeline::evaluate` wires the collaborators together in a fixed order:
//! fetch metadata, fetch reviews, pick the evidence source, render the
//! bounded context, run the debate, return the validated verdict. Every
//! piece of state is run-scoped and discarded at completion; nothing is
//! shared across invocations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use gavel_core::{
    select_evidence, ContextBuilder, EvidenceDecision, EvidenceKind, EvidenceSource,
    InsufficientEvidenceError, ValidationError, Verdict,
};

use crate::config::RuntimeConfig;
use crate::directory::{BusinessDirectory, BusinessId, DirectoryError};
use crate::orchestrator::{DebateError, DebateOrchestrator};
use crate::providers::LlmProvider;
use crate::resilience::{DebateUsage, UsageTracker};
use crate::summarizer::{ExperienceSummarizer, SummarizerError};

/// Errors surfaced to the pipeline caller.
///
/// Fatal variants propagate unchanged; the pipeline never fabricates a
/// default verdict to mask a failure.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Unknown business. Fatal, never retried.
    #[error("business not found: {0}")]
    NotFound(String),

    /// Neither real reviews nor a valid synthetic summary. Fatal.
    #[error(transparent)]
    InsufficientEvidence(#[from] InsufficientEvidenceError),

    /// A directory fetch failed for a reason other than a missing business.
    #[error("directory request failed: {0}")]
    Directory(String),

    /// A generation call failed after its retry budget. Timeouts land here.
    #[error("generation failed: {0}")]
    Generation(String),

    /// The judge's output never validated within its retry budget.
    #[error("verdict failed validation: {0}")]
    Validation(#[source] ValidationError),

    /// The pipeline was built without a required collaborator.
    #[error("pipeline not configured: {0}")]
    NotConfigured(String),
}

impl From<DebateError> for PipelineError {
    fn from(err: DebateError) -> Self {
        match err {
            DebateError::Validation(e) => Self::Validation(e),
            other => Self::Generation(other.to_string()),
        }
    }
}

fn directory_error(err: DirectoryError) -> PipelineError {
    match err {
        DirectoryError::NotFound(id) => PipelineError::NotFound(id.to_string()),
        other => PipelineError::Directory(other.to_string()),
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// The validated three-line verdict.
    pub verdict: Verdict,

    /// Which kind of evidence backed it.
    pub evidence: EvidenceKind,

    /// Generation usage across all passes, summarizer included.
    pub usage: DebateUsage,

    pub decided_at: DateTime<Utc>,
}

/// One business per invocation; no shared mutable state across runs.
pub struct Pipeline {
    directory: Arc<dyn BusinessDirectory>,
    orchestrator: DebateOrchestrator,
    summarizer: ExperienceSummarizer,
    config: RuntimeConfig,
    tracker: Arc<UsageTracker>,
}

impl Pipeline {
    /// Start building a pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Evaluate one business into a verdict.
    pub async fn evaluate(&self, id: &BusinessId) -> Result<Evaluation, PipelineError> {
        tracing::info!(business = %id, "starting verdict pipeline");
        self.tracker.reset();

        let metadata = self
            .directory
            .fetch_metadata(id)
            .await
            .map_err(directory_error)?;

        let reviews = self
            .directory
            .fetch_reviews(id, self.config.review_fetch_limit)
            .await
            .map_err(directory_error)?;
        let review_count = reviews.len();

        let evidence = match select_evidence(&reviews, self.config.min_reviews) {
            EvidenceDecision::UseReviews => {
                tracing::debug!(review_count, "using real reviews as evidence");
                EvidenceSource::from_reviews(reviews)
            }
            EvidenceDecision::NeedSynthetic => {
                tracing::debug!(review_count, "falling back to synthetic summary");
                self.summarizer
                    .summarize(&metadata)
                    .await
                    .map_err(|err| match err {
                        SummarizerError::Malformed(inner) => {
                            PipelineError::InsufficientEvidence(inner)
                        }
                        other => PipelineError::InsufficientEvidence(
                            InsufficientEvidenceError::SummaryUnavailable {
                                review_count,
                                reason: other.to_string(),
                            },
                        ),
                    })?
            }
        };
        let evidence_kind = evidence.kind();

        let context = ContextBuilder::new(self.config.context_budget_chars)
            .with_max_reviews(self.config.max_context_reviews)
            .build(&metadata, &evidence);

        let verdict = self.orchestrator.run(&context).await?;

        tracing::info!(
            business = %id,
            evidence = ?evidence_kind,
            calls = self.tracker.get_usage().llm_calls,
            "verdict ready"
        );

        Ok(Evaluation {
            verdict,
            evidence: evidence_kind,
            usage: self.tracker.get_usage(),
            decided_at: Utc::now(),
        })
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    directory: Option<Arc<dyn BusinessDirectory>>,
    config: RuntimeConfig,
    judge_directive: Option<String>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            directory: None,
            config: RuntimeConfig::default(),
            judge_directive: None,
        }
    }

    /// Set the generation provider (required).
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the business directory (required).
    pub fn directory(mut self, directory: Arc<dyn BusinessDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the judge directive (tests only, in practice).
    pub fn judge_directive(mut self, directive: impl Into<String>) -> Self {
        self.judge_directive = Some(directive.into());
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let provider = self
            .provider
            .ok_or_else(|| PipelineError::NotConfigured("no provider set".to_string()))?;
        let directory = self
            .directory
            .ok_or_else(|| PipelineError::NotConfigured("no directory set".to_string()))?;

        let tracker = Arc::new(UsageTracker::new(
            self.config.global_max_tokens,
            self.config.per_pass_max_tokens,
        ));

        let mut orchestrator =
            DebateOrchestrator::new(Arc::clone(&provider), self.config.clone())
                .with_tracker(Arc::clone(&tracker));
        if let Some(directive) = self.judge_directive {
            orchestrator = orchestrator.with_judge_directive(directive);
        }

        let summarizer = ExperienceSummarizer::new(Arc::clone(&provider), self.config.clone())
            .with_tracker(Arc::clone(&tracker));

        Ok(Pipeline {
            directory,
            orchestrator,
            summarizer,
            config: self.config,
            tracker,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{
        ChatMessage, CompletionConfig, CompletionResponse, ProviderError, TokenUsage,
    };
    use async_trait::async_trait;
    use gavel_core::{BusinessMetadata, PriceLevel, Review};
    use parking_lot::Mutex;

    const VALID_VERDICT: &str = "Pros: Solid cooking and friendly staff.\n\
                                 Cons: Crowded at peak hours.\n\
                                 Our verdict: Worth a visit for a casual dinner.";

    const MISSING_CONS: &str = "Pros: Solid cooking.\nOur verdict: Go.";

    /// In-memory directory double.
    struct StaticDirectory {
        metadata: Option<BusinessMetadata>,
        reviews: Vec<Review>,
    }

    impl StaticDirectory {
        fn with_reviews(reviews: Vec<Review>) -> Self {
            Self {
                metadata: Some(BusinessMetadata {
                    name: "Harbor Noodle House".to_string(),
                    rating: 4.3,
                    price_level: PriceLevel::Moderate,
                    categories: vec!["Noodles".to_string()],
                    address: "12 Pier Ave, Oakland, CA".to_string(),
                }),
                reviews,
            }
        }

        fn missing() -> Self {
            Self {
                metadata: None,
                reviews: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl BusinessDirectory for StaticDirectory {
        async fn fetch_metadata(
            &self,
            id: &BusinessId,
        ) -> Result<BusinessMetadata, DirectoryError> {
            self.metadata
                .clone()
                .ok_or_else(|| DirectoryError::NotFound(id.clone()))
        }

        async fn fetch_reviews(
            &self,
            _id: &BusinessId,
            limit: u32,
        ) -> Result<Vec<Review>, DirectoryError> {
            Ok(self.reviews.iter().take(limit as usize).cloned().collect())
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    #[derive(Debug, Clone)]
    struct RecordedCall {
        system: String,
        user: String,
    }

    /// Provider double that answers each pass by its system prompt.
    struct ScriptedProvider {
        calls: Mutex<Vec<RecordedCall>>,
        judge_replies: Mutex<Vec<String>>,
        summary_reply: String,
    }

    impl ScriptedProvider {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                judge_replies: Mutex::new(vec![VALID_VERDICT.to_string()]),
                summary_reply: r#"{"positives": ["Quick seating", "Fair prices", "Fresh dishes"],
                                   "negatives": ["Noisy room", "Short menu", "Long waits"]}"#
                    .to_string(),
            }
        }

        fn with_judge_replies(self, replies: Vec<&str>) -> Self {
            *self.judge_replies.lock() = replies.into_iter().map(String::from).collect();
            self
        }

        fn with_summary(mut self, reply: &str) -> Self {
            self.summary_reply = reply.to_string();
            self
        }

        fn recorded(&self) -> Vec<RecordedCall> {
            self.calls.lock().clone()
        }

        fn judge_calls(&self) -> usize {
            self.recorded()
                .iter()
                .filter(|c| c.system.contains("judge"))
                .count()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            let system = messages
                .iter()
                .find(|m| m.role == "system")
                .map(|m| m.content.clone())
                .unwrap_or_default();
            let user = messages
                .iter()
                .find(|m| m.role == "user")
                .map(|m| m.content.clone())
                .unwrap_or_default();

            let content = if system.contains("summarize") {
                self.summary_reply.clone()
            } else if system.contains("judge") {
                let mut replies = self.judge_replies.lock();
                if replies.len() > 1 {
                    replies.remove(0)
                } else {
                    replies[0].clone()
                }
            } else if system.contains("FOR visiting") {
                "The evidence favors the kitchen and the staff.".to_string()
            } else {
                "The evidence points to crowding and noise.".to_string()
            };

            self.calls.lock().push(RecordedCall { system, user });

            Ok(CompletionResponse {
                content,
                usage: TokenUsage {
                    prompt_tokens: 80,
                    completion_tokens: 40,
                },
                model: "test-model".to_string(),
                finish_reason: Some("STOP".to_string()),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn substantive_reviews(n: usize) -> Vec<Review> {
        (0..n)
            .map(|i| Review::new(4.0, format!("Great food and quick service, visit {i}.")))
            .collect()
    }

    fn pipeline(provider: Arc<ScriptedProvider>, directory: StaticDirectory) -> Pipeline {
        let config = RuntimeConfig {
            review_fetch_limit: 10,
            ..Default::default()
        };
        Pipeline::builder()
            .provider(provider)
            .directory(Arc::new(directory))
            .config(config)
            .build()
            .unwrap()
    }

    // Scenario A: plenty of substantive reviews: the verdict comes from the
    // real-review path and the context carries metadata plus review text.
    #[tokio::test]
    async fn test_review_backed_evaluation() {
        let provider = Arc::new(ScriptedProvider::new());
        let pipeline = pipeline(provider.clone(), StaticDirectory::with_reviews(substantive_reviews(10)));

        let evaluation = pipeline
            .evaluate(&BusinessId::new("harbor-noodle-house"))
            .await
            .unwrap();

        assert_eq!(evaluation.evidence, EvidenceKind::RealReviews);
        assert_eq!(evaluation.verdict.pros, "Solid cooking and friendly staff.");

        // No summarizer call, and the advocate context carried the metadata
        // header plus real review text.
        let calls = provider.recorded();
        assert!(calls.iter().all(|c| !c.system.contains("summarize")));
        let advocate = calls
            .iter()
            .find(|c| c.system.contains("FOR visiting"))
            .unwrap();
        assert!(advocate.user.contains("Harbor Noodle House"));
        assert!(advocate.user.contains("Great food and quick service"));
    }

    // Scenario B: no reviews, summarizer returns 3/3: the verdict comes
    // from the synthetic path.
    #[tokio::test]
    async fn test_synthetic_backed_evaluation() {
        let provider = Arc::new(ScriptedProvider::new());
        let pipeline = pipeline(provider.clone(), StaticDirectory::with_reviews(Vec::new()));

        let evaluation = pipeline
            .evaluate(&BusinessId::new("harbor-noodle-house"))
            .await
            .unwrap();

        assert_eq!(evaluation.evidence, EvidenceKind::Synthetic);

        let advocate = provider
            .recorded()
            .into_iter()
            .find(|c| c.system.contains("FOR visiting"))
            .unwrap();
        assert!(advocate.user.contains("Quick seating"));
    }

    // Scenario C: summarizer returns 2 positives / 3 negatives: the run
    // fails with insufficient evidence and no verdict is produced.
    #[tokio::test]
    async fn test_malformed_summary_fails_the_run() {
        let provider = Arc::new(ScriptedProvider::new().with_summary(
            r#"{"positives": ["Quick seating", "Fair prices"],
                "negatives": ["Noisy room", "Short menu", "Long waits"]}"#,
        ));
        let pipeline = pipeline(provider.clone(), StaticDirectory::with_reviews(Vec::new()));

        let err = pipeline
            .evaluate(&BusinessId::new("harbor-noodle-house"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::InsufficientEvidence(
                InsufficientEvidenceError::MalformedSummary {
                    positives: 2,
                    negatives: 3
                }
            )
        ));
        // The debate never starts.
        assert_eq!(provider.judge_calls(), 0);
    }

    // Scenario D: judge output missing its Cons line twice: one retry, then
    // the validation error surfaces.
    #[tokio::test]
    async fn test_validation_failure_after_retry_surfaces() {
        let provider = Arc::new(
            ScriptedProvider::new().with_judge_replies(vec![MISSING_CONS, MISSING_CONS]),
        );
        let pipeline = pipeline(provider.clone(), StaticDirectory::with_reviews(substantive_reviews(10)));

        let err = pipeline
            .evaluate(&BusinessId::new("harbor-noodle-house"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(provider.judge_calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_business_is_fatal() {
        let provider = Arc::new(ScriptedProvider::new());
        let pipeline = pipeline(provider.clone(), StaticDirectory::missing());

        let err = pipeline
            .evaluate(&BusinessId::new("no-such-biz"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NotFound(id) if id == "no-such-biz"));
        // Nothing was generated for an unknown business.
        assert!(provider.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_five_reviews_fall_back_to_synthetic() {
        let provider = Arc::new(ScriptedProvider::new());
        let pipeline = pipeline(provider.clone(), StaticDirectory::with_reviews(substantive_reviews(5)));

        let evaluation = pipeline
            .evaluate(&BusinessId::new("harbor-noodle-house"))
            .await
            .unwrap();

        assert_eq!(evaluation.evidence, EvidenceKind::Synthetic);
    }

    #[tokio::test]
    async fn test_builder_requires_collaborators() {
        let result = Pipeline::builder().build();
        assert!(matches!(result, Err(PipelineError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_usage_reported_alongside_verdict() {
        let provider = Arc::new(ScriptedProvider::new());
        let pipeline = pipeline(provider, StaticDirectory::with_reviews(substantive_reviews(10)));

        let evaluation = pipeline
            .evaluate(&BusinessId::new("harbor-noodle-house"))
            .await
            .unwrap();

        // Three debate passes, no summarizer.
        assert_eq!(evaluation.usage.llm_calls, 3);
        assert!(evaluation.usage.estimated_cost > 0.0);
    }
}
