//! Debate orchestrator: the fixed three-pass reasoning sequence.
//!
//! One run is a small state machine:
//!
//! ```text
//! Start → OptimisticDone → CriticalDone → JudgeDone(Verdict)
//!                       ↘ Failed (any stage)
//! ```
//!
//! The optimistic and critical passes have no data dependency on each other
//! and run concurrently; neither ever sees the other's output. The judge
//! pass strictly joins on both, weighs them under the fixed judge
//! directive, and its raw output must survive validation before anything is
//! returned. A failed run is retried whole by the caller; there is no
//! partial-verdict recovery.

use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use gavel_core::{validate, AgentOpinion, AgentRole, Context, ValidationError, Verdict};

use crate::config::RuntimeConfig;
use crate::prompts::{self, JUDGE_DIRECTIVE};
use crate::providers::{ChatMessage, LlmProvider, ProviderError};
use crate::resilience::{DebatePass, DebateUsage, UsageTracker};

/// Stages of one debate run. Used for tracing; the control flow itself is
/// the `run` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebateStage {
    Start,
    OptimisticDone,
    CriticalDone,
    JudgeDone,
    Failed,
}

/// Errors from the debate orchestrator.
#[derive(Error, Debug)]
pub enum DebateError {
    /// A generation call failed after exhausting its retries. Timeouts land
    /// here too.
    #[error("generation failed in {pass:?} pass: {message}")]
    Generation { pass: DebatePass, message: String },

    /// The judge's output never passed validation within the retry budget.
    #[error("judge output failed validation: {0}")]
    Validation(#[from] ValidationError),

    /// The run's token budget is spent.
    #[error("token budget exceeded for {0:?} pass")]
    BudgetExceeded(DebatePass),
}

/// Runs the Optimistic, Critical, and Judge passes over one context.
pub struct DebateOrchestrator {
    provider: Arc<dyn LlmProvider>,
    config: RuntimeConfig,

    /// The judge directive is injected at construction so tests can swap
    /// it; within a constructed orchestrator it is constant across runs.
    judge_directive: String,

    tracker: Arc<UsageTracker>,
}

impl DebateOrchestrator {
    /// Create an orchestrator with the standard judge directive.
    pub fn new(provider: Arc<dyn LlmProvider>, config: RuntimeConfig) -> Self {
        let tracker = Arc::new(UsageTracker::new(
            config.global_max_tokens,
            config.per_pass_max_tokens,
        ));
        Self {
            provider,
            config,
            judge_directive: JUDGE_DIRECTIVE.to_string(),
            tracker,
        }
    }

    /// Swap the judge directive (tests only, in practice).
    pub fn with_judge_directive(mut self, directive: impl Into<String>) -> Self {
        self.judge_directive = directive.into();
        self
    }

    /// Share a usage tracker with the rest of the run.
    pub fn with_tracker(mut self, tracker: Arc<UsageTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    /// Run the full debate over one context.
    ///
    /// The advocate passes execute concurrently; the judge blocks on both.
    pub async fn run(&self, context: &Context) -> Result<Verdict, DebateError> {
        tracing::debug!(stage = ?DebateStage::Start, "debate starting");

        let (optimistic, critical) = tokio::join!(
            self.argue(AgentRole::Optimistic, context),
            self.argue(AgentRole::Critical, context),
        );

        let optimistic = optimistic.inspect_err(|e| self.fail(e))?;
        tracing::debug!(stage = ?DebateStage::OptimisticDone, "optimistic opinion ready");

        let critical = critical.inspect_err(|e| self.fail(e))?;
        tracing::debug!(stage = ?DebateStage::CriticalDone, "critical opinion ready");

        let verdict = self
            .judge(context, &optimistic, &critical)
            .await
            .inspect_err(|e| self.fail(e))?;
        tracing::debug!(stage = ?DebateStage::JudgeDone, "verdict validated");

        Ok(verdict)
    }

    /// Accumulated usage for this orchestrator's tracker.
    pub fn usage(&self) -> DebateUsage {
        self.tracker.get_usage()
    }

    fn fail(&self, error: &DebateError) {
        tracing::warn!(stage = ?DebateStage::Failed, error = %error, "debate failed");
    }

    /// One advocate pass. Sees the context and its role instruction only.
    async fn argue(
        &self,
        role: AgentRole,
        context: &Context,
    ) -> Result<AgentOpinion, DebateError> {
        let messages = vec![
            ChatMessage::system(prompts::role_prompt(role)),
            ChatMessage::user(context.as_str()),
        ];
        let text = self.complete_with_retry(DebatePass::from(role), messages).await?;
        Ok(AgentOpinion::new(role, text))
    }

    /// The judge pass: both opinions plus the context, validated output,
    /// bounded re-ask on validation failure.
    async fn judge(
        &self,
        context: &Context,
        optimistic: &AgentOpinion,
        critical: &AgentOpinion,
    ) -> Result<Verdict, DebateError> {
        let brief = format!(
            "Evidence brief:\n{}\n\nArgument for visiting:\n{}\n\nArgument against visiting:\n{}",
            context.as_str(),
            optimistic.text,
            critical.text,
        );
        let messages = vec![
            ChatMessage::system(self.judge_directive.clone()),
            ChatMessage::user(brief),
        ];

        let mut attempt = 0;
        loop {
            let raw = self
                .complete_with_retry(DebatePass::Judge, messages.clone())
                .await?;

            match validate(&raw) {
                Ok(verdict) => return Ok(verdict),
                Err(err) if attempt < self.config.validation_retries => {
                    tracing::warn!(
                        attempt,
                        error = %err,
                        "judge output failed validation, re-asking"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(DebateError::Validation(err)),
            }
        }
    }

    /// One generation call: budget check, per-call timeout, bounded retry
    /// with backoff on transient failures, usage recording.
    async fn complete_with_retry(
        &self,
        pass: DebatePass,
        messages: Vec<ChatMessage>,
    ) -> Result<String, DebateError> {
        let estimated = messages
            .iter()
            .map(|m| self.provider.estimate_tokens(&m.content))
            .sum::<u32>()
            + self.config.max_tokens;
        if !self.tracker.can_afford(pass, estimated) {
            return Err(DebateError::BudgetExceeded(pass));
        }

        let completion_config = self.config.completion_config();
        let call = || async {
            match tokio::time::timeout(
                completion_config.timeout,
                self.provider.complete(messages.clone(), &completion_config),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(completion_config.timeout)),
            }
        };

        let response = call
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(250))
                    .with_max_times(self.config.generation_retries),
            )
            .when(ProviderError::is_transient)
            .notify(|err, delay| {
                tracing::warn!(
                    pass = ?pass,
                    error = %err,
                    retry_in = ?delay,
                    "generation call failed, retrying"
                );
            })
            .await
            .map_err(|e| DebateError::Generation {
                pass,
                message: e.to_string(),
            })?;

        self.tracker
            .record_usage(pass, &response.usage, &completion_config.model);

        Ok(response.content)
    }
}
