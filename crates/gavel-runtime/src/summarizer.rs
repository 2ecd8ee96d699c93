//! Synthetic experience summarizer.
//!
//! When a business has too few substantive reviews, the pipeline falls back
//! to an AI-synthesized summary of the typical experience: exactly three
//! positives and three negatives, derived from the metadata alone. The 3/3
//! shape is non-negotiable: anything else fails the run rather than being
//! padded or trimmed into shape.

use backon::{ExponentialBuilder, Retryable};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use gavel_core::{BusinessMetadata, EvidenceSource, InsufficientEvidenceError};

use crate::config::RuntimeConfig;
use crate::prompts::SUMMARIZER_PROMPT;
use crate::providers::{ChatMessage, LlmProvider, ProviderError};
use crate::resilience::{DebatePass, UsageTracker};

/// Errors from the summarizer.
#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("summary generation failed: {0}")]
    Generation(#[from] ProviderError),

    #[error("summary was not valid JSON: {0}")]
    UnparseableOutput(String),

    #[error(transparent)]
    Malformed(InsufficientEvidenceError),
}

/// Expected summarizer payload.
#[derive(Debug, Deserialize)]
struct SummaryPayload {
    positives: Vec<String>,
    negatives: Vec<String>,
}

/// Produces a 3/3 synthetic summary through the shared provider.
pub struct ExperienceSummarizer {
    provider: Arc<dyn LlmProvider>,
    config: RuntimeConfig,
    tracker: Arc<UsageTracker>,
}

impl ExperienceSummarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: RuntimeConfig) -> Self {
        Self {
            provider,
            config,
            tracker: Arc::new(UsageTracker::default()),
        }
    }

    /// Share a usage tracker with the rest of the run.
    pub fn with_tracker(mut self, tracker: Arc<UsageTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    /// Summarize the typical experience at a business.
    ///
    /// Transport failures are retried with backoff under the summarizer's
    /// own retry budget; a response with the wrong number of points is a
    /// hard failure with no retry.
    pub async fn summarize(
        &self,
        metadata: &BusinessMetadata,
    ) -> Result<EvidenceSource, SummarizerError> {
        let messages = vec![
            ChatMessage::system(SUMMARIZER_PROMPT),
            ChatMessage::user(render_metadata(metadata)),
        ];

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
                    .with_max_times(self.config.summary_retries),
            )
            .when(ProviderError::is_transient)
            .notify(|err, delay| {
                tracing::warn!(error = %err, retry_in = ?delay, "summary call failed, retrying");
            })
            .await?;

        self.tracker
            .record_usage(DebatePass::Summarizer, &response.usage, &completion_config.model);

        let payload: SummaryPayload = serde_json::from_str(strip_fences(&response.content))
            .map_err(|e| SummarizerError::UnparseableOutput(e.to_string()))?;

        tracing::debug!(
            positives = payload.positives.len(),
            negatives = payload.negatives.len(),
            "parsed synthetic summary"
        );

        EvidenceSource::synthetic(payload.positives, payload.negatives)
            .map_err(SummarizerError::Malformed)
    }
}

/// The summarizer sees descriptive facts only, never review text.
fn render_metadata(metadata: &BusinessMetadata) -> String {
    format!(
        "Name: {}\nRating: {:.1} of 5\nPrice: {}\nCategories: {}\nLocation: {}",
        metadata.name,
        metadata.rating,
        metadata.price_level,
        metadata.categories.join(", "),
        metadata.address,
    )
}

/// Models sometimes wrap JSON in code fences despite instructions.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CompletionConfig, CompletionResponse, TokenUsage};
    use async_trait::async_trait;
    use gavel_core::PriceLevel;
    use parking_lot::Mutex;

    struct CannedProvider {
        replies: Mutex<Vec<Result<String, ProviderError>>>,
        calls: Mutex<u32>,
    }

    impl CannedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            *self.calls.lock() += 1;
            let mut replies = self.replies.lock();
            let reply = if replies.is_empty() {
                Err(ProviderError::EmptyCompletion)
            } else {
                replies.remove(0)
            };
            reply.map(|content| CompletionResponse {
                content,
                usage: TokenUsage {
                    prompt_tokens: 50,
                    completion_tokens: 30,
                },
                model: "test-model".to_string(),
                finish_reason: Some("STOP".to_string()),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn metadata() -> BusinessMetadata {
        BusinessMetadata {
            name: "Quiet Corner Cafe".to_string(),
            rating: 3.9,
            price_level: PriceLevel::Cheap,
            categories: vec!["Cafe".to_string()],
            address: "5 Elm St".to_string(),
        }
    }

    fn summary_json(positives: usize, negatives: usize) -> String {
        let points = |n: usize, prefix: &str| {
            (0..n)
                .map(|i| format!("\"{prefix} point {i}\""))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            r#"{{"positives": [{}], "negatives": [{}]}}"#,
            points(positives, "good"),
            points(negatives, "bad")
        )
    }

    #[tokio::test]
    async fn test_well_formed_summary_accepted() {
        let provider = Arc::new(CannedProvider::new(vec![Ok(summary_json(3, 3))]));
        let summarizer = ExperienceSummarizer::new(provider, RuntimeConfig::default());

        let evidence = summarizer.summarize(&metadata()).await.unwrap();
        assert!(matches!(evidence, EvidenceSource::SyntheticSummary { .. }));
    }

    #[tokio::test]
    async fn test_wrong_count_is_hard_failure() {
        let provider = Arc::new(CannedProvider::new(vec![Ok(summary_json(2, 3))]));
        let calls = Arc::clone(&provider);
        let summarizer = ExperienceSummarizer::new(provider, RuntimeConfig::default());

        let err = summarizer.summarize(&metadata()).await.unwrap_err();
        assert!(matches!(
            err,
            SummarizerError::Malformed(InsufficientEvidenceError::MalformedSummary {
                positives: 2,
                negatives: 3
            })
        ));
        // Malformed output is never retried.
        assert_eq!(*calls.calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_fenced_json_tolerated() {
        let fenced = format!("```json\n{}\n```", summary_json(3, 3));
        let provider = Arc::new(CannedProvider::new(vec![Ok(fenced)]));
        let summarizer = ExperienceSummarizer::new(provider, RuntimeConfig::default());

        assert!(summarizer.summarize(&metadata()).await.is_ok());
    }

    #[tokio::test]
    async fn test_non_json_output_is_error() {
        let provider = Arc::new(CannedProvider::new(vec![Ok(
            "The cafe is probably fine.".to_string()
        )]));
        let summarizer = ExperienceSummarizer::new(provider, RuntimeConfig::default());

        let err = summarizer.summarize(&metadata()).await.unwrap_err();
        assert!(matches!(err, SummarizerError::UnparseableOutput(_)));
    }

    #[tokio::test]
    async fn test_transient_failure_retried() {
        let provider = Arc::new(CannedProvider::new(vec![
            Err(ProviderError::HttpError("connection reset".to_string())),
            Ok(summary_json(3, 3)),
        ]));
        let calls = Arc::clone(&provider);
        let summarizer = ExperienceSummarizer::new(provider, RuntimeConfig::default());

        assert!(summarizer.summarize(&metadata()).await.is_ok());
        assert_eq!(*calls.calls.lock(), 2);
    }
}
