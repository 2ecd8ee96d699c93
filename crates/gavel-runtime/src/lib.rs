//! # gavel-runtime
//!
//! LLM debate orchestration for Gavel.
//!
//! The runtime takes what `gavel-core` cannot do deterministically, arguing
//! about a business and judging the arguments, and runs it against a
//! generation backend:
//!
//! - [`providers`]: the [`LlmProvider`] seam plus the Gemini backend
//! - [`directory`]: the [`BusinessDirectory`] seam plus the Yelp backend
//! - [`summarizer`]: the 3/3 synthetic-summary fallback
//! - [`orchestrator`]: the Optimistic / Critical / Judge state machine
//! - [`pipeline`]: the one public operation, business id in, verdict out
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gavel_runtime::{BusinessId, GeminiProvider, Pipeline, RuntimeConfig, YelpDirectory};
//!
//! let pipeline = Pipeline::builder()
//!     .provider(Arc::new(GeminiProvider::from_env()?))
//!     .directory(Arc::new(YelpDirectory::from_env()?))
//!     .config(RuntimeConfig::default())
//!     .build()?;
//!
//! let evaluation = pipeline.evaluate(&BusinessId::new("harbor-noodle-house")).await?;
//! println!("{}", evaluation.verdict.render());
//! ```

pub mod config;
pub mod directory;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod summarizer;

// Re-export main types at crate root
pub use config::RuntimeConfig;
pub use directory::{BusinessDirectory, BusinessId, DirectoryError};
pub use orchestrator::{DebateError, DebateOrchestrator, DebateStage};
pub use pipeline::{Evaluation, Pipeline, PipelineBuilder, PipelineError};
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderFactory, ProviderRegistry, TokenUsage,
};
pub use resilience::{DebatePass, DebateUsage, UsageTracker};
pub use summarizer::{ExperienceSummarizer, SummarizerError};

#[cfg(feature = "gemini")]
pub use providers::{GeminiProvider, GeminiProviderFactory};

#[cfg(feature = "yelp")]
pub use directory::{YelpDirectory, YELP_API_KEY_ENV};
