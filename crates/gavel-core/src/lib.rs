//! # gavel-core
//!
//! Deterministic pieces of the Gavel verdict pipeline.
//!
//! Gavel turns one business's evidence into a three-line qualitative verdict
//! (pros / cons / recommendation). This crate holds everything that does not
//! need a model or a network:
//!
//! - the shared data model ([`types`])
//! - evidence selection and bounded context rendering ([`context`])
//! - strict validation of the judge's output ([`validator`])
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same metadata and evidence always render the same
//!    context; the same raw text always validates the same way
//! 2. **No LLM calls**: generation lives in `gavel-runtime`
//! 3. **Bounded**: a rendered context never exceeds its character budget
//! 4. **All-or-nothing**: a [`Verdict`] is well-formed or the run fails;
//!    there is no partially-valid verdict
//!
//! ## Example
//!
//! ```rust,ignore
//! use gavel_core::{select_evidence, ContextBuilder, EvidenceDecision, EvidenceSource};
//!
//! match select_evidence(&reviews, 6) {
//!     EvidenceDecision::UseReviews => {
//!         let ctx = ContextBuilder::new(4000)
//!             .build(&metadata, &EvidenceSource::from_reviews(reviews));
//!         // hand ctx to the debate orchestrator
//!     }
//!     EvidenceDecision::NeedSynthetic => {
//!         // obtain a 3/3 synthetic summary or fail the run
//!     }
//! }
//! ```

pub mod context;
pub mod types;
pub mod validator;

// Re-export main types at crate root
pub use context::{
    select_evidence, ContextBuilder, EvidenceDecision, DEFAULT_CONTEXT_BUDGET,
    DEFAULT_MAX_CONTEXT_REVIEWS, DEFAULT_MIN_REVIEWS,
};
pub use types::{
    AgentOpinion, AgentRole, BusinessMetadata, Context, EvidenceKind, EvidenceSource,
    InsufficientEvidenceError, PriceLevel, Review, Verdict, SUMMARY_POINTS,
};
pub use validator::{
    validate, ValidationError, CONS_LABEL, MAX_LINE_CHARS, PROS_LABEL, RECOMMENDATION_LABEL,
};
