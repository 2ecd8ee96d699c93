//! Shared data types for the Gavel pipeline.
//!
//! Everything here is plain data: fetchers produce it, the context builder
//! renders it, the validator emits it. None of these types ever talk to a
//! network or a model.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of positive and negative points a synthetic summary must carry.
pub const SUMMARY_POINTS: usize = 3;

/// Price tier of a business.
///
/// Upstream sources report this as either a numeric tier (1-4) or a run of
/// dollar signs; both map onto this enum, with anything else as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceLevel {
    Cheap,
    Moderate,
    Expensive,
    Luxury,
    #[default]
    Unknown,
}

impl PriceLevel {
    /// Map a numeric tier (1-4) to a price level.
    pub fn from_tier(tier: u8) -> Self {
        match tier {
            1 => Self::Cheap,
            2 => Self::Moderate,
            3 => Self::Expensive,
            4 => Self::Luxury,
            _ => Self::Unknown,
        }
    }

    /// Map a dollar-sign string (`$` through `$$$$`) to a price level.
    pub fn from_dollar_signs(s: &str) -> Self {
        match s.trim() {
            "$" => Self::Cheap,
            "$$" => Self::Moderate,
            "$$$" => Self::Expensive,
            "$$$$" => Self::Luxury,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for PriceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cheap => "inexpensive",
            Self::Moderate => "moderate",
            Self::Expensive => "expensive",
            Self::Luxury => "very expensive",
            Self::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Descriptive facts about one business.
///
/// Immutable once fetched; owned by the context builder for the duration of
/// a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessMetadata {
    pub name: String,

    /// Star rating in `[1.0, 5.0]`.
    pub rating: f32,

    pub price_level: PriceLevel,

    /// Category labels in upstream order.
    pub categories: Vec<String>,

    pub address: String,
}

/// One user review. A `Vec<Review>` in upstream relevance order forms the
/// review set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Star rating in `[1.0, 5.0]`.
    pub rating: f32,

    pub text: String,
}

impl Review {
    pub fn new(rating: f32, text: impl Into<String>) -> Self {
        Self {
            rating,
            text: text.into(),
        }
    }

    /// Whether the review carries any non-whitespace text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Which kind of evidence backed a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    RealReviews,
    Synthetic,
}

/// The evidence backing one pipeline run.
///
/// A closed two-case variant: either real reviews or a synthesized summary
/// standing in for them. Selection happens exactly once per run and is never
/// re-evaluated. The 3/3 arity of the synthetic case is enforced by
/// construction; there is no way to hold a summary with the wrong shape.
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceSource {
    Reviews(Vec<Review>),
    SyntheticSummary {
        positives: [String; SUMMARY_POINTS],
        negatives: [String; SUMMARY_POINTS],
    },
}

impl EvidenceSource {
    /// Wrap a review set as evidence.
    pub fn from_reviews(reviews: Vec<Review>) -> Self {
        Self::Reviews(reviews)
    }

    /// Build synthetic evidence from summarizer output.
    ///
    /// Anything other than exactly three positives and three negatives is a
    /// hard failure; the builder never pads or truncates a malformed
    /// summary.
    pub fn synthetic(
        positives: Vec<String>,
        negatives: Vec<String>,
    ) -> Result<Self, InsufficientEvidenceError> {
        let counts = (positives.len(), negatives.len());
        let positives: [String; SUMMARY_POINTS] = positives.try_into().map_err(|_| {
            InsufficientEvidenceError::MalformedSummary {
                positives: counts.0,
                negatives: counts.1,
            }
        })?;
        let negatives: [String; SUMMARY_POINTS] = negatives.try_into().map_err(|_| {
            InsufficientEvidenceError::MalformedSummary {
                positives: counts.0,
                negatives: counts.1,
            }
        })?;
        Ok(Self::SyntheticSummary {
            positives,
            negatives,
        })
    }

    pub fn kind(&self) -> EvidenceKind {
        match self {
            Self::Reviews(_) => EvidenceKind::RealReviews,
            Self::SyntheticSummary { .. } => EvidenceKind::Synthetic,
        }
    }
}

/// Raised when neither real reviews nor a valid synthetic summary can back a
/// run. Fatal: no partial context is ever handed downstream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InsufficientEvidenceError {
    #[error(
        "summarizer produced {positives} positive and {negatives} negative points, expected exactly 3 of each"
    )]
    MalformedSummary { positives: usize, negatives: usize },

    #[error("no synthetic summary available for a business with {review_count} usable reviews: {reason}")]
    SummaryUnavailable { review_count: usize, reason: String },
}

/// The bounded textual evidence bundle handed to all three reasoning passes.
///
/// Opaque by design: agents see this string and nothing else, never the
/// metadata or evidence source it was rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct Context(String);

impl Context {
    /// Wrap an already-rendered context string.
    ///
    /// The context builder is the normal producer; this constructor exists
    /// for tests and embedders that render their own evidence.
    pub fn raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters (the unit of the context budget).
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role of an advocate pass. The judge is not an advocate and has no role
/// here; it consumes both opinions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Optimistic,
    Critical,
}

impl AgentRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Optimistic => "optimistic",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One advocate's argument. Produced once per run, consumed only by the
/// judge pass, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOpinion {
    pub role: AgentRole,
    pub text: String,
}

impl AgentOpinion {
    pub fn new(role: AgentRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// The final three-line pros/cons/recommendation output.
///
/// Terminal artifact of the pipeline. Only the validator produces one, so a
/// `Verdict` in hand is always well-formed: each field a single non-empty
/// line within the length limit, never naming the evidence source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub pros: String,
    pub cons: String,
    pub recommendation: String,
}

impl Verdict {
    /// Render back to the canonical three-line form.
    pub fn render(&self) -> String {
        format!(
            "{} {}\n{} {}\n{} {}",
            crate::validator::PROS_LABEL,
            self.pros,
            crate::validator::CONS_LABEL,
            self.cons,
            crate::validator::RECOMMENDATION_LABEL,
            self.recommendation,
        )
    }
}
