//! Context building: evidence selection, rendering, and budget truncation.
//!
//! The builder turns business metadata plus one evidence source into the
//! single bounded string every reasoning pass sees. Overflow is handled by
//! truncating evidence, never by letting an agent silently see less
//! metadata.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{BusinessMetadata, Context, EvidenceSource, Review};

/// Minimum review count for the real-review path.
pub const DEFAULT_MIN_REVIEWS: usize = 6;

/// Default character budget for a rendered context.
pub const DEFAULT_CONTEXT_BUDGET: usize = 4000;

/// Default cap on reviews included in a rendered context.
pub const DEFAULT_MAX_CONTEXT_REVIEWS: usize = 8;

lazy_static! {
    // Topic patterns keep the evidence body focused on what the advocate
    // passes actually argue about. A review matching any of these counts as
    // representative.
    static ref TOPIC_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("food quality", Regex::new(r"(?i)\b(food|dish|meal|flavor|flavour|taste|tasty|delicious|bland|fresh|stale|menu|portion)\b").unwrap()),
        ("service", Regex::new(r"(?i)\b(service|staff|waiter|waitress|server|host|hostess|friendly|rude|attentive|slow|manager)\b").unwrap()),
        ("cleanliness", Regex::new(r"(?i)\b(clean|dirty|spotless|filthy|hygiene|grimy|restroom|bathroom|sticky)\b").unwrap()),
        ("atmosphere", Regex::new(r"(?i)\b(atmosphere|ambiance|ambience|vibe|decor|cozy|cramped|noisy|loud|quiet|music|crowded)\b").unwrap()),
    ];
}

/// Outcome of the evidence-selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceDecision {
    /// Enough substantive reviews: use them directly.
    UseReviews,

    /// Too few or all-empty reviews: the caller must obtain a synthetic
    /// summary (or fail the run).
    NeedSynthetic,
}

/// Decide which evidence source backs the run.
///
/// A pure function of the review set: at least `min_reviews` reviews AND at
/// least one with non-empty text selects the real-review path. Decided once
/// per run; never re-evaluated.
pub fn select_evidence(reviews: &[Review], min_reviews: usize) -> EvidenceDecision {
    if reviews.len() >= min_reviews && reviews.iter().any(Review::has_text) {
        EvidenceDecision::UseReviews
    } else {
        EvidenceDecision::NeedSynthetic
    }
}

/// Renders metadata plus evidence into a bounded [`Context`].
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    budget_chars: usize,
    max_reviews: usize,
}

impl ContextBuilder {
    pub fn new(budget_chars: usize) -> Self {
        Self {
            budget_chars,
            max_reviews: DEFAULT_MAX_CONTEXT_REVIEWS,
        }
    }

    /// Cap the number of reviews rendered into the evidence body.
    pub fn with_max_reviews(mut self, max_reviews: usize) -> Self {
        self.max_reviews = max_reviews;
        self
    }

    /// Render one context. The result never exceeds the character budget.
    ///
    /// Metadata renders first in fixed field order, then the evidence body.
    /// When the body overflows the budget, whole trailing units are dropped
    /// first; a unit that would fit partially is cut at a sentence boundary.
    pub fn build(&self, metadata: &BusinessMetadata, evidence: &EvidenceSource) -> Context {
        let header = render_header(metadata);
        let header_chars = header.chars().count();

        // Evidence gives way to metadata, but the budget always wins: a
        // pathological header is itself sentence-cut to fit.
        if header_chars >= self.budget_chars {
            tracing::warn!(
                header_chars,
                budget = self.budget_chars,
                "metadata header exceeds context budget, truncating header"
            );
            return Context::raw(truncate_to_sentence(&header, self.budget_chars));
        }

        let units = match evidence {
            EvidenceSource::Reviews(reviews) => {
                let subset = topical_subset(reviews, self.max_reviews);
                tracing::debug!(
                    total = reviews.len(),
                    rendered = subset.len(),
                    "selected review subset for context"
                );
                subset
                    .iter()
                    .map(|r| format!("- ({:.1}/5) {}", r.rating, r.text.trim()))
                    .collect::<Vec<_>>()
            }
            EvidenceSource::SyntheticSummary {
                positives,
                negatives,
            } => {
                let mut units = Vec::with_capacity(1 + SUMMARY_SECTION_LEN * 2);
                units.push("Typical experience, summarized:".to_string());
                for p in positives {
                    units.push(format!("+ {p}"));
                }
                for n in negatives {
                    units.push(format!("- {n}"));
                }
                units
            }
        };

        let mut out = header;
        let mut used = header_chars;
        let mut appended = 0usize;
        for unit in &units {
            let unit_chars = unit.chars().count() + 1; // trailing newline
            if used + unit_chars <= self.budget_chars {
                out.push_str(unit);
                out.push('\n');
                used += unit_chars;
                appended += 1;
            } else {
                // Whole-unit boundaries are preserved whenever at least one
                // unit fit. Only when not even the first one fits do we keep
                // a sentence-aligned prefix of it.
                let remaining = self.budget_chars - used;
                if appended == 0 && remaining > 1 {
                    let cut = truncate_to_sentence(unit, remaining - 1);
                    if !cut.is_empty() {
                        used += cut.chars().count() + 1;
                        out.push_str(&cut);
                        out.push('\n');
                    }
                }
                tracing::debug!(
                    budget = self.budget_chars,
                    used,
                    "context budget reached, dropping remaining evidence"
                );
                break;
            }
        }

        debug_assert!(used <= self.budget_chars);
        Context::raw(out)
    }
}

const SUMMARY_SECTION_LEN: usize = crate::types::SUMMARY_POINTS;

/// Metadata header in fixed field order: name, rating, price, categories,
/// address.
fn render_header(metadata: &BusinessMetadata) -> String {
    let categories = if metadata.categories.is_empty() {
        "unlisted".to_string()
    } else {
        metadata.categories.join(", ")
    };
    format!(
        "Business: {}\nRating: {:.1} of 5\nPrice: {}\nCategories: {}\nAddress: {}\n\n",
        metadata.name.trim(),
        metadata.rating,
        metadata.price_level,
        categories,
        metadata.address.trim(),
    )
}

/// Pick the most representative reviews, preserving input order.
///
/// Reviews mentioning the argued topics win; when none match, fall back to
/// the first `max` substantive reviews as returned upstream.
fn topical_subset(reviews: &[Review], max: usize) -> Vec<&Review> {
    let matched: Vec<&Review> = reviews
        .iter()
        .filter(|r| r.has_text() && mentions_topic(&r.text))
        .take(max)
        .collect();

    if !matched.is_empty() {
        return matched;
    }

    reviews.iter().filter(|r| r.has_text()).take(max).collect()
}

fn mentions_topic(text: &str) -> bool {
    TOPIC_PATTERNS.iter().any(|(_, re)| re.is_match(text))
}

/// Cut `text` to at most `max_chars` characters, preferring the last
/// sentence boundary inside the window.
pub(crate) fn truncate_to_sentence(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let window: String = text.chars().take(max_chars).collect();
    match window.rfind(['.', '!', '?']) {
        Some(idx) => window[..=idx].to_string(),
        None => window,
    }
}
