//! Role instructions for the debate passes.
//!
//! Three fixed instructions drive the pipeline:
//! 1. Advocate prompts (optimistic / critical): argue one side, only from
//!    the given context
//! 2. The judge directive: weigh both arguments and emit the three-line
//!    verdict shape
//! 3. The summarizer prompt: produce the 3/3 synthetic summary when real
//!    evidence is thin
//!
//! All of them are constants injected at construction, never scattered
//! literals. The judge directive in particular is the same on every run; it
//! encodes the output-shape rules the validator enforces, so a compliant
//! model passes validation on the first attempt.

use gavel_core::AgentRole;

/// Instruction for the optimistic advocate pass.
///
/// Biased toward strengths; forbidden from inventing facts the context does
/// not support.
pub const OPTIMIST_PROMPT: &str = r#"
You are an advocate arguing the case FOR visiting a business.

You will receive an evidence brief about one business. Argue its strengths:
quality, service, value, convenience, atmosphere.

Rules:
- Argue ONLY from the evidence in the brief. Never invent dishes, events,
  prices, or experiences the brief does not support.
- If the evidence for a strength is thin, say so rather than embellish.
- Do not mention where the evidence came from.
- Write a short, persuasive paragraph. No headings, no lists.
"#;

/// Instruction for the critical advocate pass.
///
/// Symmetric to the optimist; sees the same brief and nothing else.
pub const CRITIC_PROMPT: &str = r#"
You are an advocate arguing the case AGAINST visiting a business.

You will receive an evidence brief about one business. Argue its weaknesses:
inconsistency, slow service, cleanliness, noise, poor value.

Rules:
- Argue ONLY from the evidence in the brief. Never invent incidents,
  complaints, or problems the brief does not support.
- If the evidence for a weakness is thin, say so rather than embellish.
- Do not mention where the evidence came from.
- Write a short, persuasive paragraph. No headings, no lists.
"#;

/// The judge directive. Constant across runs and non-negotiable.
///
/// Encodes the verdict shape directly into the generation request: three
/// labeled lines, length-capped, no source attribution. The validator
/// enforces the same rules after the fact.
pub const JUDGE_DIRECTIVE: &str = r#"
You are the judge in a structured debate about one business.

You will receive an evidence brief, an argument for visiting, and an
argument against visiting. Weigh both arguments. Where they conflict, side
with the claim better grounded in the brief.

Produce EXACTLY three lines, nothing else:
Pros: <the strongest genuine positives, one line>
Cons: <the strongest genuine negatives, one line>
Our verdict: <a plain recommendation for a prospective visitor, one line>

Rules:
- Exactly those three labels, in that order, each used once.
- Each line at most 200 characters including the label.
- Every line must have content after the label.
- Never use the words "Yelp" or "review" or "reviews". Speak about the
  business directly, not about your sources.
- No extra commentary, no blank fourth line of text, no markdown.
"#;

/// Instruction for the synthetic summarizer.
///
/// Asks for machine-readable output; the summarizer module enforces the 3/3
/// arity after parsing.
pub const SUMMARIZER_PROMPT: &str = r#"
You summarize what a typical visit to a business is like, based only on its
descriptive facts (name, rating, price level, categories, location).

Respond with ONLY a JSON object, no prose and no code fences:
{"positives": ["...", "...", "..."], "negatives": ["...", "...", "..."]}

Rules:
- Exactly 3 positives and exactly 3 negatives.
- Each point is one short sentence a typical visitor might plausibly
  experience at a business of this kind, rating, and price level.
- Stay generic to the category. Never invent named dishes, staff, or events.
"#;

/// Get the advocate prompt for a role.
pub fn role_prompt(role: AgentRole) -> &'static str {
    match role {
        AgentRole::Optimistic => OPTIMIST_PROMPT,
        AgentRole::Critical => CRITIC_PROMPT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_prompt_retrieval() {
        assert!(role_prompt(AgentRole::Optimistic).contains("FOR visiting"));
        assert!(role_prompt(AgentRole::Critical).contains("AGAINST visiting"));
    }

    #[test]
    fn test_advocates_are_grounded() {
        // Both advocate prompts forbid inventing facts beyond the brief.
        assert!(OPTIMIST_PROMPT.contains("ONLY from the evidence"));
        assert!(CRITIC_PROMPT.contains("ONLY from the evidence"));
    }

    #[test]
    fn test_judge_directive_encodes_output_shape() {
        assert!(JUDGE_DIRECTIVE.contains("Pros:"));
        assert!(JUDGE_DIRECTIVE.contains("Cons:"));
        assert!(JUDGE_DIRECTIVE.contains("Our verdict:"));
        assert!(JUDGE_DIRECTIVE.contains("200 characters"));
    }

    #[test]
    fn test_judge_directive_bans_source_attribution() {
        assert!(JUDGE_DIRECTIVE.contains(r#""Yelp""#));
        assert!(JUDGE_DIRECTIVE.contains(r#""reviews""#));
    }

    #[test]
    fn test_summarizer_asks_for_three_of_each() {
        assert!(SUMMARIZER_PROMPT.contains("Exactly 3 positives and exactly 3 negatives"));
        assert!(SUMMARIZER_PROMPT.contains(r#""positives""#));
        assert!(SUMMARIZER_PROMPT.contains(r#""negatives""#));
    }
}
