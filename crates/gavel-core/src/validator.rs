//! Verdict validation: strict three-line shape, never best-effort parse.
//!
//! The judge pass produces free text; this module is the only way that text
//! becomes a [`Verdict`]. If the shape is wrong we reject and let the
//! orchestrator re-ask the judge: we never repair, pad, or partially
//! accept.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::types::Verdict;

/// Maximum length of each labeled line, label included.
pub const MAX_LINE_CHARS: usize = 200;

pub const PROS_LABEL: &str = "Pros:";
pub const CONS_LABEL: &str = "Cons:";
pub const RECOMMENDATION_LABEL: &str = "Our verdict:";

lazy_static! {
    // Source-attribution terms the verdict must never carry.
    static ref FORBIDDEN_TERMS: Regex = Regex::new(r"(?i)\byelp\b|\breviews?\b").unwrap();
}

/// Why a raw judge output was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("expected exactly 3 labeled lines, found {found}")]
    WrongLineCount { found: usize },

    #[error("line {position} must start with '{expected}'")]
    WrongLabel {
        position: usize,
        expected: &'static str,
    },

    #[error("'{label}' line exceeds {max} characters ({len})")]
    LineTooLong {
        label: &'static str,
        len: usize,
        max: usize,
    },

    #[error("'{label}' line is empty after the label")]
    EmptyLine { label: &'static str },

    #[error("'{label}' line names the evidence source ('{term}')")]
    ForbiddenTerm { label: &'static str, term: String },
}

/// Validate a raw judge output into a structured [`Verdict`].
///
/// Accepts only three non-blank lines carrying the `Pros:`, `Cons:`,
/// `Our verdict:` labels in that order (case-sensitive), each within
/// [`MAX_LINE_CHARS`], non-empty after the label, and free of
/// source-attribution terms. Blank lines between labeled lines are ignored;
/// any other deviation is a [`ValidationError`].
pub fn validate(raw: &str) -> Result<Verdict, ValidationError> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() != 3 {
        return Err(ValidationError::WrongLineCount { found: lines.len() });
    }

    let pros = parse_line(lines[0], 1, PROS_LABEL)?;
    let cons = parse_line(lines[1], 2, CONS_LABEL)?;
    let recommendation = parse_line(lines[2], 3, RECOMMENDATION_LABEL)?;

    Ok(Verdict {
        pros,
        cons,
        recommendation,
    })
}

fn parse_line(
    line: &str,
    position: usize,
    label: &'static str,
) -> Result<String, ValidationError> {
    if !line.starts_with(label) {
        return Err(ValidationError::WrongLabel { position, expected: label });
    }

    let len = line.chars().count();
    if len > MAX_LINE_CHARS {
        return Err(ValidationError::LineTooLong {
            label,
            len,
            max: MAX_LINE_CHARS,
        });
    }

    let content = line[label.len()..].trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyLine { label });
    }

    if let Some(found) = FORBIDDEN_TERMS.find(line) {
        return Err(ValidationError::ForbiddenTerm {
            label,
            term: found.as_str().to_string(),
        });
    }

    Ok(content.to_string())
}
