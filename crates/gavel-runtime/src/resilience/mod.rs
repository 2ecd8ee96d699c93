//! Resilience pieces for gavel-runtime.
//!
//! This module provides:
//! - Token budget enforcement per pass and per run
//! - Usage and cost accounting surfaced alongside the verdict

mod budget;

pub use budget::{DebatePass, DebateUsage, TokenBudget, UsageTracker};
