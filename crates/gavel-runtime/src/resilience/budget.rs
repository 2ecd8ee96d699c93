//! Token budget management for generation calls.
//!
//! Enforces per-pass and global token budgets so a misbehaving run cannot
//! spend without bound, and accumulates the usage that is reported next to
//! the verdict.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use gavel_core::AgentRole;

use crate::providers::TokenUsage;

/// The generation passes a run can spend tokens on.
///
/// The summarizer is its own scope: it shares the provider with the debate
/// passes but never their budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebatePass {
    Optimistic,
    Critical,
    Judge,
    Summarizer,
}

impl DebatePass {
    /// All passes, for budget initialization.
    pub const ALL: [DebatePass; 4] = [
        DebatePass::Optimistic,
        DebatePass::Critical,
        DebatePass::Judge,
        DebatePass::Summarizer,
    ];
}

impl From<AgentRole> for DebatePass {
    fn from(role: AgentRole) -> Self {
        match role {
            AgentRole::Optimistic => DebatePass::Optimistic,
            AgentRole::Critical => DebatePass::Critical,
        }
    }
}

/// Token budget for a scope (pass or global).
pub struct TokenBudget {
    /// Maximum tokens allowed
    pub max_tokens: u32,

    /// Currently used tokens
    used: AtomicU32,
}

impl TokenBudget {
    /// Create a new token budget.
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            used: AtomicU32::new(0),
        }
    }

    /// Check if we can afford to use tokens.
    pub fn can_afford(&self, tokens: u32) -> bool {
        self.remaining() >= tokens
    }

    /// Record token usage.
    pub fn record(&self, tokens: u32) {
        self.used.fetch_add(tokens, Ordering::SeqCst);
    }

    /// Get remaining tokens.
    pub fn remaining(&self) -> u32 {
        self.max_tokens
            .saturating_sub(self.used.load(Ordering::SeqCst))
    }

    /// Get used tokens.
    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    /// Reset the budget.
    pub fn reset(&self) {
        self.used.store(0, Ordering::SeqCst);
    }
}

/// Accumulated generation usage for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebateUsage {
    /// Total tokens used
    pub total_tokens: u32,

    /// Prompt/input tokens
    pub prompt_tokens: u32,

    /// Completion/output tokens
    pub completion_tokens: u32,

    /// Number of generation calls made
    pub llm_calls: u32,

    /// Estimated cost in USD
    pub estimated_cost: f64,
}

impl DebateUsage {
    /// Add token usage from a provider response.
    pub fn add(&mut self, usage: &TokenUsage, model: &str) {
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_tokens += usage.total();
        self.llm_calls += 1;
        self.estimated_cost += Self::estimate_cost(usage, model);
    }

    /// Estimate cost for a usage entry.
    fn estimate_cost(usage: &TokenUsage, model: &str) -> f64 {
        // Pricing per million tokens (as of mid 2026)
        let (input_rate, output_rate) = match model {
            m if m.contains("flash-lite") => (0.10, 0.40),
            m if m.contains("flash") => (0.30, 2.50),
            m if m.contains("pro") => (1.25, 10.0),
            _ => (0.30, 2.50), // Default to flash pricing
        };

        let input_cost = (usage.prompt_tokens as f64 / 1_000_000.0) * input_rate;
        let output_cost = (usage.completion_tokens as f64 / 1_000_000.0) * output_rate;

        input_cost + output_cost
    }
}

/// Budget tracker for one pipeline run.
pub struct UsageTracker {
    /// Per-pass budgets
    pass_budgets: HashMap<DebatePass, TokenBudget>,

    /// Global budget for the entire run
    global_budget: TokenBudget,

    /// Accumulated usage
    usage: RwLock<DebateUsage>,
}

impl UsageTracker {
    /// Create a new tracker with uniform per-pass budgets.
    pub fn new(global_max: u32, per_pass_max: u32) -> Self {
        let pass_budgets = DebatePass::ALL
            .into_iter()
            .map(|pass| (pass, TokenBudget::new(per_pass_max)))
            .collect();

        Self {
            pass_budgets,
            global_budget: TokenBudget::new(global_max),
            usage: RwLock::new(DebateUsage::default()),
        }
    }

    /// Check if a call can be afforded for a pass.
    pub fn can_afford(&self, pass: DebatePass, estimated_tokens: u32) -> bool {
        let pass_ok = self
            .pass_budgets
            .get(&pass)
            .map(|b| b.can_afford(estimated_tokens))
            .unwrap_or(true);

        pass_ok && self.global_budget.can_afford(estimated_tokens)
    }

    /// Record usage after a call.
    pub fn record_usage(&self, pass: DebatePass, usage: &TokenUsage, model: &str) {
        let total = usage.total();

        if let Some(budget) = self.pass_budgets.get(&pass) {
            budget.record(total);
        }
        self.global_budget.record(total);

        self.usage.write().add(usage, model);
    }

    /// Get accumulated usage.
    pub fn get_usage(&self) -> DebateUsage {
        self.usage.read().clone()
    }

    /// Get remaining global budget.
    pub fn remaining_global(&self) -> u32 {
        self.global_budget.remaining()
    }

    /// Get remaining budget for a pass.
    pub fn remaining_pass(&self, pass: DebatePass) -> u32 {
        self.pass_budgets
            .get(&pass)
            .map(|b| b.remaining())
            .unwrap_or(0)
    }

    /// Reset all budgets for a new run.
    pub fn reset(&self) {
        for budget in self.pass_budgets.values() {
            budget.reset();
        }
        self.global_budget.reset();
        *self.usage.write() = DebateUsage::default();
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new(20_000, 6_000)
    }
}
