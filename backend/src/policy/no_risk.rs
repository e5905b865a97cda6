//! No-risk policy
//!
//! Banks lend whatever is asked. Baseline for comparison with the risk
//! manager.

use super::{LendingDecision, LendingPolicy};
use crate::models::Firm;

/// Always grant the full gap
pub struct NoRiskPolicy;

impl NoRiskPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoRiskPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl LendingPolicy for NoRiskPolicy {
    fn decide(&self, _firm: &Firm, gap: f64) -> LendingDecision {
        LendingDecision::Grant { gap }
    }

    fn name(&self) -> &'static str {
        "NoRisk"
    }
}
