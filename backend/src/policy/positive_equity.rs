//! Positive-equity policy
//!
//! Banks lend to any firm whose equity is not negative and refuse the
//! others. No government support is attached to this policy.

use super::{solvency_ratio, LendingDecision, LendingPolicy};
use crate::models::Firm;

pub struct PositiveEquityPolicy;

impl PositiveEquityPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PositiveEquityPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl LendingPolicy for PositiveEquityPolicy {
    fn decide(&self, firm: &Firm, gap: f64) -> LendingDecision {
        let sheet = firm.balance_sheet();
        if sheet.equity >= 0.0 {
            LendingDecision::Grant { gap }
        } else {
            LendingDecision::Reject {
                gap,
                solvency_ratio: solvency_ratio(gap, sheet.loans, sheet.equity),
            }
        }
    }

    fn name(&self) -> &'static str {
        "PositiveEquity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BalanceSheet;

    #[test]
    fn test_lends_only_without_negative_equity() {
        let healthy = Firm::active(1, 1, 0, 0, 10.0, 1.0, 0.0, BalanceSheet::new(5.0, 0.0, 1.0, 0.0));
        let even = Firm::active(2, 1, 0, 0, 10.0, 1.0, 0.0, BalanceSheet::new(1.0, 0.0, 1.0, 0.0));
        let broke = Firm::active(3, 1, 0, 0, 10.0, 1.0, 0.0, BalanceSheet::new(1.0, 0.0, 2.0, 0.0));

        assert_eq!(PositiveEquityPolicy.decide(&healthy, 3.0), LendingDecision::Grant { gap: 3.0 });
        assert_eq!(PositiveEquityPolicy.decide(&even, 3.0), LendingDecision::Grant { gap: 3.0 });
        assert!(matches!(
            PositiveEquityPolicy.decide(&broke, 3.0),
            LendingDecision::Reject { .. }
        ));
    }
}
