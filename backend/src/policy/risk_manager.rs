//! Bank risk manager
//!
//! Lends while the borrower's solvency ratio, including the new debt, stays
//! under a limit. Above the limit the request is refused, and with firm
//! support enabled the refusal is immediately followed by a direct transfer
//! covering the gap.

use super::{solvency_ratio, LendingDecision, LendingPolicy};
use crate::models::Firm;

/// Solvency-gated lending
///
/// # Example
///
/// ```
/// use disaster_simulator_core_rs::policy::{LendingDecision, LendingPolicy, RiskManagerPolicy};
/// use disaster_simulator_core_rs::models::{BalanceSheet, Firm};
///
/// let policy = RiskManagerPolicy::new(0.034, false);
/// let firm = Firm::active(1, 1, 0, 0, 100.0, 10.0, 0.1, BalanceSheet::new(0.0, 1000.0, 0.0, 0.0));
///
/// assert_eq!(policy.decide(&firm, 10.0), LendingDecision::Grant { gap: 10.0 });
/// assert!(matches!(policy.decide(&firm, 500.0), LendingDecision::Reject { .. }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskManagerPolicy {
    solvency_limit: f64,
    firm_support: bool,
}

impl RiskManagerPolicy {
    pub fn new(solvency_limit: f64, firm_support: bool) -> Self {
        Self {
            solvency_limit,
            firm_support,
        }
    }

    pub fn solvency_limit(&self) -> f64 {
        self.solvency_limit
    }

    pub fn firm_support(&self) -> bool {
        self.firm_support
    }
}

impl Default for RiskManagerPolicy {
    fn default() -> Self {
        Self::new(0.034, true)
    }
}

impl LendingPolicy for RiskManagerPolicy {
    fn decide(&self, firm: &Firm, gap: f64) -> LendingDecision {
        let sheet = firm.balance_sheet();
        let ratio = solvency_ratio(gap, sheet.loans, sheet.equity);

        if ratio < self.solvency_limit {
            LendingDecision::Grant { gap }
        } else if self.firm_support {
            LendingDecision::Support {
                gap,
                solvency_ratio: ratio,
            }
        } else {
            LendingDecision::Reject {
                gap,
                solvency_ratio: ratio,
            }
        }
    }

    fn name(&self) -> &'static str {
        "RiskManager"
    }
}
