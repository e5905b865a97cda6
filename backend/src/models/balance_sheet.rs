//! Firm balance sheet
//!
//! Five positions, with equity as the residual:
//!
//! ```text
//! equity = deposit + other_assets − loans − other_liabilities
//! ```
//!
//! Every settlement pass ends with `recompute_equity`, so the identity holds
//! at each end-of-day observation point.

use serde::{Deserialize, Serialize};

/// Floating tolerance for the balance identity
pub const IDENTITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub deposit: f64,
    pub other_assets: f64,
    pub loans: f64,
    pub equity: f64,
    pub other_liabilities: f64,
}

impl BalanceSheet {
    /// Build a balance sheet with equity derived from the other positions
    ///
    /// # Example
    /// ```
    /// use disaster_simulator_core_rs::models::BalanceSheet;
    ///
    /// let bs = BalanceSheet::new(100.0, 50.0, 80.0, 20.0);
    /// assert_eq!(bs.equity, 50.0);
    /// ```
    pub fn new(deposit: f64, other_assets: f64, loans: f64, other_liabilities: f64) -> Self {
        let mut sheet = Self {
            deposit,
            other_assets,
            loans,
            equity: 0.0,
            other_liabilities,
        };
        sheet.recompute_equity();
        sheet
    }

    pub fn recompute_equity(&mut self) {
        self.equity = self.deposit + self.other_assets - self.loans - self.other_liabilities;
    }

    /// Difference between recorded equity and the identity's right-hand side
    pub fn identity_gap(&self) -> f64 {
        self.equity - (self.deposit + self.other_assets - self.loans - self.other_liabilities)
    }

    pub fn holds_identity(&self) -> bool {
        self.identity_gap().abs() <= IDENTITY_TOLERANCE * (1.0 + self.equity.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_after_mutation() {
        let mut bs = BalanceSheet::new(10.0, 5.0, 3.0, 2.0);
        assert!(bs.holds_identity());

        bs.deposit += 4.0;
        assert!(!bs.holds_identity());

        bs.recompute_equity();
        assert!(bs.holds_identity());
        assert_eq!(bs.equity, 14.0);
    }
}
