//! Lending Policy Module
//!
//! This module defines the bank-side decision taken when a firm's desired
//! outlay exceeds its cash.
//!
//! # Overview
//!
//! Every day, before paying its suppliers, a firm compares the orders it
//! wants to place with its deposit. The shortfall is the **financing gap**.
//! The lending policy decides how the gap is closed:
//! - short-term loans split evenly across the firm's banks
//! - a direct transfer (government support)
//! - nothing (the firm will have to cut its orders)
//!
//! # Policy Interface
//!
//! All policies implement the `LendingPolicy` trait:
//! ```rust
//! use disaster_simulator_core_rs::policy::{LendingDecision, LendingPolicy};
//! use disaster_simulator_core_rs::models::Firm;
//!
//! struct AlwaysRefuse;
//!
//! impl LendingPolicy for AlwaysRefuse {
//!     fn decide(&self, _firm: &Firm, gap: f64) -> LendingDecision {
//!         LendingDecision::Reject { gap, solvency_ratio: f64::INFINITY }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "AlwaysRefuse"
//!     }
//! }
//! ```
//!
//! Available policies:
//! 1. **RiskManager**: lend while the solvency ratio stays under a limit,
//!    optionally fall back to government support
//! 2. **NoRisk**: always lend
//! 3. **PositiveEquity**: lend only to firms with non-negative equity

use crate::models::Firm;

mod no_risk;
mod positive_equity;
mod risk_manager;

pub use no_risk::NoRiskPolicy;
pub use positive_equity::PositiveEquityPolicy;
pub use risk_manager::RiskManagerPolicy;

/// How a financing gap is closed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LendingDecision {
    /// Originate short-term loans for the whole gap
    Grant { gap: f64 },

    /// Refuse; the firm keeps its shortfall
    Reject { gap: f64, solvency_ratio: f64 },

    /// Refuse the loan but cover the gap with a direct transfer
    Support { gap: f64, solvency_ratio: f64 },
}

/// Bank decision on a positive financing gap
///
/// Policies are shared across trials running on different threads.
pub trait LendingPolicy: Send + Sync {
    /// Decide how to close `gap` (always positive) for `firm`
    fn decide(&self, firm: &Firm, gap: f64) -> LendingDecision;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Financing gap of a firm: desired outlay not covered by its deposit
///
/// Returns `None` when the deposit covers the outlay.
pub fn financing_gap(desired_outlay: f64, deposit: f64) -> Option<f64> {
    if desired_outlay <= deposit {
        None
    } else {
        Some(desired_outlay - deposit)
    }
}

/// Solvency ratio `(gap + loans) / (equity + gap + loans)`
///
/// A non-positive denominator means debt already exceeds net worth; it is
/// reported as infinite risk.
pub fn solvency_ratio(gap: f64, loans: f64, equity: f64) -> f64 {
    let exposure = gap + loans;
    let denominator = equity + exposure;
    if denominator <= 0.0 {
        f64::INFINITY
    } else {
        exposure / denominator
    }
}
