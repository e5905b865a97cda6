//! Credit & Settlement Module
//!
//! Phase 3 of a simulated day, run per active firm:
//!
//! - **Lending** (3a): close the financing gap between desired orders and cash
//!   through the lending policy (short-term loans, support or refusal)
//! - **Payment** (3a): pay suppliers, or hand back part or all of the day's
//!   deliveries when cash falls short
//! - **Revenue reversal** (3b): suppliers lose the sales and margin on what
//!   was handed back
//! - **Amortization** (3c): service every healthy loan from the deposit,
//!   detect defaults, settle the balance sheet and prune paid-off loans
//!
//! Payments never debit the deposit: a firm's cash moves through its sales
//! margin (`profit_to_sales × sales`), loan proceeds, transfers and
//! instalments.
//!
//! # Critical Invariants
//!
//! 1. **Balance Identity**: every firm's balance sheet satisfies the identity after 3c
//! 2. **Terminal Default**: a defaulted contract is never serviced again
//! 3. **Pair Ownership**: in 3a a firm only rewrites the deliveries it received
//!
//! # Example
//!
//! ```rust
//! use disaster_simulator_core_rs::settlement::{short_term_rate, SHORT_TERM_BASE_RATE};
//!
//! // A firm running at 75% of capacity borrows at a quarter of the base rate
//! assert!((short_term_rate(75.0, 100.0) - 0.25 * SHORT_TERM_BASE_RATE).abs() < 1e-12);
//! ```

pub mod amortization;
pub mod lending;
pub mod payment;

// Re-export public API
pub use amortization::{update_balance_sheet, AmortizationSummary};
pub use lending::{
    issue_long_term_loans, secure_financing, short_term_rate, FinancingOutcome,
    SHORT_TERM_BASE_RATE,
};
pub use payment::{apply_revenue_reversals, settle_payment, SettlementOutcome, PAYMENT_TOLERANCE};
