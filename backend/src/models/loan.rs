//! Loan contract model
//!
//! An amortizing loan between one firm and one bank.
//! Each contract has:
//! - Original principal and outstanding principal
//! - Interest rate and periodic payment (annuity, or flat when the rate is zero)
//! - Payments-made and consecutive-missed-payment counters
//! - Status (Healthy, PaidOff, Defaulted) and term (Short, Long)
//!
//! # Lifecycle
//!
//! ```text
//! Healthy ──(payments_made == maturity)──▶ PaidOff
//!    │
//!    └──(missed_payments == default threshold, short term only)──▶ Defaulted
//! ```
//!
//! Both exits are terminal. Operating on a terminal contract is an error.

use crate::models::{BankId, FirmId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// Contract is being serviced (possibly with some missed payments)
    Healthy,

    /// All payments made
    PaidOff {
        /// Day of the final payment
        day: usize,
    },

    /// Borrower missed the configured number of consecutive payments
    Defaulted {
        /// Day the default was recorded
        day: usize,
    },
}

/// Loan term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanTerm {
    /// Working-capital loan requested when cash cannot cover orders
    Short,
    /// Reconstruction loan issued to damaged firms
    Long,
}

/// Key of the loan table: borrower, lender, per-relationship sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoanKey {
    pub firm: FirmId,
    pub bank: BankId,
    pub sequence: u32,
}

/// Errors that can occur during loan operations
#[derive(Debug, Error, PartialEq)]
pub enum LoanError {
    #[error("Loan is no longer serviced: {status:?}")]
    NotServiced { status: LoanStatus },

    #[error("Loan maturity must be positive")]
    ZeroMaturity,

    #[error("Loan principal must be finite and non-negative, got {0}")]
    InvalidPrincipal(f64),

    #[error("Unknown loan: {0:?}")]
    UnknownLoan(LoanKey),
}

/// Result of a successful instalment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaymentOutcome {
    /// Instalment made, contract still running
    Amortized { principal_repaid: f64 },
    /// Final instalment made
    PaidOff { principal_repaid: f64 },
}

impl PaymentOutcome {
    pub fn principal_repaid(&self) -> f64 {
        match self {
            PaymentOutcome::Amortized { principal_repaid }
            | PaymentOutcome::PaidOff { principal_repaid } => *principal_repaid,
        }
    }
}

/// Result of a missed instalment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissOutcome {
    Missed { consecutive: u32 },
    /// This miss reached the default threshold
    Defaulted { outstanding: f64 },
}

/// Periodic payment of an annuity
///
/// `principal × rate / (1 − (1 + rate)^−maturity)`, falling back to the flat
/// `principal / maturity` when the rate is zero.
pub fn annuity_payment(principal: f64, rate: f64, maturity: u32) -> f64 {
    if maturity == 0 {
        return principal;
    }
    if rate.abs() < 1e-12 {
        return principal / maturity as f64;
    }
    principal * rate / (1.0 - (1.0 + rate).powi(-(maturity as i32)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanContract {
    principal: f64,
    outstanding: f64,
    rate: f64,
    payment: f64,
    maturity: u32,
    payments_made: u32,
    missed_payments: u32,
    status: LoanStatus,
    term: LoanTerm,
    originated_day: usize,
}

impl LoanContract {
    /// Create an annuity loan
    ///
    /// # Example
    /// ```
    /// use disaster_simulator_core_rs::models::{LoanContract, LoanTerm};
    ///
    /// let loan = LoanContract::annuity(1000.0, 0.04, 399, LoanTerm::Long, 1).unwrap();
    /// assert!(loan.payment() > 1000.0 / 399.0);
    /// assert!(loan.is_healthy());
    /// ```
    pub fn annuity(
        principal: f64,
        rate: f64,
        maturity: u32,
        term: LoanTerm,
        day: usize,
    ) -> Result<Self, LoanError> {
        let payment = annuity_payment(principal, rate, maturity);
        Self::with_payment(principal, rate, payment, maturity, term, day)
    }

    /// Create an interest-free loan repaid in equal instalments
    pub fn flat(
        principal: f64,
        maturity: u32,
        term: LoanTerm,
        day: usize,
    ) -> Result<Self, LoanError> {
        let payment = if maturity > 0 {
            principal / maturity as f64
        } else {
            principal
        };
        Self::with_payment(principal, 0.0, payment, maturity, term, day)
    }

    fn with_payment(
        principal: f64,
        rate: f64,
        payment: f64,
        maturity: u32,
        term: LoanTerm,
        day: usize,
    ) -> Result<Self, LoanError> {
        if maturity == 0 {
            return Err(LoanError::ZeroMaturity);
        }
        if !principal.is_finite() || principal < 0.0 {
            return Err(LoanError::InvalidPrincipal(principal));
        }
        Ok(Self {
            principal,
            outstanding: principal,
            rate,
            payment,
            maturity,
            payments_made: 0,
            missed_payments: 0,
            status: LoanStatus::Healthy,
            term,
            originated_day: day,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn outstanding(&self) -> f64 {
        self.outstanding
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn payment(&self) -> f64 {
        self.payment
    }

    pub fn maturity(&self) -> u32 {
        self.maturity
    }

    pub fn payments_made(&self) -> u32 {
        self.payments_made
    }

    pub fn missed_payments(&self) -> u32 {
        self.missed_payments
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn term(&self) -> LoanTerm {
        self.term
    }

    pub fn originated_day(&self) -> usize {
        self.originated_day
    }

    pub fn is_healthy(&self) -> bool {
        self.status == LoanStatus::Healthy
    }

    pub fn is_paid_off(&self) -> bool {
        matches!(self.status, LoanStatus::PaidOff { .. })
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self.status, LoanStatus::Defaulted { .. })
    }

    /// Principal portion of each instalment
    pub fn principal_instalment(&self) -> f64 {
        self.principal / self.maturity as f64
    }

    // ========================================================================
    // State transitions
    // ========================================================================

    /// Record one instalment paid on `day`
    pub fn record_payment(&mut self, day: usize) -> Result<PaymentOutcome, LoanError> {
        if !self.is_healthy() {
            return Err(LoanError::NotServiced {
                status: self.status,
            });
        }

        let principal_repaid = self.principal_instalment().min(self.outstanding);
        self.outstanding -= principal_repaid;
        self.payments_made += 1;
        self.missed_payments = 0;

        if self.payments_made >= self.maturity {
            self.outstanding = 0.0;
            self.status = LoanStatus::PaidOff { day };
            Ok(PaymentOutcome::PaidOff { principal_repaid })
        } else {
            Ok(PaymentOutcome::Amortized { principal_repaid })
        }
    }

    /// Record one missed instalment on `day`
    ///
    /// Only short-term contracts can default; long-term contracts keep
    /// counting misses while staying healthy.
    pub fn record_missed(
        &mut self,
        day: usize,
        default_threshold: u32,
    ) -> Result<MissOutcome, LoanError> {
        if !self.is_healthy() {
            return Err(LoanError::NotServiced {
                status: self.status,
            });
        }

        self.missed_payments += 1;
        if self.term == LoanTerm::Short && self.missed_payments >= default_threshold {
            self.status = LoanStatus::Defaulted { day };
            Ok(MissOutcome::Defaulted {
                outstanding: self.outstanding,
            })
        } else {
            Ok(MissOutcome::Missed {
                consecutive: self.missed_payments,
            })
        }
    }
}
