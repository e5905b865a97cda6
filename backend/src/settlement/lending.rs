//! Loan demand and supply
//!
//! A firm whose desired orders exceed its deposit asks its banks for the
//! difference. Granted requests become one short-term contract per banking
//! relationship, each for an equal share of the gap. Reconstruction loans
//! for damaged firms are written here as well.

use crate::models::{Event, EventLog, FirmId, LoanContract, LoanError, LoanTerm, SimulationState};
use crate::orchestrator::CreditConfig;
use crate::policy::{financing_gap, solvency_ratio, LendingDecision, LendingPolicy};

/// Base rate of short-term credit, scaled by the production shortfall
pub const SHORT_TERM_BASE_RATE: f64 = 0.04;

/// How a firm's financing need was handled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FinancingOutcome {
    /// Deposit covers the desired orders
    Covered,
    /// Short-term loans originated for the whole gap
    Financed { gap: f64, loans: usize },
    /// Request refused
    Rejected { gap: f64 },
    /// Request refused, gap covered by government support
    Supported { gap: f64 },
    /// Firm has no bank to borrow from
    Unbanked { gap: f64 },
}

/// Short-term interest rate `(1 − Pact/Pini) × base`
pub fn short_term_rate(production: f64, initial_production: f64) -> f64 {
    if initial_production <= 0.0 {
        return 0.0;
    }
    ((1.0 - production / initial_production) * SHORT_TERM_BASE_RATE).max(0.0)
}

/// Close the financing gap of `firm_id` for the day
pub fn secure_financing(
    state: &mut SimulationState,
    firm_id: FirmId,
    policy: &dyn LendingPolicy,
    credit: &CreditConfig,
    day: usize,
    events: &mut EventLog,
) -> Result<FinancingOutcome, LoanError> {
    let desired = state.orders.desired_total(firm_id);
    let Some(firm) = state.firms.get(&firm_id) else {
        return Ok(FinancingOutcome::Covered);
    };
    let Some(gap) = financing_gap(desired, firm.deposit()) else {
        return Ok(FinancingOutcome::Covered);
    };

    match policy.decide(firm, gap) {
        LendingDecision::Grant { gap } => originate_short_term(state, firm_id, gap, credit, day, events),
        LendingDecision::Reject { gap, solvency_ratio } => {
            if let Some(firm) = state.firms.get_mut(&firm_id) {
                firm.record_rejection();
            }
            events.log(Event::LoanRejected {
                day,
                firm_id,
                gap,
                solvency_ratio,
            });
            Ok(FinancingOutcome::Rejected { gap })
        }
        LendingDecision::Support { gap, solvency_ratio } => {
            events.log(Event::LoanRejected {
                day,
                firm_id,
                gap,
                solvency_ratio,
            });
            if let Some(firm) = state.firms.get_mut(&firm_id) {
                firm.record_rejection();
                if firm.loan_rejections() > 0 {
                    firm.receive_transfer(gap);
                    firm.reset_rejections();
                }
            }
            state.orders.record_support(firm_id, gap);
            events.log(Event::GovernmentSupport {
                day,
                firm_id,
                amount: gap,
            });
            Ok(FinancingOutcome::Supported { gap })
        }
    }
}

fn originate_short_term(
    state: &mut SimulationState,
    firm_id: FirmId,
    gap: f64,
    credit: &CreditConfig,
    day: usize,
    events: &mut EventLog,
) -> Result<FinancingOutcome, LoanError> {
    let banks = state.ledger.banks_of(firm_id);
    let Some(firm) = state.firms.get_mut(&firm_id) else {
        return Ok(FinancingOutcome::Covered);
    };

    if banks.is_empty() {
        tracing::warn!(firm = firm_id, gap, "firm has no bank; loan request dropped");
        firm.record_rejection();
        let sheet = firm.balance_sheet();
        events.log(Event::LoanRejected {
            day,
            firm_id,
            gap,
            solvency_ratio: solvency_ratio(gap, sheet.loans, sheet.equity),
        });
        return Ok(FinancingOutcome::Unbanked { gap });
    }

    let principal = gap / banks.len() as f64;
    let rate = if credit.variable_rate {
        short_term_rate(firm.production(), firm.initial_production())
    } else {
        0.0
    };

    for bank in &banks {
        let contract = if credit.variable_rate {
            LoanContract::annuity(principal, rate, credit.short_term_maturity, LoanTerm::Short, day)?
        } else {
            LoanContract::flat(principal, credit.short_term_maturity, LoanTerm::Short, day)?
        };
        state.ledger.originate(firm_id, *bank, contract);
        firm.receive_loan(principal);
        events.log(Event::LoanOriginated {
            day,
            firm_id,
            bank_id: *bank,
            principal,
            rate,
        });
    }
    firm.reset_rejections();

    Ok(FinancingOutcome::Financed {
        gap,
        loans: banks.len(),
    })
}

/// Write reconstruction loans for `total` split evenly over the firm's banks
///
/// Returns the number of contracts written (0 for a firm without bank).
pub fn issue_long_term_loans(
    state: &mut SimulationState,
    firm_id: FirmId,
    total: f64,
    credit: &CreditConfig,
    day: usize,
    events: &mut EventLog,
) -> Result<usize, LoanError> {
    let banks = state.ledger.banks_of(firm_id);
    let Some(firm) = state.firms.get_mut(&firm_id) else {
        return Ok(0);
    };
    if banks.is_empty() {
        tracing::warn!(firm = firm_id, total, "damaged firm has no bank; no reconstruction loan");
        return Ok(0);
    }

    let principal = total / banks.len() as f64;
    for bank in &banks {
        let contract = LoanContract::annuity(
            principal,
            credit.long_term_rate,
            credit.long_term_maturity,
            LoanTerm::Long,
            day,
        )?;
        state.ledger.originate(firm_id, *bank, contract);
        firm.receive_loan(principal);
        events.log(Event::LongTermLoanIssued {
            day,
            firm_id,
            bank_id: *bank,
            principal,
        });
    }
    firm.balance_sheet_mut().recompute_equity();
    Ok(banks.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_term_rate_scales_with_shortfall() {
        assert_eq!(short_term_rate(100.0, 100.0), 0.0);
        assert!((short_term_rate(50.0, 100.0) - 0.02).abs() < 1e-12);
        assert_eq!(short_term_rate(10.0, 0.0), 0.0);
    }
}
