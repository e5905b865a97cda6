//! Loan servicing and balance sheet update
//!
//! Run once per firm at the end of the credit phase. The firm's deposit is
//! split evenly over its banking relationships; at each bank the healthy
//! contracts are serviced in sequence order while that bank's share covers
//! the periodic payment. A contract that cannot be serviced records a miss
//! and may default.
//!
//! The balance sheet is then settled (deposit minus instalments, loans minus
//! principal repaid, equity recomputed), the account deposits are re-synced
//! and paid-off contracts are pruned.

use crate::models::{
    BankId, Event, EventLog, FirmId, LoanError, MissOutcome, PaymentOutcome, SimulationState,
};
use std::collections::BTreeMap;

/// What the amortization pass did for one firm
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AmortizationSummary {
    /// Sum of instalments paid (principal and interest)
    pub instalments: f64,
    pub principal_repaid: f64,
    pub paid_off: usize,
    pub defaulted: usize,
    pub missed: usize,
}

/// Service the loans of `firm_id` and settle its balance sheet
pub fn update_balance_sheet(
    state: &mut SimulationState,
    firm_id: FirmId,
    day: usize,
    default_threshold: u32,
    events: &mut EventLog,
) -> Result<AmortizationSummary, LoanError> {
    let mut summary = AmortizationSummary::default();
    let Some(deposit) = state.firms.get(&firm_id).map(|firm| firm.deposit()) else {
        return Ok(summary);
    };

    let banks = state.ledger.banks_of(firm_id);
    let mut available: BTreeMap<BankId, f64> = BTreeMap::new();
    if !banks.is_empty() {
        let share = deposit / banks.len() as f64;
        for bank in &banks {
            available.insert(*bank, share);
        }
    }

    for key in state.ledger.healthy_keys_of(firm_id) {
        let Some(payment) = state.ledger.get(&key).map(|loan| loan.payment()) else {
            continue;
        };
        let cash = available.entry(key.bank).or_insert(0.0);

        if *cash >= payment {
            *cash -= payment;
            let outcome = state.ledger.pay_instalment(&key, day)?;
            summary.instalments += payment;
            summary.principal_repaid += outcome.principal_repaid();
            if let PaymentOutcome::PaidOff { .. } = outcome {
                summary.paid_off += 1;
                events.log(Event::LoanPaidOff {
                    day,
                    firm_id,
                    bank_id: key.bank,
                    sequence: key.sequence,
                });
            }
        } else {
            summary.missed += 1;
            if let MissOutcome::Defaulted { outstanding } =
                state.ledger.miss_instalment(&key, day, default_threshold)?
            {
                summary.defaulted += 1;
                tracing::debug!(firm = firm_id, bank = key.bank, outstanding, "loan defaulted");
                events.log(Event::LoanDefaulted {
                    day,
                    firm_id,
                    bank_id: key.bank,
                    sequence: key.sequence,
                    outstanding,
                });
            }
        }
    }

    if let Some(firm) = state.firms.get_mut(&firm_id) {
        firm.record_amortization(summary.instalments, summary.principal_repaid);
        state.ledger.sync_deposit(firm_id, firm.deposit());
    }
    state.ledger.prune_paid_off(firm_id);

    Ok(summary)
}
