//! Credit ledger
//!
//! The firm–bank network and every loan contract written on it.
//!
//! - `accounts`: one `BankAccount` per (firm, bank) relationship, holding the
//!   running loan balance and the share of the firm's deposit placed there
//! - `loans`: flat table `LoanKey → LoanContract`
//!
//! Instalments and misses go through the ledger so that account balances move
//! together with the contracts. Defaulted contracts stay in the table (they
//! feed NPL statistics); paid-off contracts are pruned at the end of the day.

use crate::models::loan::{LoanContract, LoanError, LoanKey, LoanTerm, MissOutcome, PaymentOutcome};
use crate::models::serde_pairs;
use crate::models::{BankId, FirmId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position of one firm at one bank
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BankAccount {
    pub loan: f64,
    pub deposit: f64,
}

/// Running totals of one bank, accumulated over its clients
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BankAggregate {
    /// Number of client firms
    pub firms: usize,
    pub loans: f64,
    pub deposits: f64,
    pub npl_count: usize,
    pub npl_volume: f64,
}

/// Short-term credit totals reported every day
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CreditTotals {
    /// Outstanding principal of healthy short-term loans
    pub loans: f64,
    /// Outstanding principal of defaulted short-term loans
    pub npl: f64,
    pub npl_count: usize,
}

impl CreditTotals {
    /// NPL / (loans + NPL), zero when there is no credit at all
    pub fn npl_rate(&self) -> f64 {
        let total = self.loans + self.npl;
        if total > 0.0 {
            self.npl / total
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditLedger {
    #[serde(with = "serde_pairs")]
    accounts: BTreeMap<(FirmId, BankId), BankAccount>,

    #[serde(with = "serde_pairs")]
    loans: BTreeMap<LoanKey, LoanContract>,

    /// Next sequence number per relationship
    #[serde(with = "serde_pairs")]
    next_sequence: BTreeMap<(FirmId, BankId), u32>,
}

impl CreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Relationships
    // ========================================================================

    /// Register a firm–bank relationship with its opening position
    pub fn open_account(&mut self, firm: FirmId, bank: BankId, loan: f64, deposit: f64) {
        self.accounts.insert((firm, bank), BankAccount { loan, deposit });
    }

    pub fn account(&self, firm: FirmId, bank: BankId) -> Option<&BankAccount> {
        self.accounts.get(&(firm, bank))
    }

    /// Banks of `firm`, ascending by id
    pub fn banks_of(&self, firm: FirmId) -> Vec<BankId> {
        self.accounts
            .range((firm, BankId::MIN)..=(firm, BankId::MAX))
            .map(|((_, bank), _)| *bank)
            .collect()
    }

    pub fn relationship_count(&self, firm: FirmId) -> usize {
        self.accounts
            .range((firm, BankId::MIN)..=(firm, BankId::MAX))
            .count()
    }

    /// Spread the firm's deposit evenly over its accounts
    pub fn sync_deposit(&mut self, firm: FirmId, deposit: f64) {
        let count = self.relationship_count(firm);
        if count == 0 {
            return;
        }
        let share = deposit / count as f64;
        for (_, account) in self
            .accounts
            .range_mut((firm, BankId::MIN)..=(firm, BankId::MAX))
        {
            account.deposit = share;
        }
    }

    // ========================================================================
    // Contracts
    // ========================================================================

    /// Book a new contract; the account's loan and deposit rise by the principal
    pub fn originate(&mut self, firm: FirmId, bank: BankId, contract: LoanContract) -> LoanKey {
        let sequence = self.next_sequence.entry((firm, bank)).or_insert(0);
        let key = LoanKey {
            firm,
            bank,
            sequence: *sequence,
        };
        *sequence += 1;

        let account = self.accounts.entry((firm, bank)).or_default();
        account.loan += contract.principal();
        account.deposit += contract.principal();

        self.loans.insert(key, contract);
        key
    }

    pub fn get(&self, key: &LoanKey) -> Option<&LoanContract> {
        self.loans.get(key)
    }

    /// Contracts of `firm`, ascending by (bank, sequence)
    pub fn loans_of(&self, firm: FirmId) -> impl Iterator<Item = (&LoanKey, &LoanContract)> {
        self.loans.range(Self::firm_range(firm))
    }

    /// Keys of the contracts still serviced by `firm`
    pub fn healthy_keys_of(&self, firm: FirmId) -> Vec<LoanKey> {
        self.loans_of(firm)
            .filter(|(_, loan)| loan.is_healthy())
            .map(|(key, _)| *key)
            .collect()
    }

    /// Record an instalment and lower the account's loan balance
    pub fn pay_instalment(&mut self, key: &LoanKey, day: usize) -> Result<PaymentOutcome, LoanError> {
        let contract = self.loans.get_mut(key).ok_or(LoanError::UnknownLoan(*key))?;
        let outcome = contract.record_payment(day)?;
        if let Some(account) = self.accounts.get_mut(&(key.firm, key.bank)) {
            account.loan = (account.loan - outcome.principal_repaid()).max(0.0);
        }
        Ok(outcome)
    }

    /// Record a missed instalment; a default moves the principal out of the account
    pub fn miss_instalment(
        &mut self,
        key: &LoanKey,
        day: usize,
        default_threshold: u32,
    ) -> Result<MissOutcome, LoanError> {
        let contract = self.loans.get_mut(key).ok_or(LoanError::UnknownLoan(*key))?;
        let outcome = contract.record_missed(day, default_threshold)?;
        if let MissOutcome::Defaulted { outstanding } = outcome {
            if let Some(account) = self.accounts.get_mut(&(key.firm, key.bank)) {
                account.loan = (account.loan - outstanding).max(0.0);
            }
        }
        Ok(outcome)
    }

    /// Drop the paid-off contracts of `firm`; returns how many were removed
    pub fn prune_paid_off(&mut self, firm: FirmId) -> usize {
        let paid: Vec<LoanKey> = self
            .loans_of(firm)
            .filter(|(_, loan)| loan.is_paid_off())
            .map(|(key, _)| *key)
            .collect();
        for key in &paid {
            self.loans.remove(key);
        }
        paid.len()
    }

    pub fn loan_count(&self) -> usize {
        self.loans.len()
    }

    // ========================================================================
    // Aggregates
    // ========================================================================

    /// Short-term loan and NPL totals, summed in key order
    pub fn short_term_totals(&self) -> CreditTotals {
        let mut totals = CreditTotals::default();
        for loan in self.loans.values().filter(|l| l.term() == LoanTerm::Short) {
            if loan.is_defaulted() {
                totals.npl += loan.outstanding();
                totals.npl_count += 1;
            } else if loan.is_healthy() {
                totals.loans += loan.outstanding();
            }
        }
        totals
    }

    /// Per-bank totals over all accounts and contracts
    pub fn bank_aggregates(&self) -> BTreeMap<BankId, BankAggregate> {
        let mut banks: BTreeMap<BankId, BankAggregate> = BTreeMap::new();
        for ((_, bank), account) in &self.accounts {
            let aggregate = banks.entry(*bank).or_default();
            aggregate.firms += 1;
            aggregate.loans += account.loan;
            aggregate.deposits += account.deposit;
        }
        for (key, loan) in &self.loans {
            if loan.is_defaulted() {
                let aggregate = banks.entry(key.bank).or_default();
                aggregate.npl_count += 1;
                aggregate.npl_volume += loan.outstanding();
            }
        }
        banks
    }

    fn firm_range(firm: FirmId) -> std::ops::RangeInclusive<LoanKey> {
        LoanKey {
            firm,
            bank: BankId::MIN,
            sequence: u32::MIN,
        }..=LoanKey {
            firm,
            bank: BankId::MAX,
            sequence: u32::MAX,
        }
    }
}
