//! Firm model
//!
//! Represents one producer in the firm-to-firm network.
//! Each firm has:
//! - Static tags (sector, location, community) used by disaster scenarios
//! - Baseline capacity `Pini`, realized production `Pact` and final consumption `C`
//! - Damage factor Δ and recovery rate (only meaningful once damaged)
//! - A balance sheet and a loan-rejection counter used by the lending policy
//!
//! Inactive firms carry no `Pini`/`C`: they never produce and only forward a
//! constant order equal to their baseline input requirement.

use crate::models::balance_sheet::BalanceSheet;
use crate::models::{FirmId, SectorId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firm {
    id: FirmId,
    sector: SectorId,
    location: u32,
    community: u32,

    /// Baseline production capacity `Pini` (0 for inactive firms)
    initial_production: f64,

    /// Realized production `Pact` of the last simulated day
    production: f64,

    /// Final consumption demand `C` (0 for inactive firms)
    consumption: f64,

    /// Realized demand (sales actually delivered) of the last simulated day
    ///
    /// Customers scale their next orders by `realized_demand / Pini`.
    realized_demand: f64,

    /// Capacity loss Δ ∈ [0, 1]
    damage: f64,

    /// Daily decay rate of Δ once recovery has started
    recovery_rate: f64,

    /// Share of each unit sold that ends up as deposit
    profit_to_sales: f64,

    active: bool,

    /// Replenishment horizon `n` (days of input held as inventory)
    replenishment_days: u32,

    balance_sheet: BalanceSheet,

    /// Consecutive refusals by the lending policy
    loan_rejections: u32,

    /// Amount paid to suppliers on the current day
    expenses: f64,

    /// Loan instalments paid on the current day
    amortization_paid: f64,
}

impl Firm {
    /// Create an active producer
    ///
    /// # Example
    /// ```
    /// use disaster_simulator_core_rs::models::{BalanceSheet, Firm};
    ///
    /// let firm = Firm::active(7, 3111, 35, 2, 100.0, 60.0, 0.1, BalanceSheet::default());
    /// assert!(firm.is_active());
    /// assert_eq!(firm.production(), 100.0);
    /// assert_eq!(firm.realized_demand(), 100.0);
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn active(
        id: FirmId,
        sector: SectorId,
        location: u32,
        community: u32,
        initial_production: f64,
        consumption: f64,
        profit_to_sales: f64,
        balance_sheet: BalanceSheet,
    ) -> Self {
        Self {
            id,
            sector,
            location,
            community,
            initial_production,
            production: initial_production,
            consumption,
            realized_demand: initial_production,
            damage: 0.0,
            recovery_rate: 0.0,
            profit_to_sales,
            active: true,
            replenishment_days: 1,
            balance_sheet,
            loan_rejections: 0,
            expenses: 0.0,
            amortization_paid: 0.0,
        }
    }

    /// Create an inactive firm (no capacity, no final consumption)
    pub fn inactive(
        id: FirmId,
        sector: SectorId,
        location: u32,
        community: u32,
        balance_sheet: BalanceSheet,
    ) -> Self {
        Self {
            active: false,
            production: 0.0,
            realized_demand: 0.0,
            ..Self::active(id, sector, location, community, 0.0, 0.0, 0.0, balance_sheet)
        }
    }

    pub fn with_replenishment_days(mut self, days: u32) -> Self {
        self.replenishment_days = days;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> FirmId {
        self.id
    }

    pub fn sector(&self) -> SectorId {
        self.sector
    }

    pub fn location(&self) -> u32 {
        self.location
    }

    pub fn community(&self) -> u32 {
        self.community
    }

    pub fn initial_production(&self) -> f64 {
        self.initial_production
    }

    pub fn production(&self) -> f64 {
        self.production
    }

    pub fn consumption(&self) -> f64 {
        self.consumption
    }

    pub fn realized_demand(&self) -> f64 {
        self.realized_demand
    }

    pub fn damage(&self) -> f64 {
        self.damage
    }

    pub fn recovery_rate(&self) -> f64 {
        self.recovery_rate
    }

    pub fn profit_to_sales(&self) -> f64 {
        self.profit_to_sales
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn replenishment_days(&self) -> u32 {
        self.replenishment_days
    }

    pub fn balance_sheet(&self) -> &BalanceSheet {
        &self.balance_sheet
    }

    pub fn balance_sheet_mut(&mut self) -> &mut BalanceSheet {
        &mut self.balance_sheet
    }

    pub fn deposit(&self) -> f64 {
        self.balance_sheet.deposit
    }

    pub fn loan_rejections(&self) -> u32 {
        self.loan_rejections
    }

    pub fn expenses(&self) -> f64 {
        self.expenses
    }

    pub fn amortization_paid(&self) -> f64 {
        self.amortization_paid
    }

    /// Ratio of last realized demand to baseline capacity (0 for inactive firms)
    pub fn utilization(&self) -> f64 {
        if self.initial_production > 0.0 {
            self.realized_demand / self.initial_production
        } else {
            0.0
        }
    }

    /// Production shortfall `1 − Pact/Pini`, used to price short-term credit
    pub fn shortfall(&self) -> f64 {
        if self.initial_production > 0.0 {
            1.0 - self.production / self.initial_production
        } else {
            0.0
        }
    }

    /// Output lost to the current damage, `Pini × Δ`
    pub fn production_loss(&self) -> f64 {
        self.initial_production * self.damage
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    pub fn set_production(&mut self, production: f64) {
        self.production = production.max(0.0);
    }

    pub fn set_realized_demand(&mut self, realized_demand: f64) {
        self.realized_demand = realized_demand.max(0.0);
    }

    pub fn apply_damage(&mut self, magnitude: f64) {
        self.damage = magnitude.clamp(0.0, 1.0);
    }

    /// One day of recovery: `Δ ← (1 − r)·Δ`
    pub fn decay_damage(&mut self) {
        if self.damage != 0.0 {
            self.damage *= 1.0 - self.recovery_rate;
        }
    }

    pub fn set_recovery_rate(&mut self, rate: f64) {
        self.recovery_rate = rate;
    }

    /// Credit the sales margin on `quantity` to the deposit
    pub fn credit_margin(&mut self, quantity: f64) {
        self.balance_sheet.deposit += self.profit_to_sales * quantity;
    }

    /// Reverse the sales margin on `quantity` returned by customers
    pub fn reverse_margin(&mut self, quantity: f64) {
        self.balance_sheet.deposit -= self.profit_to_sales * quantity;
    }

    /// Loan proceeds raise deposit and loans by the same amount
    pub fn receive_loan(&mut self, principal: f64) {
        self.balance_sheet.deposit += principal;
        self.balance_sheet.loans += principal;
    }

    /// Direct transfer that is not a liability (government support)
    pub fn receive_transfer(&mut self, amount: f64) {
        self.balance_sheet.deposit += amount;
    }

    pub fn record_rejection(&mut self) {
        self.loan_rejections += 1;
    }

    pub fn reset_rejections(&mut self) {
        self.loan_rejections = 0;
    }

    pub fn record_expense(&mut self, amount: f64) {
        self.expenses += amount;
    }

    /// Settle the day's instalments against the balance sheet
    pub fn record_amortization(&mut self, instalments: f64, principal_repaid: f64) {
        self.amortization_paid = instalments;
        self.balance_sheet.deposit -= instalments;
        self.balance_sheet.loans = (self.balance_sheet.loans - principal_repaid).max(0.0);
        self.balance_sheet.recompute_equity();
    }

    /// Clear per-day flow accumulators
    pub fn reset_daily_flows(&mut self) {
        self.expenses = 0.0;
        self.amortization_paid = 0.0;
    }
}
