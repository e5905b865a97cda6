//! Simulation State
//!
//! Represents the complete state of one trial of the contagion model.
//! Contains the firm registry, the static network, inventories, the credit
//! ledger and the per-day order book.
//!
//! Resetting between trials means building a fresh `SimulationState` from the
//! loader's `NetworkData`; nothing is cleared container by container.
//!
//! # Critical Invariants
//!
//! 1. **Balance Identity**: every firm's equity equals deposit + other assets − loans − other liabilities
//! 2. **Referential Integrity**: every link, inventory entry and account names a registered firm
//! 3. **Non-negativity**: inventories and production are never negative

use crate::models::balance_sheet::BalanceSheet;
use crate::models::firm::Firm;
use crate::models::inventory::{InventoryHorizon, InventoryTable};
use crate::models::ledger::CreditLedger;
use crate::models::network::{LinkAttrs, LinkTable, NetworkData, NetworkError};
use crate::models::orders::OrderBook;
use crate::models::FirmId;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Complete state of one trial
///
/// # Example
///
/// ```rust
/// use disaster_simulator_core_rs::models::{
///     BalanceSheet, FirmRecord, InventoryHorizon, LinkRecord, NetworkData,
/// };
/// use disaster_simulator_core_rs::{RngManager, SimulationState};
///
/// let firm = |id, pini| FirmRecord {
///     id,
///     sector: id,
///     location: 0,
///     community: 0,
///     consumption: Some(1.0),
///     initial_production: Some(pini),
///     profit_to_sales: 0.1,
///     balance_sheet: BalanceSheet::default(),
/// };
/// let network = NetworkData {
///     firms: vec![firm(1, 10.0), firm(2, 20.0)],
///     links: vec![LinkRecord { supplier: 1, customer: 2, weight: 8.0 }],
///     ..Default::default()
/// };
///
/// let mut rng = RngManager::new(1);
/// let state = SimulationState::from_network(&network, InventoryHorizon::Fixed { days: 15 }, &mut rng).unwrap();
/// assert_eq!(state.num_firms(), 2);
/// assert_eq!(state.inventory().quantity(2, 1), 120.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// All firms, indexed by ID
    pub(crate) firms: BTreeMap<FirmId, Firm>,

    /// Static supplier→customer relation
    pub(crate) links: LinkTable,

    pub(crate) inventory: InventoryTable,

    pub(crate) ledger: CreditLedger,

    /// Accumulators of the day being simulated
    pub(crate) orders: OrderBook,

    /// Firms hit by the disaster
    pub(crate) damaged: BTreeSet<FirmId>,

    /// Cumulative direct transfers granted under the firm-support policy
    pub(crate) government_support: f64,

    /// Opaque loader statistics, carried through for reporting
    pub(crate) cluster_statistics: BTreeMap<FirmId, Vec<f64>>,
}

impl SimulationState {
    /// Build the initial state of a trial
    ///
    /// - each customer holds `n_c × A_sc` of every input
    /// - each firm with inputs starts with a deposit equal to its total baseline input
    /// - replenishment horizons are drawn in ascending firm id order
    pub fn from_network(
        network: &NetworkData,
        horizon: InventoryHorizon,
        rng: &mut RngManager,
    ) -> Result<Self, NetworkError> {
        network.validate()?;

        let mut records: Vec<_> = network.firms.iter().collect();
        records.sort_by_key(|record| record.id);

        let mut firms = BTreeMap::new();
        for record in records {
            let days = horizon.draw(rng);
            let firm = match (record.initial_production, record.consumption) {
                (Some(pini), Some(consumption)) => Firm::active(
                    record.id,
                    record.sector,
                    record.location,
                    record.community,
                    pini,
                    consumption,
                    record.profit_to_sales,
                    record.balance_sheet,
                ),
                _ => Firm::inactive(
                    record.id,
                    record.sector,
                    record.location,
                    record.community,
                    record.balance_sheet,
                ),
            };
            firms.insert(record.id, firm.with_replenishment_days(days));
        }

        let mut links = LinkTable::new();
        let mut inventory = InventoryTable::new();
        for link in &network.links {
            let (Some(supplier), Some(customer)) =
                (firms.get(&link.supplier), firms.get(&link.customer))
            else {
                continue;
            };
            if link.weight == 0.0 {
                tracing::warn!(
                    supplier = link.supplier,
                    customer = link.customer,
                    "zero baseline weight; link never rations"
                );
            }
            let attrs = LinkAttrs::new(link.weight, supplier.sector(), customer.sector());
            let opening = f64::from(customer.replenishment_days()) * link.weight;
            inventory.seed(
                link.customer,
                link.supplier,
                supplier.sector(),
                link.weight,
                opening,
            );
            links.insert(link.supplier, link.customer, attrs);
        }

        for (id, firm) in firms.iter_mut() {
            let total_input = links.total_input(*id);
            let sheet = firm.balance_sheet_mut();
            if total_input > 0.0 {
                sheet.deposit = total_input;
            }
            sheet.recompute_equity();
        }

        let mut ledger = CreditLedger::new();
        for account in &network.bank_accounts {
            ledger.open_account(account.firm, account.bank, account.loan, account.deposit);
        }

        Ok(Self {
            firms,
            links,
            inventory,
            ledger,
            orders: OrderBook::new(),
            damaged: BTreeSet::new(),
            government_support: 0.0,
            cluster_statistics: network.cluster_statistics.clone(),
        })
    }

    // ========================================================================
    // Firms
    // ========================================================================

    pub fn firm(&self, id: FirmId) -> Option<&Firm> {
        self.firms.get(&id)
    }

    pub fn firm_mut(&mut self, id: FirmId) -> Option<&mut Firm> {
        self.firms.get_mut(&id)
    }

    /// All firms, ascending by id
    pub fn firms(&self) -> impl Iterator<Item = &Firm> {
        self.firms.values()
    }

    pub fn num_firms(&self) -> usize {
        self.firms.len()
    }

    /// IDs of active firms, ascending
    pub fn active_firm_ids(&self) -> Vec<FirmId> {
        self.firms
            .values()
            .filter(|firm| firm.is_active())
            .map(|firm| firm.id())
            .collect()
    }

    // ========================================================================
    // Tables
    // ========================================================================

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub fn inventory(&self) -> &InventoryTable {
        &self.inventory
    }

    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut CreditLedger {
        &mut self.ledger
    }

    pub fn orders(&self) -> &OrderBook {
        &self.orders
    }

    pub fn cluster_statistics(&self) -> &BTreeMap<FirmId, Vec<f64>> {
        &self.cluster_statistics
    }

    // ========================================================================
    // Disaster bookkeeping
    // ========================================================================

    pub fn damaged_firms(&self) -> &BTreeSet<FirmId> {
        &self.damaged
    }

    pub fn is_damaged(&self, id: FirmId) -> bool {
        self.damaged.contains(&id)
    }

    pub fn government_support(&self) -> f64 {
        self.government_support
    }

    // ========================================================================
    // Invariant checks
    // ========================================================================

    /// Firms whose balance sheet violates the identity
    pub fn identity_violations(&self) -> Vec<FirmId> {
        self.firms
            .values()
            .filter(|firm| !firm.balance_sheet().holds_identity())
            .map(|firm| firm.id())
            .collect()
    }

    /// Sum of a balance sheet position over all firms, in id order
    pub fn total_of<F>(&self, position: F) -> f64
    where
        F: Fn(&BalanceSheet) -> f64,
    {
        self.firms
            .values()
            .map(|firm| position(firm.balance_sheet()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::network::{BankAccountRecord, FirmRecord, LinkRecord};

    fn record(id: FirmId, active: bool) -> FirmRecord {
        FirmRecord {
            id,
            sector: id * 10,
            location: 0,
            community: 0,
            consumption: active.then_some(5.0),
            initial_production: active.then_some(50.0),
            profit_to_sales: 0.1,
            balance_sheet: BalanceSheet::new(1.0, 10.0, 4.0, 2.0),
        }
    }

    fn network() -> NetworkData {
        NetworkData {
            firms: vec![record(3, true), record(1, true), record(2, false)],
            links: vec![
                LinkRecord { supplier: 1, customer: 3, weight: 4.0 },
                LinkRecord { supplier: 2, customer: 3, weight: 6.0 },
                LinkRecord { supplier: 3, customer: 1, weight: 2.0 },
            ],
            bank_accounts: vec![BankAccountRecord {
                firm: 3,
                bank: 100,
                loan: 4.0,
                deposit: 1.0,
            }],
            cluster_statistics: BTreeMap::new(),
        }
    }

    #[test]
    fn test_initial_inventory_and_deposit() {
        let mut rng = RngManager::new(1);
        let state =
            SimulationState::from_network(&network(), InventoryHorizon::Fixed { days: 15 }, &mut rng)
                .unwrap();

        assert_eq!(state.inventory().quantity(3, 1), 60.0);
        assert_eq!(state.inventory().quantity(3, 2), 90.0);
        assert_eq!(state.inventory().sector_stocks(3).get(&10), Some(&60.0));

        let customer = state.firm(3).unwrap();
        assert_eq!(customer.deposit(), 10.0);
        assert_eq!(customer.balance_sheet().equity, 14.0);

        let inactive = state.firm(2).unwrap();
        assert_eq!(inactive.deposit(), 1.0);
        assert!(state.identity_violations().is_empty());
    }

    #[test]
    fn test_active_ids_sorted() {
        let mut rng = RngManager::new(1);
        let state =
            SimulationState::from_network(&network(), InventoryHorizon::default(), &mut rng).unwrap();
        assert_eq!(state.active_firm_ids(), vec![1, 3]);
        assert_eq!(state.ledger().banks_of(3), vec![100]);
    }

    #[test]
    fn test_invalid_network_rejected() {
        let mut data = network();
        data.firms.push(record(1, true));
        let mut rng = RngManager::new(1);
        assert_eq!(
            SimulationState::from_network(&data, InventoryHorizon::default(), &mut rng),
            Err(NetworkError::DuplicateFirm(1))
        );
    }
}
