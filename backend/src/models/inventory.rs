//! Input inventories
//!
//! Each customer holds a stock of every supplier's good, measured in the
//! supplier's units. The production function reads the stock aggregated by
//! supplier sector and compares it with the baseline requirement of that
//! sector (Leontief constraint).
//!
//! # Critical Invariants
//!
//! 1. Stocks are never negative
//! 2. Sector stocks are always the sum of the per-supplier stocks of that sector

use crate::models::serde_pairs;
use crate::models::{FirmId, SectorId};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Replenishment horizon `n`: days of baseline input a customer keeps in stock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InventoryHorizon {
    /// Same horizon for every firm
    Fixed { days: u32 },
    /// Per-firm horizon drawn from Poisson(mean); zero draws are redrawn
    Poisson { mean: f64 },
}

impl Default for InventoryHorizon {
    fn default() -> Self {
        InventoryHorizon::Fixed { days: 15 }
    }
}

impl InventoryHorizon {
    /// Horizon of the next firm
    pub fn draw(&self, rng: &mut RngManager) -> u32 {
        match *self {
            InventoryHorizon::Fixed { days } => days,
            InventoryHorizon::Poisson { mean } => {
                if mean.is_nan() || mean <= 0.0 {
                    return 1;
                }
                loop {
                    let days = rng.poisson(mean);
                    if days > 0 {
                        return days;
                    }
                }
            }
        }
    }
}

/// Stock held by one customer from one supplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub quantity: f64,
    pub sector: SectorId,
    /// Baseline daily requirement `A_sc` of this input
    pub baseline_weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryTable {
    /// (customer, supplier) → stock
    #[serde(with = "serde_pairs")]
    stock: BTreeMap<(FirmId, FirmId), InventoryEntry>,

    /// (customer, supplier sector) → baseline daily requirement
    #[serde(with = "serde_pairs")]
    baseline_by_sector: BTreeMap<(FirmId, SectorId), f64>,
}

impl InventoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input of `customer` with its opening stock
    pub fn seed(
        &mut self,
        customer: FirmId,
        supplier: FirmId,
        sector: SectorId,
        baseline_weight: f64,
        opening_stock: f64,
    ) {
        self.stock.insert(
            (customer, supplier),
            InventoryEntry {
                quantity: opening_stock.max(0.0),
                sector,
                baseline_weight,
            },
        );
        *self
            .baseline_by_sector
            .entry((customer, sector))
            .or_insert(0.0) += baseline_weight;
    }

    pub fn quantity(&self, customer: FirmId, supplier: FirmId) -> f64 {
        self.stock
            .get(&(customer, supplier))
            .map(|entry| entry.quantity)
            .unwrap_or(0.0)
    }

    /// Stocks of `customer`, ascending by supplier id
    pub fn entries_of(&self, customer: FirmId) -> impl Iterator<Item = (FirmId, &InventoryEntry)> {
        self.stock
            .range((customer, FirmId::MIN)..=(customer, FirmId::MAX))
            .map(|((_, supplier), entry)| (*supplier, entry))
    }

    /// True when `customer` tracks at least one input
    pub fn has_inventory(&self, customer: FirmId) -> bool {
        self.entries_of(customer).next().is_some()
    }

    /// Stock of `customer` aggregated by supplier sector
    pub fn sector_stocks(&self, customer: FirmId) -> BTreeMap<SectorId, f64> {
        let mut sectors = BTreeMap::new();
        for (_, entry) in self.entries_of(customer) {
            *sectors.entry(entry.sector).or_insert(0.0) += entry.quantity;
        }
        sectors
    }

    /// Baseline daily requirement of `customer` per supplier sector
    pub fn sector_requirements(&self, customer: FirmId) -> impl Iterator<Item = (SectorId, f64)> + '_ {
        self.baseline_by_sector
            .range((customer, SectorId::MIN)..=(customer, SectorId::MAX))
            .map(|((_, sector), weight)| (*sector, *weight))
    }

    /// Add the day's deliveries, then consume `usage_ratio × A` of every sourced sector
    ///
    /// Usage is charged against the sector pool. Each supplier's stock covers
    /// its own share `usage_ratio × A_sc` first; whatever it cannot cover is
    /// drawn from the other suppliers of the same sector in ascending id
    /// order. Returns the quantity actually removed, so per sector
    /// `before + delivered − used == after` and no stock goes negative.
    pub fn roll_forward<F>(&mut self, customer: FirmId, usage_ratio: f64, delivered: F) -> f64
    where
        F: Fn(FirmId) -> f64,
    {
        let inputs = (customer, FirmId::MIN)..=(customer, FirmId::MAX);
        let mut shortfall: BTreeMap<SectorId, f64> = BTreeMap::new();
        let mut used_total = 0.0;

        for ((_, supplier), entry) in self.stock.range_mut(inputs.clone()) {
            entry.quantity += delivered(*supplier).max(0.0);
            let share = (entry.baseline_weight * usage_ratio).max(0.0);
            let taken = share.min(entry.quantity);
            entry.quantity -= taken;
            used_total += taken;
            if share > taken {
                *shortfall.entry(entry.sector).or_insert(0.0) += share - taken;
            }
        }

        if !shortfall.is_empty() {
            for (_, entry) in self.stock.range_mut(inputs) {
                let Some(missing) = shortfall.get_mut(&entry.sector) else {
                    continue;
                };
                let taken = missing.min(entry.quantity);
                entry.quantity -= taken;
                *missing -= taken;
                used_total += taken;
            }
        }

        used_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> InventoryTable {
        let mut table = InventoryTable::new();
        table.seed(10, 1, 100, 2.0, 30.0);
        table.seed(10, 2, 100, 3.0, 45.0);
        table.seed(10, 3, 200, 5.0, 75.0);
        table.seed(11, 1, 100, 1.0, 15.0);
        table
    }

    #[test]
    fn test_sector_aggregation() {
        let table = table();
        let stocks = table.sector_stocks(10);
        assert_eq!(stocks.get(&100), Some(&75.0));
        assert_eq!(stocks.get(&200), Some(&75.0));

        let requirements: Vec<(SectorId, f64)> = table.sector_requirements(10).collect();
        assert_eq!(requirements, vec![(100, 5.0), (200, 5.0)]);
    }

    #[test]
    fn test_roll_forward_uses_and_replenishes() {
        let mut table = table();
        let used = table.roll_forward(10, 0.5, |supplier| if supplier == 1 { 4.0 } else { 0.0 });

        assert!((used - 5.0).abs() < 1e-12);
        assert!((table.quantity(10, 1) - 33.0).abs() < 1e-12);
        assert!((table.quantity(10, 2) - 43.5).abs() < 1e-12);
        assert_eq!(table.quantity(11, 1), 15.0);
    }

    #[test]
    fn test_empty_supplier_draws_on_sector_sibling() {
        let mut table = InventoryTable::new();
        table.seed(10, 1, 1, 1.0, 0.0);
        table.seed(10, 2, 1, 1.0, 10.0);

        let before = table.sector_stocks(10)[&1];
        let used = table.roll_forward(10, 1.0, |_| 0.0);
        let after = table.sector_stocks(10)[&1];

        assert_eq!(used, 2.0);
        assert_eq!(before - used, after);
        assert_eq!(table.quantity(10, 1), 0.0);
        assert_eq!(table.quantity(10, 2), 8.0);
    }

    #[test]
    fn test_sector_balance_with_deliveries() {
        let mut table = table();
        table.seed(10, 4, 100, 1.0, 0.0);
        let before = table.sector_stocks(10);

        // Supplier 4 is empty and only receives 0.5 against a need of 2
        let delivered = |supplier: FirmId| if supplier == 4 { 0.5 } else { 1.0 };
        let used = table.roll_forward(10, 2.0, delivered);
        let after = table.sector_stocks(10);

        // Sector 100: suppliers 1, 2, 4 use 4 + 6 + 2; sector 200 uses 10
        assert!((used - 22.0).abs() < 1e-12);
        assert!((after[&100] - (before[&100] + 2.5 - 12.0)).abs() < 1e-12);
        assert!((after[&200] - (before[&200] + 1.0 - 10.0)).abs() < 1e-12);
        assert_eq!(table.quantity(10, 4), 0.0);
        assert!(table.entries_of(10).all(|(_, entry)| entry.quantity >= 0.0));
    }

    #[test]
    fn test_usage_beyond_sector_pool_is_not_invented() {
        let mut table = InventoryTable::new();
        table.seed(10, 1, 1, 5.0, 3.0);

        let used = table.roll_forward(10, 1.0, |_| 0.0);
        assert_eq!(used, 3.0);
        assert_eq!(table.quantity(10, 1), 0.0);
    }

    #[test]
    fn test_poisson_horizon_is_positive() {
        let mut rng = RngManager::new(7);
        let horizon = InventoryHorizon::Poisson { mean: 1.0 };
        for _ in 0..200 {
            assert!(horizon.draw(&mut rng) > 0);
        }
        assert_eq!(InventoryHorizon::default().draw(&mut rng), 15);
    }

    #[test]
    fn test_roll_forward_never_negative() {
        let mut table = InventoryTable::new();
        table.seed(5, 6, 1, 10.0, 3.0);
        table.roll_forward(5, 1.0, |_| 0.0);
        assert_eq!(table.quantity(5, 6), 0.0);
    }
}
