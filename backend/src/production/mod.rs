//! Production Function
//!
//! Realized production of one firm for one day is the tightest of three caps:
//!
//! 1. **Damage cap**: `(1 − Δ) × Pini`. From the recovery start day onward Δ
//!    first decays as `Δ ← (1 − r) × Δ`.
//! 2. **Inventory cap**: `min over sourced sectors of Pini × stock_sector / A_sector`
//!    (Leontief). A firm without tracked inventory is capped at `Pini`.
//! 3. **Demand**: the total demand the firm received today.

use crate::models::{FirmId, InventoryTable, SimulationState};

/// Inventory-implied output ceiling of `firm`
pub fn inventory_cap(inventory: &InventoryTable, firm: FirmId, initial_production: f64) -> f64 {
    if !inventory.has_inventory(firm) {
        return initial_production;
    }
    let stocks = inventory.sector_stocks(firm);
    let mut cap: Option<f64> = None;
    for (sector, requirement) in inventory.sector_requirements(firm) {
        if requirement <= 0.0 {
            continue;
        }
        let stock = stocks.get(&sector).copied().unwrap_or(0.0);
        let feasible = initial_production * stock / requirement;
        cap = Some(cap.map_or(feasible, |current| current.min(feasible)));
    }
    cap.unwrap_or(initial_production)
}

/// Compute and store today's production of `firm`
///
/// Returns the realized production. Damage decays before the cap is taken
/// when `recovery_active` is set and the firm belongs to the damaged cohort.
pub fn produce(state: &mut SimulationState, firm: FirmId, recovery_active: bool) -> f64 {
    let damaged = state.damaged.contains(&firm);
    let received = state.orders.received_demand(firm);

    let Some(record) = state.firms.get_mut(&firm) else {
        return 0.0;
    };
    if !record.is_active() {
        record.set_production(0.0);
        return 0.0;
    }

    let pini = record.initial_production();
    let damage_cap = if damaged {
        if recovery_active {
            record.decay_damage();
        }
        (1.0 - record.damage()) * pini
    } else {
        pini
    };

    let stock_cap = inventory_cap(&state.inventory, firm, pini);
    let production = damage_cap.min(stock_cap).min(received).max(0.0);
    record.set_production(production);
    production
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_cap_takes_scarcest_sector() {
        let mut inventory = InventoryTable::new();
        inventory.seed(1, 10, 100, 2.0, 30.0);
        inventory.seed(1, 11, 100, 2.0, 10.0);
        inventory.seed(1, 12, 200, 4.0, 20.0);

        // sector 100: 40 / 4 = 10 days, sector 200: 20 / 4 = 5 days
        assert!((inventory_cap(&inventory, 1, 50.0) - 250.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_inventory_means_full_capacity() {
        let inventory = InventoryTable::new();
        assert_eq!(inventory_cap(&inventory, 1, 50.0), 50.0);
    }

    #[test]
    fn test_empty_stock_blocks_production() {
        let mut inventory = InventoryTable::new();
        inventory.seed(1, 10, 100, 2.0, 0.0);
        assert_eq!(inventory_cap(&inventory, 1, 50.0), 0.0);
    }
}
