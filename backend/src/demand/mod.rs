//! Demand Propagation
//!
//! Phase 1 of a simulated day. Every firm turns yesterday's realized demand
//! into desired orders to each of its suppliers:
//!
//! ```text
//! q_sc   = A_sc × realized_demand_c / Pini_c
//! need   = n_c × q_sc
//! order  = q_sc                              if need ≤ stock_cs (within tolerance)
//!        = q_sc + (need − stock_cs) / tau    otherwise
//! ```
//!
//! Inactive firms keep ordering their baseline requirement `A_sc`.
//! Each supplier's received demand is its final consumption `C` plus every
//! order addressed to it.

use crate::models::{FirmId, SimulationState};

/// Absolute tolerance for the inventory target comparison
pub const DEMAND_TOLERANCE: f64 = 1e-10;

/// Desired order of one customer to one supplier
///
/// `baseline_weight` is `A_sc`, `utilization` is `realized_demand / Pini` of
/// the customer, `days` its replenishment horizon and `stock` its current
/// inventory of the supplier's good.
pub fn desired_order(baseline_weight: f64, utilization: f64, days: u32, stock: f64, tau: u32) -> f64 {
    let quantity = baseline_weight * utilization;
    let need = f64::from(days) * quantity;

    let order = if (need - stock).abs() < DEMAND_TOLERANCE || need < stock {
        quantity
    } else {
        quantity + (need - stock) / f64::from(tau.max(1))
    };
    order.max(0.0)
}

/// Fill the order book with today's desired orders
///
/// Clears every per-day accumulator first.
pub fn propagate_demand(state: &mut SimulationState, tau: u32) {
    state.orders.clear();

    for firm in state.firms.values() {
        state.orders.open_demand(firm.id(), firm.consumption());
    }

    let customers: Vec<FirmId> = state.firms.keys().copied().collect();
    for customer in customers {
        let Some(firm) = state.firms.get(&customer) else {
            continue;
        };
        let active = firm.is_active();
        let utilization = firm.utilization();
        let days = firm.replenishment_days();

        for (supplier, attrs) in state.links.suppliers_of(customer) {
            let order = if active {
                let stock = state.inventory.quantity(customer, supplier);
                desired_order(attrs.weight, utilization, days, stock, tau)
            } else {
                attrs.weight
            };
            state.orders.place_order(supplier, customer, order);
        }
    }
}
