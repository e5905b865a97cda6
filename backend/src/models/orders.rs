//! Per-day order book
//!
//! Holds every accumulator that lives for exactly one simulated day:
//! - desired orders (demand propagation output), keyed (supplier, customer)
//! - received demand per supplier (`C` plus all desired orders)
//! - realized deliveries (rationing output), keyed (customer, supplier), and
//!   the running total each supplier shipped to firms
//! - final consumption actually served per supplier
//! - quantities returned by customers that could not pay, keyed (customer, supplier)
//! - government support granted per firm
//!
//! Each pair key is written by exactly one firm's call within a phase:
//! suppliers write their deliveries during trading, customers write their
//! own rows during settlement. Totals are always summed in key order, which
//! makes the day's results independent of firm processing order.

use crate::models::serde_pairs;
use crate::models::FirmId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(with = "serde_pairs")]
    desired: BTreeMap<(FirmId, FirmId), f64>,

    desired_total: BTreeMap<FirmId, f64>,

    received_demand: BTreeMap<FirmId, f64>,

    #[serde(with = "serde_pairs")]
    realized: BTreeMap<(FirmId, FirmId), f64>,

    /// supplier → quantity shipped to firms while trading
    #[serde(default)]
    shipped: BTreeMap<FirmId, f64>,

    household: BTreeMap<FirmId, f64>,

    #[serde(with = "serde_pairs")]
    returned: BTreeMap<(FirmId, FirmId), f64>,

    support: BTreeMap<FirmId, f64>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every accumulator (start of a new day)
    pub fn clear(&mut self) {
        self.desired.clear();
        self.desired_total.clear();
        self.received_demand.clear();
        self.realized.clear();
        self.shipped.clear();
        self.household.clear();
        self.returned.clear();
        self.support.clear();
    }

    // ========================================================================
    // Demand propagation
    // ========================================================================

    /// Seed a supplier's received demand with its final consumption
    pub fn open_demand(&mut self, supplier: FirmId, consumption: f64) {
        self.received_demand.insert(supplier, consumption);
    }

    /// Record the desired order of `customer` to `supplier`
    pub fn place_order(&mut self, supplier: FirmId, customer: FirmId, quantity: f64) {
        let quantity = quantity.max(0.0);
        self.desired.insert((supplier, customer), quantity);
        *self.desired_total.entry(customer).or_insert(0.0) += quantity;
        *self.received_demand.entry(supplier).or_insert(0.0) += quantity;
    }

    pub fn desired(&self, supplier: FirmId, customer: FirmId) -> f64 {
        self.desired.get(&(supplier, customer)).copied().unwrap_or(0.0)
    }

    /// Desired orders addressed to `supplier`, ascending by customer
    pub fn orders_to(&self, supplier: FirmId) -> impl Iterator<Item = (FirmId, f64)> + '_ {
        self.desired
            .range((supplier, FirmId::MIN)..=(supplier, FirmId::MAX))
            .map(|((_, customer), quantity)| (*customer, *quantity))
    }

    /// Total desired orders placed by `customer`
    pub fn desired_total(&self, customer: FirmId) -> f64 {
        self.desired_total.get(&customer).copied().unwrap_or(0.0)
    }

    /// Total demand received by `supplier` (consumption plus orders)
    pub fn received_demand(&self, supplier: FirmId) -> f64 {
        self.received_demand.get(&supplier).copied().unwrap_or(0.0)
    }

    // ========================================================================
    // Deliveries
    // ========================================================================

    /// Add a delivery from `supplier` to `customer`; non-positive amounts are ignored
    pub fn deliver(&mut self, customer: FirmId, supplier: FirmId, quantity: f64) {
        if quantity > 0.0 {
            *self.realized.entry((customer, supplier)).or_insert(0.0) += quantity;
            *self.shipped.entry(supplier).or_insert(0.0) += quantity;
        }
    }

    pub fn serve_household(&mut self, supplier: FirmId, quantity: f64) {
        if quantity > 0.0 {
            *self.household.entry(supplier).or_insert(0.0) += quantity;
        }
    }

    pub fn delivered(&self, customer: FirmId, supplier: FirmId) -> f64 {
        self.realized.get(&(customer, supplier)).copied().unwrap_or(0.0)
    }

    pub fn household_served(&self, supplier: FirmId) -> f64 {
        self.household.get(&supplier).copied().unwrap_or(0.0)
    }

    /// Deliveries received by `customer`, ascending by supplier
    pub fn deliveries_to(&self, customer: FirmId) -> impl Iterator<Item = (FirmId, f64)> + '_ {
        self.realized
            .range((customer, FirmId::MIN)..=(customer, FirmId::MAX))
            .map(|((_, supplier), quantity)| (*supplier, *quantity))
    }

    /// Gross orders owed by `customer` to its suppliers
    pub fn gross_orders(&self, customer: FirmId) -> f64 {
        self.deliveries_to(customer).map(|(_, quantity)| quantity).sum()
    }

    /// What `supplier` shipped today to firms and households
    ///
    /// Counted when trading; later hand-backs do not reduce it.
    pub fn total_delivered_by(&self, supplier: FirmId) -> f64 {
        self.shipped.get(&supplier).copied().unwrap_or(0.0) + self.household_served(supplier)
    }

    // ========================================================================
    // Payment adjustments
    // ========================================================================

    /// Return `fraction` of every delivery to `customer`
    ///
    /// Returns the total quantity handed back.
    pub fn return_fraction(&mut self, customer: FirmId, fraction: f64) -> f64 {
        let fraction = fraction.clamp(0.0, 1.0);
        let mut total = 0.0;
        for ((_, supplier), quantity) in self
            .realized
            .range_mut((customer, FirmId::MIN)..=(customer, FirmId::MAX))
        {
            let give_back = *quantity * fraction;
            *quantity -= give_back;
            if fraction >= 1.0 {
                *quantity = 0.0;
            }
            *self.returned.entry((customer, *supplier)).or_insert(0.0) += give_back;
            total += give_back;
        }
        total
    }

    /// Quantities returned to each supplier, ascending by supplier
    pub fn returns_by_supplier(&self) -> BTreeMap<FirmId, f64> {
        let mut by_supplier = BTreeMap::new();
        for ((_, supplier), quantity) in &self.returned {
            *by_supplier.entry(*supplier).or_insert(0.0) += *quantity;
        }
        by_supplier
    }

    // ========================================================================
    // Government support
    // ========================================================================

    pub fn record_support(&mut self, firm: FirmId, amount: f64) {
        *self.support.entry(firm).or_insert(0.0) += amount;
    }

    /// Support granted today, summed in firm order
    pub fn support_total(&self) -> f64 {
        self.support.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_order_accumulates_demand() {
        let mut book = OrderBook::new();
        book.open_demand(1, 5.0);
        book.place_order(1, 2, 3.0);
        book.place_order(1, 3, -4.0);
        book.place_order(7, 2, 2.0);

        assert_eq!(book.received_demand(1), 8.0);
        assert_eq!(book.desired(1, 3), 0.0);
        assert_eq!(book.desired_total(2), 5.0);
        let to_one: Vec<(FirmId, f64)> = book.orders_to(1).collect();
        assert_eq!(to_one, vec![(2, 3.0), (3, 0.0)]);
    }

    #[test]
    fn test_return_fraction_records_returns() {
        let mut book = OrderBook::new();
        book.deliver(9, 1, 4.0);
        book.deliver(9, 2, 6.0);
        book.deliver(8, 1, 1.0);

        let returned = book.return_fraction(9, 0.25);
        assert!((returned - 2.5).abs() < 1e-12);
        assert!((book.gross_orders(9) - 7.5).abs() < 1e-12);
        assert_eq!(book.gross_orders(8), 1.0);

        let returns = book.returns_by_supplier();
        assert!((returns[&1] - 1.0).abs() < 1e-12);
        assert!((returns[&2] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_full_return_zeroes_deliveries() {
        let mut book = OrderBook::new();
        book.deliver(9, 1, 4.0);
        book.return_fraction(9, 1.0);
        assert_eq!(book.gross_orders(9), 0.0);
        assert_eq!(book.total_delivered_by(1), 4.0);
    }

    #[test]
    fn test_shipped_totals_per_supplier() {
        let mut book = OrderBook::new();
        book.deliver(9, 1, 4.0);
        book.deliver(8, 1, 1.5);
        book.deliver(9, 2, 6.0);
        book.deliver(7, 1, 0.0);
        book.serve_household(1, 2.0);

        assert_eq!(book.total_delivered_by(1), 7.5);
        assert_eq!(book.total_delivered_by(2), 6.0);
        assert_eq!(book.total_delivered_by(3), 0.0);

        book.clear();
        assert_eq!(book.total_delivered_by(1), 0.0);
    }
}
