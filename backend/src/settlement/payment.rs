//! Payment of the day's deliveries
//!
//! A customer owes its suppliers the gross value of what it received today.
//! If its deposit covers that amount it pays in full. Otherwise it keeps only
//! what it can afford: every delivery is scaled by the same factor
//! `deposit / gross`, and the rest is handed back. With no cash at all every
//! delivery is handed back.
//!
//! Hand-backs are recorded per (customer, supplier) pair; the suppliers'
//! sales and margins are corrected afterwards in `apply_revenue_reversals`,
//! once every customer has settled.

use crate::models::{Event, EventLog, FirmId, SimulationState};

/// Tolerance when comparing cash with gross orders
pub const PAYMENT_TOLERANCE: f64 = 1e-5;

/// What happened to one customer's payment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettlementOutcome {
    /// Paid everything it received
    Paid { amount: f64 },
    /// Paid part, handed back the rest
    Reduced { paid: f64, returned: f64 },
    /// Paid nothing, handed everything back
    Cancelled { returned: f64 },
}

/// Settle the deliveries received by `customer`
pub fn settle_payment(
    state: &mut SimulationState,
    customer: FirmId,
    day: usize,
    events: &mut EventLog,
) -> SettlementOutcome {
    let gross = state.orders.gross_orders(customer);
    let Some(firm) = state.firms.get_mut(&customer) else {
        return SettlementOutcome::Paid { amount: 0.0 };
    };
    let deposit = firm.deposit();

    if deposit > gross || (deposit - gross).abs() < PAYMENT_TOLERANCE {
        firm.record_expense(gross);
        return SettlementOutcome::Paid { amount: gross };
    }

    if deposit > 0.0 {
        let fraction = (gross - deposit) / gross;
        let returned = state.orders.return_fraction(customer, fraction);
        let paid = gross - returned;
        firm.record_expense(paid);
        events.log(Event::OrdersReduced {
            day,
            firm_id: customer,
            gross_orders: gross,
            returned,
        });
        SettlementOutcome::Reduced { paid, returned }
    } else {
        let returned = state.orders.return_fraction(customer, 1.0);
        if returned > 0.0 {
            events.log(Event::OrdersCancelled {
                day,
                firm_id: customer,
                returned,
            });
        }
        SettlementOutcome::Cancelled { returned }
    }
}

/// Take back the sales and margin of every supplier on the quantities handed back
///
/// Applied in ascending supplier order after every customer has settled.
/// Returns the total quantity reversed.
pub fn apply_revenue_reversals(state: &mut SimulationState) -> f64 {
    let mut total = 0.0;
    for (supplier, quantity) in state.orders.returns_by_supplier() {
        if let Some(firm) = state.firms.get_mut(&supplier) {
            firm.set_realized_demand(firm.realized_demand() - quantity);
            firm.reverse_margin(quantity);
        }
        total += quantity;
    }
    total
}
