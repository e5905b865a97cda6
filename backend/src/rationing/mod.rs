//! Rationing Engine
//!
//! Allocates a supplier's realized production across the households (final
//! consumption) and its customer firms when production does not match the
//! demand it received.
//!
//! # Algorithm
//!
//! Iterative water-filling with elimination of the weakest constraint:
//!
//! 1. Every claimant gets a ratio: desired order × 1/A for firms (how much of its
//!    baseline entitlement it is asking for), 1 for the household.
//! 2. The minimum ratio `r_min` sets a tentative order `r_min × baseline` for
//!    every remaining claimant.
//! 3. If the tentative orders fit in the remaining production they are
//!    delivered, the minimum claimant leaves, the others' ratios drop by `r_min`
//!    and claimants whose ratio falls to ~0 leave too.
//! 4. Otherwise the remaining production is spread over the remaining
//!    claimants in proportion to their baselines and the loop ends.
//!
//! Before each round, if the remaining production covers every outstanding
//! claim, everything outstanding is delivered at once.
//!
//! Ties on the minimum ratio go to the household first, then to the lowest
//! firm id.
//!
//! # Critical Invariants
//!
//! 1. **Conservation**: deliveries sum to at most the production
//! 2. **Feasibility**: no claimant receives more than it asked for
//! 3. **Fairness**: deliveries of the final round are proportional to baselines

use crate::models::{FirmId, SimulationState};
use std::collections::BTreeMap;

/// Tolerance under which remaining production counts as exhausted
pub const PRODUCTION_EPSILON: f64 = 1e-10;

/// Tolerance for the fast path and for eliminating satisfied claimants
pub const MATCH_TOLERANCE: f64 = 1e-5;

/// A party competing for a supplier's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Claimant {
    /// Final consumption of the supplier's good
    Household,
    Firm(FirmId),
}

/// Demand of one customer firm on the rationed supplier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirmClaim {
    pub customer: FirmId,
    /// Baseline entitlement `A_sc`
    pub baseline_weight: f64,
    /// `1 / A_sc`, 0 for a zero weight
    pub inverse_weight: f64,
    /// Desired order of the day
    pub desired: f64,
}

/// Result of rationing one supplier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocation {
    pub household: f64,
    pub firms: BTreeMap<FirmId, f64>,
}

impl Allocation {
    /// Everything delivered: the supplier's realized demand
    pub fn total(&self) -> f64 {
        self.household + self.firms.values().sum::<f64>()
    }

    pub fn to_firm(&self, customer: FirmId) -> f64 {
        self.firms.get(&customer).copied().unwrap_or(0.0)
    }

    fn add(&mut self, claimant: Claimant, quantity: f64) {
        if quantity <= 0.0 {
            return;
        }
        match claimant {
            Claimant::Household => self.household += quantity,
            Claimant::Firm(id) => *self.firms.entry(id).or_insert(0.0) += quantity,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Claim {
    baseline: f64,
    ratio: f64,
}

impl Claim {
    fn outstanding(&self) -> f64 {
        (self.ratio * self.baseline).max(0.0)
    }
}

/// Water-filling allocation of `production`
///
/// `consumption` is the household claim `C`; firm claims come from the
/// day's desired orders.
///
/// # Example
/// ```
/// use disaster_simulator_core_rs::rationing::{ration, FirmClaim};
///
/// let claim = |customer, desired| FirmClaim {
///     customer,
///     baseline_weight: 10.0,
///     inverse_weight: 0.1,
///     desired,
/// };
/// let allocation = ration(10.0, 0.0, &[claim(1, 20.0), claim(2, 10.0), claim(3, 10.0)]);
///
/// assert!((allocation.total() - 10.0).abs() < 1e-9);
/// assert!((allocation.to_firm(1) - allocation.to_firm(2)).abs() < 1e-9);
/// ```
pub fn ration(production: f64, consumption: f64, claims: &[FirmClaim]) -> Allocation {
    let mut allocation = Allocation::default();

    let mut active: BTreeMap<Claimant, Claim> = BTreeMap::new();
    active.insert(
        Claimant::Household,
        Claim {
            baseline: consumption.max(0.0),
            ratio: 1.0,
        },
    );
    for claim in claims {
        let ratio = claim.desired.max(0.0) * claim.inverse_weight;
        if ratio > MATCH_TOLERANCE {
            active.insert(
                Claimant::Firm(claim.customer),
                Claim {
                    baseline: claim.baseline_weight,
                    ratio,
                },
            );
        }
    }

    let mut remaining = production.max(0.0);
    while remaining > PRODUCTION_EPSILON && !active.is_empty() {
        let outstanding: f64 = active.values().map(Claim::outstanding).sum();
        if remaining >= outstanding - PRODUCTION_EPSILON {
            for (claimant, claim) in &active {
                allocation.add(*claimant, claim.outstanding());
            }
            break;
        }

        // BTreeMap order gives the household-first, lowest-id tie-break
        let mut weakest: Option<(Claimant, f64)> = None;
        for (claimant, claim) in &active {
            if weakest.map_or(true, |(_, ratio)| claim.ratio < ratio) {
                weakest = Some((*claimant, claim.ratio));
            }
        }
        let Some((weakest, r_min)) = weakest else {
            break;
        };

        let tentative: f64 = active.values().map(|claim| r_min * claim.baseline).sum();
        if tentative > remaining {
            let baselines: f64 = active.values().map(|claim| claim.baseline).sum();
            if baselines > 0.0 {
                let scale = remaining / baselines;
                for (claimant, claim) in &active {
                    allocation.add(*claimant, scale * claim.baseline);
                }
            }
            break;
        }

        for (claimant, claim) in &active {
            allocation.add(*claimant, r_min * claim.baseline);
        }
        remaining -= tentative;

        active.remove(&weakest);
        for claim in active.values_mut() {
            claim.ratio -= r_min;
        }
        active.retain(|_, claim| claim.ratio > MATCH_TOLERANCE);
    }

    allocation
}

/// Allocation of a supplier without firm customers
pub fn ration_households(production: f64, consumption: f64) -> Allocation {
    Allocation {
        household: production.min(consumption).max(0.0),
        firms: BTreeMap::new(),
    }
}

/// Trade one supplier's production for the day
///
/// Delivers to every claimant in full when production matches received demand,
/// otherwise rations. Deliveries are committed to the order book, realized
/// demand is stored on the supplier and its sales margin is credited.
/// Returns the supplier's realized demand.
pub fn trade(state: &mut SimulationState, supplier: FirmId) -> f64 {
    let Some(firm) = state.firms.get(&supplier) else {
        return 0.0;
    };
    let production = firm.production();
    let consumption = firm.consumption();
    let received = state.orders.received_demand(supplier);

    let allocation = if (production - received).abs() < MATCH_TOLERANCE {
        Allocation {
            household: consumption,
            firms: state.orders.orders_to(supplier).collect(),
        }
    } else if !state.links.has_customers(supplier) {
        ration_households(production, consumption)
    } else {
        let claims: Vec<FirmClaim> = state
            .orders
            .orders_to(supplier)
            .filter_map(|(customer, desired)| {
                state.links.get(supplier, customer).map(|attrs| FirmClaim {
                    customer,
                    baseline_weight: attrs.weight,
                    inverse_weight: attrs.inverse_weight,
                    desired,
                })
            })
            .collect();
        ration(production, consumption, &claims)
    };

    for (customer, quantity) in &allocation.firms {
        state.orders.deliver(*customer, supplier, *quantity);
    }
    state.orders.serve_household(supplier, allocation.household);

    let realized = allocation.total();
    if let Some(firm) = state.firms.get_mut(&supplier) {
        firm.set_realized_demand(realized);
        firm.credit_margin(realized);
    }
    realized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(customer: FirmId, baseline_weight: f64, desired: f64) -> FirmClaim {
        FirmClaim {
            customer,
            baseline_weight,
            inverse_weight: if baseline_weight > 0.0 {
                1.0 / baseline_weight
            } else {
                0.0
            },
            desired,
        }
    }

    #[test]
    fn test_enough_production_fills_everything() {
        let allocation = ration(100.0, 5.0, &[claim(1, 10.0, 12.0), claim(2, 10.0, 3.0)]);
        assert!((allocation.household - 5.0).abs() < 1e-9);
        assert!((allocation.to_firm(1) - 12.0).abs() < 1e-9);
        assert!((allocation.to_firm(2) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_equal_baselines_get_equal_ratios() {
        let claims = [claim(1, 10.0, 20.0), claim(2, 10.0, 10.0), claim(3, 10.0, 10.0)];
        let allocation = ration(10.0, 0.0, &claims);

        assert!((allocation.total() - 10.0).abs() < 1e-9);
        for id in 1..=3 {
            assert!((allocation.to_firm(id) - 10.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_small_claim_capped_by_its_own_demand() {
        // Firm 1 only wants 10% of its baseline; the rest is shared by 2 and 3
        let claims = [claim(1, 10.0, 1.0), claim(2, 10.0, 10.0), claim(3, 10.0, 10.0)];
        let allocation = ration(9.0, 0.0, &claims);

        assert!((allocation.to_firm(1) - 1.0).abs() < 1e-9);
        assert!((allocation.to_firm(2) - 4.0).abs() < 1e-9);
        assert!((allocation.to_firm(3) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_household_served_before_heavy_claims() {
        // Household ratio is 1, firm asks for twice its baseline
        let allocation = ration(15.0, 5.0, &[claim(1, 10.0, 20.0)]);

        assert!((allocation.household - 5.0).abs() < 1e-9);
        assert!((allocation.to_firm(1) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weight_claim_gets_nothing() {
        let allocation = ration(5.0, 0.0, &[claim(1, 0.0, 4.0), claim(2, 10.0, 10.0)]);
        assert_eq!(allocation.to_firm(1), 0.0);
        assert!((allocation.to_firm(2) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_production_allocates_nothing() {
        let allocation = ration(0.0, 5.0, &[claim(1, 10.0, 10.0)]);
        assert_eq!(allocation.total(), 0.0);
    }

    #[test]
    fn test_households_only_variant() {
        assert_eq!(ration_households(3.0, 5.0).household, 3.0);
        assert_eq!(ration_households(8.0, 5.0).household, 5.0);
    }

    #[test]
    fn test_claimant_order_household_first() {
        assert!(Claimant::Household < Claimant::Firm(0));
        assert!(Claimant::Firm(1) < Claimant::Firm(2));
    }
}
