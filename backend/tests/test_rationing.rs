//! Rationing Tests
//!
//! Critical invariants tested:
//! - Conservation: deliveries never exceed production
//! - Feasibility: no claimant gets more than it asked for
//! - Water-filling: claimants left short all end at the same fulfilled ratio,
//!   and nobody else is above it

use disaster_simulator_core_rs::rationing::{ration, FirmClaim, MATCH_TOLERANCE};
use proptest::prelude::*;

fn claim(customer: u32, baseline_weight: f64, desired: f64) -> FirmClaim {
    FirmClaim {
        customer,
        baseline_weight,
        inverse_weight: 1.0 / baseline_weight,
        desired,
    }
}

// ============================================================================
// Fixed cases
// ============================================================================

#[test]
fn test_three_equal_customers_demand_forty() {
    // Baselines 10/10/10, demand 20 + 10 + 10 = 40, production 10
    let claims = [claim(1, 10.0, 20.0), claim(2, 10.0, 10.0), claim(3, 10.0, 10.0)];
    let allocation = ration(10.0, 0.0, &claims);

    assert!((allocation.total() - 10.0).abs() < 1e-9);
    let ratios: Vec<f64> = (1..=3).map(|c| allocation.to_firm(c) / 10.0).collect();
    assert!((ratios[0] - ratios[1]).abs() < 1e-9);
    assert!((ratios[1] - ratios[2]).abs() < 1e-9);
}

#[test]
fn test_small_demand_caps_its_own_share() {
    // Customer 3 only wants 1; the other two split the remaining 9
    let claims = [claim(1, 10.0, 20.0), claim(2, 10.0, 10.0), claim(3, 10.0, 1.0)];
    let allocation = ration(10.0, 0.0, &claims);

    assert!((allocation.to_firm(3) - 1.0).abs() < 1e-9);
    assert!((allocation.to_firm(1) - 4.5).abs() < 1e-9);
    assert!((allocation.to_firm(2) - 4.5).abs() < 1e-9);
}

#[test]
fn test_unequal_baselines_share_in_proportion() {
    let claims = [claim(1, 30.0, 30.0), claim(2, 10.0, 10.0)];
    let allocation = ration(20.0, 0.0, &claims);

    assert!((allocation.to_firm(1) - 15.0).abs() < 1e-9);
    assert!((allocation.to_firm(2) - 5.0).abs() < 1e-9);
}

#[test]
fn test_household_always_at_full_ratio() {
    // Firm asks for a quarter of its baseline, household for all of C
    let claims = [claim(1, 40.0, 10.0)];
    let allocation = ration(50.0, 60.0, &claims);

    assert!((allocation.to_firm(1) - 10.0).abs() < 1e-9);
    assert!((allocation.household - 40.0).abs() < 1e-9);
}

#[test]
fn test_negligible_claim_is_ignored() {
    let claims = [claim(1, 10.0, MATCH_TOLERANCE), claim(2, 10.0, 20.0)];
    let allocation = ration(5.0, 0.0, &claims);

    assert_eq!(allocation.to_firm(1), 0.0);
    assert!((allocation.to_firm(2) - 5.0).abs() < 1e-9);
}

// ============================================================================
// Properties
// ============================================================================

fn claims_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((0.5f64..20.0, 0.0f64..40.0), 0..6)
}

proptest! {
    #[test]
    fn prop_conservation_and_feasibility(
        production in 0.0f64..200.0,
        consumption in 0.0f64..50.0,
        raw in claims_strategy(),
    ) {
        let claims: Vec<FirmClaim> = raw
            .iter()
            .enumerate()
            .map(|(i, (weight, desired))| claim(i as u32 + 1, *weight, *desired))
            .collect();
        let allocation = ration(production, consumption, &claims);

        prop_assert!(allocation.total() <= production + 1e-9);
        prop_assert!(allocation.household <= consumption + 1e-9);
        prop_assert!(allocation.household >= 0.0);
        for c in &claims {
            let got = allocation.to_firm(c.customer);
            prop_assert!(got >= 0.0);
            prop_assert!(got <= c.desired + 1e-9);
        }

        // Production is used up unless every claim is (nearly) served
        let demand = consumption + claims.iter().map(|c| c.desired).sum::<f64>();
        let slack = 1e-4 * (consumption + claims.iter().map(|c| c.baseline_weight).sum::<f64>()) + 1e-9;
        prop_assert!(allocation.total() >= production.min(demand) - slack);
    }

    #[test]
    fn prop_water_filling(
        production in 0.0f64..200.0,
        consumption in 0.1f64..50.0,
        raw in claims_strategy(),
    ) {
        let claims: Vec<FirmClaim> = raw
            .iter()
            .enumerate()
            .map(|(i, (weight, desired))| claim(i as u32 + 1, *weight, *desired))
            .collect();
        let allocation = ration(production, consumption, &claims);

        // (fulfilled ratio, left short)
        let mut levels = vec![(
            allocation.household / consumption,
            allocation.household < consumption - 1e-4 * consumption - 1e-9,
        )];
        for c in &claims {
            let got = allocation.to_firm(c.customer);
            levels.push((got / c.baseline_weight, got < c.desired - 1e-4 * c.baseline_weight - 1e-9));
        }

        let short: Vec<f64> = levels.iter().filter(|(_, s)| *s).map(|(r, _)| *r).collect();
        if let Some(level) = short.first() {
            let tolerance = 1e-6 * (1.0 + level.abs());
            for other in &short {
                prop_assert!((other - level).abs() <= tolerance);
            }
            for (ratio, _) in &levels {
                prop_assert!(*ratio <= level + tolerance);
            }
        }
    }
}
