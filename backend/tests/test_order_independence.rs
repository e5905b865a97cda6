//! Order Independence Tests
//!
//! The daily step must not depend on the order firms are processed in:
//! any permutation of the active firms yields a bit-identical state and
//! metric series.

use disaster_simulator_core_rs::models::{
    BalanceSheet, BankAccountRecord, FirmId, FirmRecord, InventoryHorizon, LinkRecord, NetworkData,
};
use disaster_simulator_core_rs::orchestrator::{
    DisasterConfig, LendingPolicyConfig, Orchestrator, SimulationConfig, SimulationError,
};
use disaster_simulator_core_rs::RngManager;
use proptest::prelude::*;
use std::collections::BTreeSet;

// ============================================================================
// Test Helpers
// ============================================================================

const FIRMS: u32 = 12;

/// Random production network; every sixth firm is inactive
fn network(seed: u64) -> NetworkData {
    let mut rng = RngManager::new(seed);
    let mut data = NetworkData::default();

    for id in 1..=FIRMS {
        let active = id % 6 != 0;
        let pini = 50.0 + rng.index(100) as f64;
        let consumption = 0.3 * pini + rng.index(10) as f64;
        data.firms.push(FirmRecord {
            id,
            sector: id % 4,
            location: id % 3,
            community: 0,
            consumption: active.then_some(consumption),
            initial_production: active.then_some(pini),
            profit_to_sales: 0.02 + 0.01 * rng.index(4) as f64,
            balance_sheet: BalanceSheet::new(0.0, 20.0, 0.0, 5.0),
        });
    }

    for customer in 1..=FIRMS {
        let wanted = 1 + rng.index(3);
        let mut suppliers = BTreeSet::new();
        while suppliers.len() < wanted {
            let supplier = 1 + rng.index(FIRMS as usize) as FirmId;
            if supplier != customer {
                suppliers.insert(supplier);
            }
        }
        for supplier in suppliers {
            data.links.push(LinkRecord {
                supplier,
                customer,
                weight: 5.0 + rng.index(20) as f64,
            });
        }
    }

    for firm in 1..=FIRMS {
        let first = 1 + rng.index(3) as u32;
        data.bank_accounts.push(BankAccountRecord {
            firm,
            bank: first,
            loan: 0.0,
            deposit: 0.0,
        });
        if rng.index(2) == 0 {
            data.bank_accounts.push(BankAccountRecord {
                firm,
                bank: first % 3 + 1,
                loan: 0.0,
                deposit: 0.0,
            });
        }
    }

    data
}

fn stressed_config(seed: u64, policy: usize) -> SimulationConfig {
    let mut config = SimulationConfig {
        horizon_days: 8,
        rng_seed: seed,
        inventory_horizon: InventoryHorizon::Poisson { mean: 4.0 },
        disaster: DisasterConfig {
            damaged_fraction: 0.3,
            damage_magnitude: 0.6,
            recovery_start_day: 3,
            ..Default::default()
        },
        ..Default::default()
    };
    config.credit.lending_policy = match policy {
        0 => LendingPolicyConfig::default(),
        1 => LendingPolicyConfig::NoRiskPolicy,
        _ => LendingPolicyConfig::PositiveEquity,
    };
    config
}

/// Fisher–Yates driven by the crate's own generator
fn shuffled(ids: &[FirmId], seed: u64) -> Vec<FirmId> {
    let mut rng = RngManager::new(seed);
    let mut order = ids.to_vec();
    for i in (1..order.len()).rev() {
        let j = rng.index(i + 1);
        order.swap(i, j);
    }
    order
}

/// Exact serialized form; also compares NaNs and signed zeros
fn fingerprint(orchestrator: &Orchestrator) -> (String, String) {
    (
        serde_json::to_string(orchestrator.state()).unwrap(),
        serde_json::to_string(orchestrator.series()).unwrap(),
    )
}

// ============================================================================
// Permutations
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_any_order_gives_identical_trial(
        network_seed in 0u64..500,
        trial_seed in 0u64..500,
        policy in 0usize..3,
        day_seeds in prop::collection::vec(any::<u64>(), 8),
    ) {
        let network = network(network_seed);
        let config = stressed_config(trial_seed, policy);

        let mut reference = Orchestrator::new(config.clone(), &network).unwrap();
        reference.run().unwrap();

        let mut permuted = Orchestrator::new(config, &network).unwrap();
        for day_seed in &day_seeds {
            let order = shuffled(&permuted.state().active_firm_ids(), *day_seed);
            permuted.step_in_order(&order).unwrap();
        }

        prop_assert!(permuted.is_finished());
        prop_assert_eq!(fingerprint(&reference), fingerprint(&permuted));
    }
}

#[test]
fn test_reversed_order_matches_on_fixed_network() {
    let network = network(3);
    let config = stressed_config(11, 1);

    let mut reference = Orchestrator::new(config.clone(), &network).unwrap();
    let mut reversed = Orchestrator::new(config, &network).unwrap();
    while !reference.is_finished() {
        let mut order = reversed.state().active_firm_ids();
        order.reverse();

        let expected = reference.step().unwrap();
        let actual = reversed.step_in_order(&order).unwrap();
        assert_eq!(expected.day, actual.day);
        assert_eq!(expected.gdp.to_bits(), actual.gdp.to_bits());
        assert_eq!(expected.loans.to_bits(), actual.loans.to_bits());
    }
    assert_eq!(fingerprint(&reference), fingerprint(&reversed));
}

// ============================================================================
// Invalid orders
// ============================================================================

#[test]
fn test_duplicate_firm_rejected() {
    let mut orchestrator = Orchestrator::new(stressed_config(1, 0), &network(1)).unwrap();
    let mut order = orchestrator.state().active_firm_ids();
    order[1] = order[0];

    let result = orchestrator.step_in_order(&order);
    assert!(matches!(result, Err(SimulationError::InvalidOrdering(_))));
    assert_eq!(orchestrator.current_day(), 0);
}

#[test]
fn test_unknown_firm_rejected() {
    let mut orchestrator = Orchestrator::new(stressed_config(1, 0), &network(1)).unwrap();
    let mut order = orchestrator.state().active_firm_ids();
    order[0] = 999;

    let result = orchestrator.step_in_order(&order);
    assert!(matches!(result, Err(SimulationError::UnknownFirm(999))));
}

#[test]
fn test_missing_or_inactive_firm_rejected() {
    let mut orchestrator = Orchestrator::new(stressed_config(1, 0), &network(1)).unwrap();
    let active = orchestrator.state().active_firm_ids();

    let missing = &active[1..];
    assert!(matches!(
        orchestrator.step_in_order(missing),
        Err(SimulationError::InvalidOrdering(_))
    ));

    // Firm 6 exists but is inactive
    let mut with_inactive = active.clone();
    with_inactive.push(6);
    assert!(matches!(
        orchestrator.step_in_order(&with_inactive),
        Err(SimulationError::InvalidOrdering(_))
    ));
    assert!(orchestrator.series().is_empty());
}

#[test]
fn test_step_past_horizon_fails() {
    let mut orchestrator = Orchestrator::new(stressed_config(2, 0), &network(2)).unwrap();
    orchestrator.run().unwrap();

    let order = orchestrator.state().active_firm_ids();
    assert!(matches!(
        orchestrator.step_in_order(&order),
        Err(SimulationError::HorizonReached(8))
    ));
}
