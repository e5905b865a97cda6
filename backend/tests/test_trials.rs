//! Monte Carlo Trial Tests
//!
//! - trial `k` runs with seed `rng_seed + k`
//! - the parallel runner returns exactly what sequential runs return
//! - reruns are bit-identical

use disaster_simulator_core_rs::models::{
    BalanceSheet, BankAccountRecord, FirmId, FirmRecord, LinkRecord, NetworkData,
};
use disaster_simulator_core_rs::orchestrator::{
    run_trial, run_trials, DisasterConfig, MonteCarloSummary, Orchestrator, SimulationConfig,
    SimulationError, TrialOutcome,
};
use std::collections::BTreeSet;

// ============================================================================
// Test Helpers
// ============================================================================

/// Two interlocked rings of eight firms, banks 1 and 2
fn network() -> NetworkData {
    let ids: Vec<FirmId> = (1..=16).collect();
    let mut links = Vec::new();
    for id in &ids {
        let ring_start = if *id <= 8 { 1 } else { 9 };
        links.push(LinkRecord {
            supplier: *id,
            customer: ring_start + (id - ring_start + 1) % 8,
            weight: 25.0,
        });
    }
    links.push(LinkRecord { supplier: 4, customer: 12, weight: 5.0 });
    links.push(LinkRecord { supplier: 13, customer: 2, weight: 5.0 });

    NetworkData {
        firms: ids
            .iter()
            .map(|id| FirmRecord {
                id: *id,
                sector: id % 5,
                location: id % 2,
                community: 0,
                consumption: Some(50.0),
                initial_production: Some(80.0),
                profit_to_sales: 0.01,
                balance_sheet: BalanceSheet::new(0.0, 30.0, 0.0, 5.0),
            })
            .collect(),
        links,
        bank_accounts: ids
            .iter()
            .map(|id| BankAccountRecord {
                firm: *id,
                bank: 1 + id % 2,
                loan: 0.0,
                deposit: 0.0,
            })
            .collect(),
        ..Default::default()
    }
}

fn config(num_trials: usize) -> SimulationConfig {
    SimulationConfig {
        horizon_days: 10,
        num_trials,
        rng_seed: 100,
        disaster: DisasterConfig {
            damaged_fraction: 0.15,
            damage_magnitude: 0.5,
            recovery_start_day: 4,
            ..Default::default()
        },
        ..Default::default()
    }
}

// ============================================================================
// Seeding
// ============================================================================

#[test]
fn test_trial_seeds_offset_from_base() {
    let outcomes = run_trials(&config(4), &network()).unwrap();

    assert_eq!(outcomes.len(), 4);
    for (k, outcome) in outcomes.iter().enumerate() {
        assert_eq!(outcome.trial, k);
        assert_eq!(outcome.seed, 100 + k as u64);
        assert_eq!(outcome.series.len(), 10);
    }
}

#[test]
fn test_trial_matches_orchestrator_with_same_seed() {
    let outcome = run_trial(&config(1), &network(), 3).unwrap();

    let mut orchestrator = Orchestrator::with_seed(config(1), &network(), 103).unwrap();
    orchestrator.run().unwrap();

    assert_eq!(outcome.series, orchestrator.series());
    assert_eq!(
        outcome.damaged_firms,
        orchestrator.state().damaged_firms().iter().copied().collect::<Vec<_>>()
    );
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_parallel_matches_sequential() {
    let config = config(6);
    let network = network();

    let parallel = run_trials(&config, &network).unwrap();
    let sequential: Vec<_> = (0..6).map(|k| run_trial(&config, &network, k).unwrap()).collect();

    assert_eq!(parallel.len(), sequential.len());
    for (a, b) in parallel.iter().zip(&sequential) {
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a, b);
    }
}

#[test]
fn test_reruns_are_bit_identical() {
    let first = run_trials(&config(5), &network()).unwrap();
    let second = run_trials(&config(5), &network()).unwrap();

    let digests =
        |outcomes: &[TrialOutcome]| outcomes.iter().map(TrialOutcome::digest).collect::<Vec<_>>();
    assert_eq!(digests(&first), digests(&second));
}

#[test]
fn test_trials_draw_different_cohorts() {
    let outcomes = run_trials(&config(8), &network()).unwrap();
    let cohorts: BTreeSet<Vec<FirmId>> =
        outcomes.iter().map(|o| o.damaged_firms.clone()).collect();

    // ceil(0.15 × 16) = 3 damaged firms per trial
    assert!(outcomes.iter().all(|o| o.damaged_firms.len() == 3));
    assert!(cohorts.len() > 1);
}

#[test]
fn test_zero_trials() {
    let outcomes = run_trials(&config(0), &network()).unwrap();
    assert!(outcomes.is_empty());
}

#[test]
fn test_invalid_config_fails_before_running() {
    let mut config = config(3);
    config.disaster.damaged_fraction = 1.5;

    assert!(matches!(
        run_trials(&config, &network()),
        Err(SimulationError::InvalidConfig(_))
    ));
}

#[test]
fn test_invalid_network_fails_before_running() {
    let mut network = network();
    network.links.push(LinkRecord { supplier: 1, customer: 99, weight: 1.0 });

    assert!(matches!(
        run_trials(&config(3), &network),
        Err(SimulationError::Network(_))
    ));
}

// ============================================================================
// Summary
// ============================================================================

#[test]
fn test_summary_over_trials() {
    let outcomes = run_trials(&config(4), &network()).unwrap();
    let summary = MonteCarloSummary::from_outcomes(&outcomes);

    assert_eq!(summary.trials, 4);
    assert_eq!(summary.npl_ratio.len(), 4);
    assert_eq!(summary.mean_gdp.len(), 10);
    assert!(summary.npl_ratio.iter().all(|r| (0.0..=1.0).contains(r)));
    assert!(summary.loan_to_deposit.iter().all(|r| *r >= 0.0));

    // Day 0 precedes the disaster, so every trial has the same GDP
    let day0: Vec<f64> = outcomes.iter().map(|o| o.series[0].gdp).collect();
    assert!(day0.iter().all(|gdp| *gdp == day0[0]));
    assert!((summary.mean_gdp[0] - day0[0]).abs() < 1e-9);
}

#[test]
fn test_value_added_recorded_when_enabled() {
    let config = SimulationConfig {
        record_firm_value_added: true,
        ..config(1)
    };
    let outcome = run_trial(&config, &network(), 0).unwrap();

    assert_eq!(outcome.value_added.len(), 16);
    assert!(outcome.value_added.values().all(|series| series.len() == 10));

    let daily_total: f64 = outcome.value_added.values().map(|series| series[0]).sum();
    assert!((daily_total - outcome.series[0].gdp).abs() < 1e-9);
}
