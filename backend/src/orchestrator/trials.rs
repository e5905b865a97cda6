//! Monte Carlo trials
//!
//! Trials share nothing mutable: each builds its own `SimulationState` from
//! the network and draws from its own RNG seeded with `rng_seed + trial`.
//! They run on a rayon parallel iterator and are returned in trial order.

use crate::models::{BankAggregate, BankId, FirmId, NetworkData};
use crate::orchestrator::{DayMetrics, Orchestrator, SimulationConfig, SimulationError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Everything one trial reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub trial: usize,
    pub seed: u64,
    pub series: Vec<DayMetrics>,

    /// Damaged cohort, ascending
    pub damaged_firms: Vec<FirmId>,

    /// Cumulative government support over the trial
    pub government_support: f64,

    /// Per-bank totals at the end of the trial
    pub banks: BTreeMap<BankId, BankAggregate>,

    /// Per-firm value added (empty unless enabled)
    pub value_added: BTreeMap<FirmId, Vec<f64>>,

    pub events_recorded: usize,
}

impl TrialOutcome {
    /// SHA-256 over the exact bits of the series and the damaged cohort
    ///
    /// Two outcomes with the same digest are bit-identical on what they report
    /// per day.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for metrics in &self.series {
            hasher.update((metrics.day as u64).to_le_bytes());
            for value in [
                metrics.gdp,
                metrics.loans,
                metrics.npl,
                metrics.npl_rate,
                metrics.deposits,
                metrics.deposit_flow,
                metrics.equity,
                metrics.government_support,
            ] {
                hasher.update(value.to_bits().to_le_bytes());
            }
            hasher.update((metrics.npl_count as u64).to_le_bytes());
        }
        for firm in &self.damaged_firms {
            hasher.update(firm.to_le_bytes());
        }
        hasher.update(self.government_support.to_bits().to_le_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// GDP series alone
    pub fn gdp(&self) -> Vec<f64> {
        self.series.iter().map(|metrics| metrics.gdp).collect()
    }
}

/// Run trial `trial` to the horizon
pub fn run_trial(
    config: &SimulationConfig,
    network: &NetworkData,
    trial: usize,
) -> Result<TrialOutcome, SimulationError> {
    let mut orchestrator = Orchestrator::for_trial(config.clone(), network, trial)?;
    orchestrator.run()?;

    let state = orchestrator.state();
    let outcome = TrialOutcome {
        trial,
        seed: orchestrator.seed(),
        series: orchestrator.series().to_vec(),
        damaged_firms: state.damaged_firms().iter().copied().collect(),
        government_support: state.government_support(),
        banks: state.ledger().bank_aggregates(),
        value_added: orchestrator.value_added().clone(),
        events_recorded: orchestrator.event_log().len(),
    };

    tracing::info!(
        trial,
        seed = outcome.seed,
        damaged = outcome.damaged_firms.len(),
        government_support = outcome.government_support,
        "trial finished"
    );
    Ok(outcome)
}

/// Run `config.num_trials` independent trials in parallel
///
/// The first failing trial's error is returned.
pub fn run_trials(
    config: &SimulationConfig,
    network: &NetworkData,
) -> Result<Vec<TrialOutcome>, SimulationError> {
    config.validate()?;
    network.validate()?;

    (0..config.num_trials)
        .into_par_iter()
        .map(|trial| run_trial(config, network, trial))
        .collect()
}

/// Cross-trial aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub trials: usize,

    /// Per trial: Σnpl / (Σnpl + Σloans) over the days
    pub npl_ratio: Vec<f64>,

    /// Per trial: Σloans / Σdeposits over the days
    pub loan_to_deposit: Vec<f64>,

    /// Per trial: cumulative government support
    pub government_support: Vec<f64>,

    /// Per day: GDP averaged over trials
    pub mean_gdp: Vec<f64>,
}

impl MonteCarloSummary {
    pub fn from_outcomes(outcomes: &[TrialOutcome]) -> Self {
        let mut npl_ratio = Vec::with_capacity(outcomes.len());
        let mut loan_to_deposit = Vec::with_capacity(outcomes.len());
        let mut government_support = Vec::with_capacity(outcomes.len());

        for outcome in outcomes {
            let npl: f64 = outcome.series.iter().map(|m| m.npl).sum();
            let loans: f64 = outcome.series.iter().map(|m| m.loans).sum();
            let deposits: f64 = outcome.series.iter().map(|m| m.deposits).sum();

            npl_ratio.push(ratio(npl, npl + loans));
            loan_to_deposit.push(ratio(loans, deposits));
            government_support.push(outcome.government_support);
        }

        let days = outcomes.iter().map(|o| o.series.len()).max().unwrap_or(0);
        let mean_gdp = (0..days)
            .map(|day| {
                let values: Vec<f64> = outcomes
                    .iter()
                    .filter_map(|o| o.series.get(day).map(|m| m.gdp))
                    .collect();
                ratio(values.iter().sum(), values.len() as f64)
            })
            .collect();

        Self {
            trials: outcomes.len(),
            npl_ratio,
            loan_to_deposit,
            government_support,
            mean_gdp,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(trial: usize, gdp: &[f64], loans: f64, npl: f64) -> TrialOutcome {
        TrialOutcome {
            trial,
            seed: trial as u64,
            series: gdp
                .iter()
                .enumerate()
                .map(|(day, gdp)| DayMetrics {
                    day,
                    gdp: *gdp,
                    loans,
                    npl,
                    deposits: 10.0,
                    ..Default::default()
                })
                .collect(),
            damaged_firms: vec![],
            government_support: 1.5,
            banks: BTreeMap::new(),
            value_added: BTreeMap::new(),
            events_recorded: 0,
        }
    }

    #[test]
    fn test_summary_ratios() {
        let summary = MonteCarloSummary::from_outcomes(&[
            outcome(0, &[10.0, 20.0], 3.0, 1.0),
            outcome(1, &[30.0, 40.0], 0.0, 0.0),
        ]);

        assert_eq!(summary.trials, 2);
        assert!((summary.npl_ratio[0] - 0.25).abs() < 1e-12);
        assert_eq!(summary.npl_ratio[1], 0.0);
        assert!((summary.loan_to_deposit[0] - 0.3).abs() < 1e-12);
        assert_eq!(summary.mean_gdp, vec![20.0, 30.0]);
        assert_eq!(summary.government_support, vec![1.5, 1.5]);
    }

    #[test]
    fn test_digest_sensitive_to_series() {
        let a = outcome(0, &[10.0, 20.0], 0.0, 0.0);
        let mut b = a.clone();
        assert_eq!(a.digest(), b.digest());

        b.series[1].gdp = 20.000000000001;
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_empty_summary() {
        let summary = MonteCarloSummary::from_outcomes(&[]);
        assert_eq!(summary.trials, 0);
        assert!(summary.mean_gdp.is_empty());
    }
}
