//! Disaster Model
//!
//! Injects the shock once per trial and keeps the recovery rates of the
//! damaged cohort up to date.
//!
//! # Cohort selection
//!
//! `ceil(fraction × active firms)` firms are drawn uniformly without
//! replacement from the active firms the scenario admits. The pool is built
//! in ascending id order and sampled with the trial's `RngManager`, so a seed
//! fixes the cohort.
//!
//! # Recovery rates
//!
//! Each damaged firm gets a liquidity/loss ratio `deposit / (Pini × Δ)`. The
//! ratios of the cohort are mapped min–max onto the configured band: the least
//! liquid firm recovers at `GammaMin`, the most liquid at `GammaMax`. From the
//! next step onward the loss is discounted by one reconstruction instalment,
//! `Pini × Δ × (1 − 1/maturity)`, and the scaling is refreshed every day.
//!
//! # Critical Invariants
//!
//! 1. **Once per trial**: the cohort never changes after the disaster day
//! 2. **Band**: every recovery rate lies in `[GammaMin, GammaMax]`

use crate::models::{Event, EventLog, FirmId, SimulationState};
use crate::orchestrator::{CreditConfig, DisasterConfig, DisasterScenario, RecoveryBand, SimulationError};
use crate::rng::RngManager;
use crate::settlement::issue_long_term_loans;
use std::collections::BTreeMap;

/// Number of firms to damage out of `active` firms
pub fn cohort_size(fraction: f64, active: usize) -> usize {
    (fraction * active as f64).ceil() as usize
}

/// Active firms the scenario admits, ascending by id
fn eligible_pool(
    state: &SimulationState,
    scenario: DisasterScenario,
    fraction: f64,
) -> Result<(Vec<FirmId>, usize), SimulationError> {
    if let DisasterScenario::Community { .. } = scenario {
        return Err(SimulationError::UnsupportedScenario(scenario.name().to_string()));
    }

    let active = state.active_firm_ids();
    let required = cohort_size(fraction, active.len());

    let pool: Vec<FirmId> = active
        .into_iter()
        .filter(|id| state.firm(*id).map_or(false, |firm| scenario.admits(firm)))
        .collect();

    if pool.len() < required {
        return Err(SimulationError::EmptyDisasterCohort {
            scenario: scenario.name().to_string(),
            eligible: pool.len(),
            required,
        });
    }
    Ok((pool, required))
}

/// Check that the scenario can supply a full cohort, without drawing
///
/// The active set never changes during a trial, so a cohort that cannot be
/// drawn at setup cannot be drawn on the disaster day either.
pub fn check_cohort(
    state: &SimulationState,
    scenario: DisasterScenario,
    fraction: f64,
) -> Result<usize, SimulationError> {
    eligible_pool(state, scenario, fraction).map(|(_, required)| required)
}

/// Draw the damaged cohort
///
/// Returns the cohort in ascending id order.
///
/// # Errors
/// - `UnsupportedScenario` for the community scenario
/// - `EmptyDisasterCohort` if the scenario admits fewer firms than required
pub fn select_cohort(
    state: &SimulationState,
    scenario: DisasterScenario,
    fraction: f64,
    rng: &mut RngManager,
) -> Result<Vec<FirmId>, SimulationError> {
    let (mut pool, required) = eligible_pool(state, scenario, fraction)?;

    let mut cohort = Vec::with_capacity(required);
    while cohort.len() < required {
        let pick = rng.index(pool.len());
        cohort.push(pool.swap_remove(pick));
    }
    cohort.sort_unstable();
    Ok(cohort)
}

/// Strike the network on `day`
///
/// Damages the cohort, assigns the initial recovery rates and, when enabled,
/// writes each damaged firm a reconstruction loan worth its production loss.
/// Returns the cohort.
pub fn strike(
    state: &mut SimulationState,
    disaster: &DisasterConfig,
    credit: &CreditConfig,
    day: usize,
    rng: &mut RngManager,
    events: &mut EventLog,
) -> Result<Vec<FirmId>, SimulationError> {
    let cohort = select_cohort(state, disaster.scenario, disaster.damaged_fraction, rng)?;
    let magnitude = disaster.damage_magnitude;

    for id in &cohort {
        let Some(firm) = state.firms.get_mut(id) else {
            continue;
        };
        firm.apply_damage(magnitude);
        state.damaged.insert(*id);
        events.log(Event::FirmDamaged {
            day,
            firm_id: *id,
            damage: firm.damage(),
            production_loss: firm.production_loss(),
        });
    }

    // Liquidity is measured before the reconstruction loans land
    assign_recovery_rates(state, disaster.recovery_band, magnitude);

    if disaster.long_term_loans {
        for id in &cohort {
            let loss = state
                .firm(*id)
                .map_or(0.0, |firm| firm.initial_production() * magnitude);
            if loss > 0.0 {
                issue_long_term_loans(state, *id, loss, credit, day, events)?;
            }
        }
    }

    tracing::info!(
        day,
        scenario = disaster.scenario.name(),
        damaged = cohort.len(),
        "disaster struck"
    );
    events.log(Event::DisasterStruck {
        day,
        scenario: disaster.scenario.name().to_string(),
        damaged_count: cohort.len(),
    });

    Ok(cohort)
}

/// Re-derive the recovery rates of the damaged cohort
///
/// The loss is discounted by one reconstruction instalment.
pub fn refresh_recovery_rates(state: &mut SimulationState, disaster: &DisasterConfig, long_term_maturity: u32) {
    let discount = 1.0 - 1.0 / f64::from(long_term_maturity.max(1));
    assign_recovery_rates(state, disaster.recovery_band, disaster.damage_magnitude * discount);
}

/// Liquidity/loss ratio of every damaged firm for a loss of `Pini × loss_factor`
pub fn liquidity_ratios(state: &SimulationState, loss_factor: f64) -> BTreeMap<FirmId, f64> {
    state
        .damaged
        .iter()
        .filter_map(|id| state.firm(*id))
        .map(|firm| {
            let loss = firm.initial_production() * loss_factor;
            let ratio = if loss > 0.0 { firm.deposit() / loss } else { 0.0 };
            (firm.id(), ratio)
        })
        .collect()
}

fn assign_recovery_rates(state: &mut SimulationState, band: RecoveryBand, loss_factor: f64) {
    let ratios = liquidity_ratios(state, loss_factor);
    if ratios.is_empty() {
        return;
    }

    let lowest = ratios.values().copied().fold(f64::INFINITY, f64::min);
    let highest = ratios.values().copied().fold(f64::NEG_INFINITY, f64::max);

    for (id, ratio) in ratios {
        if let Some(firm) = state.firms.get_mut(&id) {
            firm.set_recovery_rate(band.scale(ratio, lowest, highest));
        }
    }
}
